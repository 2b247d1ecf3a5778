//! Free-text answer coercion.

use super::Answer;
use crate::placeholder::{PlaceholderStore, PLACEHOLDER_PREFIX};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn placeholder_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"BASE64_KEY:[0-9a-f-]+").expect("valid placeholder regex"))
}

/// Convert the resolver's text into the value that gets submitted.
///
/// Placeholder keys are swapped for their stored payload. Otherwise
/// `true`/`false` (any case) become booleans and plain non-negative decimal
/// strings become numbers. Everything else, including negatives, exponents
/// and structured answers, stays a string.
pub fn normalize(raw: &str, store: &PlaceholderStore) -> Answer {
    if raw.contains(PLACEHOLDER_PREFIX) {
        return match lookup_placeholder(raw, store) {
            Some(payload) => Answer::Text(payload),
            None => {
                warn!("Placeholder key in answer not found in store, submitting text as-is");
                Answer::Text(raw.to_string())
            }
        };
    }

    coerce_scalar(raw)
}

fn lookup_placeholder(raw: &str, store: &PlaceholderStore) -> Option<String> {
    let key = raw.trim();
    if let Some(payload) = store.get(key) {
        debug!("Swapping placeholder {} for stored payload", key);
        return Some(payload);
    }

    // Key embedded in surrounding prose
    let embedded = placeholder_key_regex().find(key)?.as_str();
    let payload = store.get(embedded)?;
    debug!("Recovered embedded placeholder {}", embedded);
    Some(payload)
}

fn coerce_scalar(raw: &str) -> Answer {
    if raw.eq_ignore_ascii_case("true") {
        return Answer::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Answer::Bool(false);
    }

    if is_plain_number(raw) {
        let parsed = if raw.contains('.') {
            finite_float(raw)
        } else {
            raw.parse::<i64>()
                .ok()
                .map(Answer::Integer)
                .or_else(|| finite_float(raw))
        };
        if let Some(answer) = parsed {
            return answer;
        }
    }

    Answer::Text(raw.to_string())
}

/// Digit strings beyond `f64` range stay text, since JSON has no infinity.
fn finite_float(raw: &str) -> Option<Answer> {
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Answer::Float)
}

/// ASCII digits with at most one decimal point, and at least one digit.
fn is_plain_number(s: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for c in s.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}
