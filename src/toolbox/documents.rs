//! Typed file reading for downloaded quiz material.
//!
//! Text-like files are returned verbatim, PDFs go through `pdftotext`, CSV
//! and spreadsheet files are summarized (shape, columns, head, numeric
//! statistics). Media files get a notice pointing the agent at the OCR or
//! transcription tools.

use crate::error::{QuizError, Result};
use calamine::{open_workbook_auto, Reader};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Number of leading rows shown in a table summary.
const HEAD_ROWS: usize = 5;

/// How a file is read, decided by its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Csv,
    Excel,
    Image,
    Audio,
    Text,
    Unsupported(String),
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "csv" => FileKind::Csv,
            "xls" | "xlsx" => FileKind::Excel,
            "png" | "jpg" | "jpeg" | "webp" | "gif" => FileKind::Image,
            "mp3" | "wav" | "ogg" | "m4a" | "flac" => FileKind::Audio,
            "txt" | "md" | "json" | "html" | "htm" | "xml" => FileKind::Text,
            _ => FileKind::Unsupported(ext),
        }
    }
}

/// Read a downloaded file into text the agent can reason over.
#[instrument(skip(pdftotext), fields(path = %path.display()))]
pub async fn read_file_content(path: &Path, pdftotext: &str) -> Result<String> {
    if !path.exists() {
        return Err(QuizError::FileNotFound(path.display().to_string()));
    }

    let kind = FileKind::from_path(path);
    debug!("Reading file as {:?}", kind);

    match kind {
        FileKind::Pdf => read_pdf(path, pdftotext).await,
        FileKind::Csv => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || summarize_csv(&path))
                .await
                .map_err(|e| QuizError::ToolFailed(format!("CSV task failed: {}", e)))?
        }
        FileKind::Excel => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || summarize_spreadsheet(&path))
                .await
                .map_err(|e| QuizError::ToolFailed(format!("Spreadsheet task failed: {}", e)))?
        }
        FileKind::Image => Ok(
            "Image file. Use `ocr_image` to read text or `encode_image_to_base64` to process it."
                .to_string(),
        ),
        FileKind::Audio => Ok("Audio file. Use `transcribe_audio` to convert to text.".to_string()),
        FileKind::Text => Ok(tokio::fs::read_to_string(path).await?),
        FileKind::Unsupported(ext) => Err(QuizError::InvalidInput(format!(
            "Unsupported file type: {}",
            if ext.is_empty() { "(none)" } else { ext.as_str() }
        ))),
    }
}

/// Extract per-page text from a PDF with `pdftotext -layout`.
async fn read_pdf(path: &Path, pdftotext: &str) -> Result<String> {
    let result = Command::new(pdftotext)
        .arg("-layout")
        .arg(path)
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(QuizError::ToolNotFound(pdftotext.to_string()));
        }
        Err(e) => return Err(QuizError::ToolFailed(format!("{} execution failed: {}", pdftotext, e))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(QuizError::ToolFailed(format!("{} failed: {}", pdftotext, stderr.trim())));
    }

    Ok(format_pdf_pages(&String::from_utf8_lossy(&output.stdout)))
}

/// pdftotext separates pages with form feeds.
fn format_pdf_pages(text: &str) -> String {
    text.split('\u{c}')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| format!("--- Page {} ---\n{}", i + 1, page.trim_end()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarize a CSV file: shape, columns, first rows and numeric statistics.
pub fn summarize_csv(path: &Path) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    Ok(summarize_table(path, &headers, &rows))
}

/// Summarize the first sheet of an `xls`/`xlsx` workbook like a CSV file.
pub fn summarize_spreadsheet(path: &Path) -> Result<String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| QuizError::ToolFailed(format!("Failed to open spreadsheet: {}", e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| QuizError::ToolFailed("Spreadsheet has no sheets".to_string()))?
        .map_err(|e| QuizError::ToolFailed(format!("Failed to read sheet: {}", e)))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());
    let headers = rows.next().unwrap_or_default();
    let rows: Vec<Vec<String>> = rows.collect();

    Ok(summarize_table(path, &headers, &rows))
}

fn summarize_table(path: &Path, headers: &[String], rows: &[Vec<String>]) -> String {
    let mut summary = vec![
        format!("File: {}", path.display()),
        format!("Shape: ({}, {})", rows.len(), headers.len()),
        format!("Columns: {:?}", headers),
        format!("First {} rows:", HEAD_ROWS.min(rows.len())),
        markdown_table(headers, &rows[..HEAD_ROWS.min(rows.len())]),
    ];

    let stats = numeric_columns(headers, rows);
    if !stats.is_empty() {
        summary.push(String::new());
        summary.push("Numeric Column Stats:".to_string());
        summary.push(stats_table(&stats));
    }

    summary.join("\n")
}

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq)]
struct ColumnStats {
    name: String,
    count: usize,
    mean: f64,
    std: f64,
    min: f64,
    q25: f64,
    median: f64,
    q75: f64,
    max: f64,
}

/// Columns whose non-empty cells all parse as numbers.
fn numeric_columns(headers: &[String], rows: &[Vec<String>]) -> Vec<ColumnStats> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(col, name)| {
            let mut values = Vec::new();
            for row in rows {
                let cell = row.get(col).map(|c| c.trim()).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                values.push(cell.parse::<f64>().ok()?);
            }
            column_stats(name, values)
        })
        .collect()
}

fn column_stats(name: &str, mut values: Vec<f64>) -> Option<ColumnStats> {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    Some(ColumnStats {
        name: name.to_string(),
        count: n,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[n - 1],
    })
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

fn stats_table(stats: &[ColumnStats]) -> String {
    let mut headers = vec![String::new()];
    headers.extend(stats.iter().map(|s| s.name.clone()));

    let rows = vec![
        stat_row("count", stats, |s| s.count.to_string()),
        stat_row("mean", stats, |s| format_number(s.mean)),
        stat_row("std", stats, |s| format_number(s.std)),
        stat_row("min", stats, |s| format_number(s.min)),
        stat_row("25%", stats, |s| format_number(s.q25)),
        stat_row("50%", stats, |s| format_number(s.median)),
        stat_row("75%", stats, |s| format_number(s.q75)),
        stat_row("max", stats, |s| format_number(s.max)),
    ];

    markdown_table(&headers, &rows)
}

fn stat_row(label: &str, stats: &[ColumnStats], value: impl Fn(&ColumnStats) -> String) -> Vec<String> {
    let mut cells = vec![label.to_string()];
    cells.extend(stats.iter().map(value));
    cells
}

fn format_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{:.4}", x)
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn markdown_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut lines = vec![
        format!("| {} |", headers.iter().map(|h| escape_cell(h)).collect::<Vec<_>>().join(" | ")),
        format!("|{}|", vec!["---"; headers.len()].join("|")),
    ];
    for row in rows {
        let cells: Vec<String> = (0..headers.len())
            .map(|i| row.get(i).map(|c| escape_cell(c)).unwrap_or_default())
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}
