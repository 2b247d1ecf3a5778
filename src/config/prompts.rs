//! Prompt templates for quizloop.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

fn template_var() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid template regex"))
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub extraction: ExtractionPrompts,
    pub agent: AgentPrompts,
}

/// Prompts for pulling the question and submit URL out of a rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPrompts {
    pub user: String,
}

impl Default for ExtractionPrompts {
    fn default() -> Self {
        Self {
            user: r#"Analyze the following HTML page. It contains a quiz question and a submission URL.
Extract the following strictly in JSON format:
{
    "question": "The full text of the question",
    "submit_url": "The URL to submit the answer to (look for fetch/post code)",
    "required_files": ["list", "of", "file", "urls", "mentioned"]
}

HTML Content:
{{html}}"#
                .to_string(),
        }
    }
}

/// Prompts for the tool-calling answer agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
    pub user: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert Data Analyst and Programmer.
Your goal is to solve quiz questions accurately.

Your email address is: {{email}}
If a question asks for your email or calculations based on it, use this value.

You have access to the following tools:
1. `download_file(url)`: Download files mentioned in the question.
2. `read_file_content(path)`: Read the content of downloaded files (PDF, CSV, Excel, text).
3. `run_python_code(code)`: Execute Python code for calculations, data analysis or text processing.
4. `ocr_image(path)`: Extract text from images.
5. `transcribe_audio(path)`: Convert audio files to text.
6. `encode_image_to_base64(path)`: Use this if the answer requires a base64 string of a file. It returns a placeholder key (BASE64_KEY:...) which you should return as the answer.
7. `install_package(name)`: Install a missing Python package for your code.

STRATEGY:
- If the question involves a file, ALWAYS download it first.
- If the file is a PDF, CSV or Excel sheet, read its content or summary.
- If the file is an image and you need text, use `ocr_image`.
- If the file is audio, use `transcribe_audio`.
- If the question requires calculation (sum, count, average, etc.), DO NOT do it mentally. WRITE PYTHON CODE to calculate it.
- If the answer requires a file as base64, use `encode_image_to_base64` and return the key it gives you.
- Always double-check your logic.
- Return the FINAL ANSWER only."#
                .to_string(),

            user: r#"Context/HTML Content:
{{context}}

Question:
{{question}}

Solve this step-by-step using the tools provided."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load the built-in prompts, overridden by `extraction.toml` / `agent.toml`
    /// in `custom_dir` when present.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let extraction_path = custom_path.join("extraction.toml");
            if extraction_path.exists() {
                let content = std::fs::read_to_string(&extraction_path)?;
                prompts.extraction = toml::from_str(&content)?;
            }

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single pass, so values are never
    /// re-scanned. Unknown placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        template_var()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
