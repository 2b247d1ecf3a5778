//! Tool definitions and implementations for the quiz-solving agent.

use crate::config::ToolSettings;
use crate::error::{QuizError, Result};
use crate::placeholder::PlaceholderStore;
use crate::toolbox;
use crate::transcription::Transcriber;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Tools the agent can call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Download a file mentioned in the question.
    DownloadFile { url: String },

    /// Read a downloaded file (PDF, CSV, spreadsheet, text).
    ReadFileContent { path: String },

    /// Execute Python code and capture its output.
    RunPythonCode { code: String },

    /// Extract text from an image.
    OcrImage { path: String, lang: String },

    /// Convert an audio file to text.
    TranscribeAudio { path: String },

    /// Base64-encode a file into the placeholder store.
    EncodeImageToBase64 { path: String },

    /// Install a Python package.
    InstallPackage { name: String },
}

fn default_lang() -> String {
    "eng".to_string()
}

/// Everything the tools need: HTTP client, working directories, the
/// placeholder store and the transcriber.
pub struct ToolContext {
    pub http: reqwest::Client,
    pub download_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub placeholders: Arc<PlaceholderStore>,
    pub transcriber: Arc<dyn Transcriber>,
    pub settings: ToolSettings,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(
        download_dir: PathBuf,
        temp_dir: PathBuf,
        placeholders: Arc<PlaceholderStore>,
        transcriber: Arc<dyn Transcriber>,
        settings: ToolSettings,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            download_dir,
            temp_dir,
            placeholders,
            transcriber,
            settings,
        }
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::DownloadFile { url } => {
                let path = toolbox::download_file(&self.http, url, &self.download_dir).await?;
                Ok(path.display().to_string())
            }
            ToolCall::ReadFileContent { path } => {
                toolbox::read_file_content(&self.resolve(path), &self.settings.pdftotext).await
            }
            ToolCall::RunPythonCode { code } => {
                toolbox::run_python_code(
                    &self.settings.python,
                    code,
                    &self.temp_dir,
                    &self.download_dir,
                    Duration::from_secs(self.settings.code_timeout_seconds),
                )
                .await
            }
            ToolCall::OcrImage { path, lang } => {
                toolbox::ocr_image(&self.resolve(path), lang, &self.settings.tesseract).await
            }
            ToolCall::TranscribeAudio { path } => self.transcriber.transcribe(&self.resolve(path)).await,
            ToolCall::EncodeImageToBase64 { path } => {
                toolbox::encode_file_to_placeholder(&self.resolve(path), &self.placeholders).await
            }
            ToolCall::InstallPackage { name } => {
                toolbox::install_package(&self.settings.python, name).await
            }
        }
    }

    /// Relative paths are taken from the download directory.
    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.download_dir.join(path)
        }
    }
}

fn function_tool(
    name: &str,
    description: &str,
    parameters: serde_json::Value,
) -> async_openai::types::ChatCompletionTool {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: name.to_string(),
            description: Some(description.to_string()),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

fn single_string_param(key: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            key: { "type": "string", "description": description }
        },
        "required": [key]
    })
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    vec![
        function_tool(
            "download_file",
            "Download a file from a URL into the working directory. Returns the local path.",
            single_string_param("url", "Absolute URL of the file"),
        ),
        function_tool(
            "read_file_content",
            "Read a downloaded file. PDFs return per-page text, CSV and Excel files return a \
            summary (shape, columns, first rows, numeric stats), text files return raw content.",
            single_string_param("path", "Local path returned by download_file"),
        ),
        function_tool(
            "run_python_code",
            "Execute Python code and return stdout and stderr. Use this for every \
            calculation. Print the values you need.",
            single_string_param("code", "Complete Python script"),
        ),
        function_tool(
            "ocr_image",
            "Extract text from an image with Tesseract OCR.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Local image path" },
                    "lang": {
                        "type": "string",
                        "description": "Tesseract language code (default: eng)",
                        "default": "eng"
                    }
                },
                "required": ["path"]
            }),
        ),
        function_tool(
            "transcribe_audio",
            "Convert an audio file to text.",
            single_string_param("path", "Local audio path"),
        ),
        function_tool(
            "encode_image_to_base64",
            "Base64-encode a file. Returns a placeholder key (BASE64_KEY:...) that stands \
            for the encoded data; return that key as the answer when the quiz wants the file.",
            single_string_param("path", "Local file path"),
        ),
        function_tool(
            "install_package",
            "Install a missing Python package with pip.",
            single_string_param("name", "Package name"),
        ),
    ]
}

fn required_str(args: &serde_json::Value, key: &str) -> Result<String> {
    args[key]
        .as_str()
        .map(String::from)
        .ok_or_else(|| QuizError::Agent(format!("Missing '{}' argument", key)))
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| QuizError::Agent(format!("Invalid tool arguments: {}", e)))?;

    match name {
        "download_file" => Ok(ToolCall::DownloadFile {
            url: required_str(&args, "url")?,
        }),
        "read_file_content" => Ok(ToolCall::ReadFileContent {
            path: required_str(&args, "path")?,
        }),
        "run_python_code" => Ok(ToolCall::RunPythonCode {
            code: required_str(&args, "code")?,
        }),
        "ocr_image" => Ok(ToolCall::OcrImage {
            path: required_str(&args, "path")?,
            lang: args["lang"]
                .as_str()
                .filter(|l| !l.is_empty())
                .map(String::from)
                .unwrap_or_else(default_lang),
        }),
        "transcribe_audio" => Ok(ToolCall::TranscribeAudio {
            path: required_str(&args, "path")?,
        }),
        "encode_image_to_base64" => Ok(ToolCall::EncodeImageToBase64 {
            path: required_str(&args, "path")?,
        }),
        "install_package" => Ok(ToolCall::InstallPackage {
            name: required_str(&args, "name")?,
        }),
        _ => Err(QuizError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoTranscriber;

    #[async_trait]
    impl Transcriber for EchoTranscriber {
        async fn transcribe(&self, audio_path: &Path) -> Result<String> {
            Ok(format!("transcript of {}", audio_path.display()))
        }
    }

    fn context(dir: &Path) -> ToolContext {
        ToolContext::new(
            dir.to_path_buf(),
            dir.join("tmp"),
            Arc::new(PlaceholderStore::new()),
            Arc::new(EchoTranscriber),
            ToolSettings::default(),
        )
    }

    #[test]
    fn test_parse_tools() {
        assert_eq!(
            parse_tool_call("download_file", r#"{"url": "https://q/data.csv"}"#).unwrap(),
            ToolCall::DownloadFile {
                url: "https://q/data.csv".into()
            }
        );
        assert_eq!(
            parse_tool_call("ocr_image", r#"{"path": "scan.png"}"#).unwrap(),
            ToolCall::OcrImage {
                path: "scan.png".into(),
                lang: "eng".into()
            }
        );
        assert_eq!(
            parse_tool_call("ocr_image", r#"{"path": "scan.png", "lang": "deu"}"#).unwrap(),
            ToolCall::OcrImage {
                path: "scan.png".into(),
                lang: "deu".into()
            }
        );
    }

    #[test]
    fn test_parse_install_package_name() {
        assert_eq!(
            parse_tool_call("install_package", r#"{"name": "openpyxl"}"#).unwrap(),
            ToolCall::InstallPackage {
                name: "openpyxl".into()
            }
        );
        assert!(parse_tool_call("install_package", r#"{"package": "openpyxl"}"#).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_tool_call("run_python_code", r#"{}"#).is_err());
        assert!(parse_tool_call("run_python_code", "not json").is_err());
        assert!(parse_tool_call("rm_rf", r#"{}"#).is_err());
    }

    #[test]
    fn test_definitions_match_parser() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 7);
        for def in defs {
            let err = parse_tool_call(&def.function.name, "{}");
            if let Err(e) = err {
                assert!(!e.to_string().contains("Unknown tool"), "{}", def.function.name);
            }
        }
    }

    #[tokio::test]
    async fn test_encode_returns_placeholder_key() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chart.png"), b"png").unwrap();
        let ctx = context(dir.path());

        let key = ctx
            .execute(&ToolCall::EncodeImageToBase64 {
                path: "chart.png".into(),
            })
            .await
            .unwrap();

        assert_eq!(ctx.placeholders.get(&key).as_deref(), Some("cG5n"));
    }

    #[tokio::test]
    async fn test_transcribe_resolves_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let out = ctx
            .execute(&ToolCall::TranscribeAudio {
                path: "clip-not-in-cwd.mp3".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            out,
            format!("transcript of {}", dir.path().join("clip-not-in-cwd.mp3").display())
        );
    }

    #[tokio::test]
    async fn test_read_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let result = ctx
            .execute(&ToolCall::ReadFileContent {
                path: "absent.csv".into(),
            })
            .await;
        assert!(matches!(result, Err(QuizError::FileNotFound(_))));
    }
}
