//! Side-effecting helpers behind the agent's tools.
//!
//! - `download` - streaming file download
//! - `documents` - PDF / CSV / spreadsheet / text reading
//! - `ocr` - tesseract OCR
//! - `python` - sandboxed-by-timeout code execution and package installs
//! - `encode` - base64 encoding into the placeholder store

mod documents;
mod download;
mod encode;
mod ocr;
mod python;

pub use documents::{read_file_content, summarize_csv, summarize_spreadsheet, FileKind};
pub use download::{download_file, file_name_from_url};
pub use encode::encode_file_to_placeholder;
pub use ocr::ocr_image;
pub use python::{install_package, run_python_code};
