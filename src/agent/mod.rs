//! Tool-calling agent that works out quiz answers.
//!
//! The agent can download files, read documents, run Python, OCR images,
//! transcribe audio and stash base64 payloads behind placeholder keys.

mod runner;
mod tools;

pub use runner::{Agent, AgentResponse, ToolCallRecord};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext};
