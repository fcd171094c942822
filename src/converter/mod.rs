//! The external conversion capability and the shapes it may return.
//!
//! Conversion engines do not agree on a result type: some hand back a
//! rendered document object with a `markdown` field, some a tuple whose first
//! element is the text, some the bare string. [`ConverterOutput`] names each
//! shape explicitly and [`ConverterOutput::into_markdown`] applies one
//! ordered extraction policy to all of them.

pub mod command;

pub use command::{CommandConverter, StdoutFormat};

use crate::error::ConverterError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// Something that turns a PDF on disk into Markdown.
///
/// Implementations must be shareable across requests; the server holds one
/// instance behind an `Arc` for the lifetime of the process.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Convert the PDF at `pdf_path`.
    async fn convert(&self, pdf_path: &Path) -> Result<ConverterOutput, ConverterError>;
}

/// Raw result of a conversion, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConverterOutput {
    /// A rendered document exposing a named `markdown` field.
    Rendered { markdown: String },
    /// An ordered multi-element result.
    Sequence(Vec<Value>),
    /// Plain text.
    Text(String),
    /// Anything else.
    Opaque(Value),
}

impl ConverterOutput {
    /// Decode a JSON document emitted by a converter.
    ///
    /// An object with a `markdown` key is a rendered document (a non-string
    /// value is kept as its JSON text), an array is a sequence, a string is
    /// text, and everything else is opaque.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("markdown") => {
                let markdown = match map.remove("markdown") {
                    Some(Value::String(s)) => s,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                ConverterOutput::Rendered { markdown }
            }
            Value::Array(items) => ConverterOutput::Sequence(items),
            Value::String(s) => ConverterOutput::Text(s),
            other => ConverterOutput::Opaque(other),
        }
    }

    /// Extract the Markdown text.
    ///
    /// Order: rendered `markdown` field, then the first element of a
    /// non-empty sequence (its textual form when it is not a string), then
    /// plain text, then the textual form of the whole result.
    pub fn into_markdown(self) -> String {
        match self {
            ConverterOutput::Rendered { markdown } => markdown,
            ConverterOutput::Sequence(mut items) if !items.is_empty() => {
                match items.swap_remove(0) {
                    Value::String(s) => s,
                    other => other.to_string(),
                }
            }
            ConverterOutput::Text(text) => text,
            ConverterOutput::Sequence(items) => {
                warn!("Converter returned an empty sequence; using its textual form");
                Value::Array(items).to_string()
            }
            ConverterOutput::Opaque(value) => {
                warn!("Converter returned an unrecognised result; using its textual form");
                value.to_string()
            }
        }
    }
}

impl From<String> for ConverterOutput {
    fn from(text: String) -> Self {
        ConverterOutput::Text(text)
    }
}

impl From<&str> for ConverterOutput {
    fn from(text: &str) -> Self {
        ConverterOutput::Text(text.to_string())
    }
}
