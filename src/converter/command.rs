//! Converter backed by an external program.
//!
//! The conversion engine runs as a child process so model weights, GPU
//! context and interpreter stay outside the server. Arguments are templates:
//! `{input}` becomes the staged PDF path and `{output_dir}` a scratch
//! directory the program may write its results into.
//!
//! ```text
//! marker_single {input} --output_format markdown --output_dir {output_dir}
//!        │                                                  │
//!        └─ /tmp/upload-a1b2.pdf                            └─ /tmp/pdf2md-out-c3d4/
//!                                                                 └─ upload-a1b2/upload-a1b2.md
//! ```

use super::{ConverterOutput, DocumentConverter};
use crate::error::ConverterError;
use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, error, warn};

/// Replaced by the path of the staged PDF.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Replaced by a scratch directory; its presence switches result collection
/// from stdout to the first Markdown file written there.
pub const OUTPUT_DIR_PLACEHOLDER: &str = "{output_dir}";

/// How to read a converter's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdoutFormat {
    /// Stdout is the Markdown text.
    Text,
    /// Stdout is a JSON document decoded with [`ConverterOutput::from_json`].
    Json,
    /// JSON when stdout is a JSON object or array, text otherwise. (default)
    #[default]
    Auto,
}

impl FromStr for StdoutFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(StdoutFormat::Text),
            "json" => Ok(StdoutFormat::Json),
            "auto" => Ok(StdoutFormat::Auto),
            other => Err(format!("unknown stdout format '{other}' (expected text, json or auto)")),
        }
    }
}

impl fmt::Display for StdoutFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StdoutFormat::Text => "text",
            StdoutFormat::Json => "json",
            StdoutFormat::Auto => "auto",
        };
        f.write_str(s)
    }
}

/// Runs an external program per conversion.
///
/// # Example
/// ```rust
/// use pdf2md_server::converter::{CommandConverter, StdoutFormat};
///
/// let converter = CommandConverter::new("my-pdf-tool")
///     .args(["--json", "{input}"])
///     .stdout_format(StdoutFormat::Json);
/// assert_eq!(converter.program(), "my-pdf-tool");
/// ```
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    stdout_format: StdoutFormat,
    scratch_dir: Option<PathBuf>,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_format: StdoutFormat::default(),
            scratch_dir: None,
        }
    }

    /// `marker_single` writing Markdown into a scratch directory.
    pub fn marker() -> Self {
        Self::new("marker_single").args([
            INPUT_PLACEHOLDER,
            "--output_format",
            "markdown",
            "--output_dir",
            OUTPUT_DIR_PLACEHOLDER,
        ])
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdout_format(mut self, format: StdoutFormat) -> Self {
        self.stdout_format = format;
        self
    }

    /// Parent of the per-conversion `{output_dir}` (system temp dir when `None`).
    pub fn scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether results are collected from a scratch directory instead of stdout.
    pub fn writes_output_dir(&self) -> bool {
        self.args.iter().any(|a| a.contains(OUTPUT_DIR_PLACEHOLDER))
    }

    /// Expand the argument templates for one invocation.
    ///
    /// The input path is appended when no argument mentions `{input}`.
    pub fn render_args(&self, input: &Path, output_dir: Option<&Path>) -> Vec<OsString> {
        let input_str = input.to_string_lossy();
        let output_str = output_dir.map(|d| d.to_string_lossy());

        let mut rendered: Vec<OsString> = self
            .args
            .iter()
            .map(|arg| {
                let mut arg = arg.replace(INPUT_PLACEHOLDER, &input_str);
                if let Some(ref out) = output_str {
                    arg = arg.replace(OUTPUT_DIR_PLACEHOLDER, out);
                }
                OsString::from(arg)
            })
            .collect();

        if !self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            rendered.push(input.as_os_str().to_owned());
        }
        rendered
    }

    /// Run the program once and return its stdout.
    async fn run(
        &self,
        pdf_path: &Path,
        output_dir: Option<&Path>,
    ) -> Result<Vec<u8>, ConverterError> {
        let args = self.render_args(pdf_path, output_dir);

        debug!(program = %self.program, args = ?args, "Spawning converter");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ConverterError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(program = %self.program, status = %output.status, stderr = %stderr, "Converter failed");
            return Err(ConverterError::Exited {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        debug!(
            program = %self.program,
            stdout_bytes = output.stdout.len(),
            "Converter finished"
        );
        Ok(output.stdout)
    }
}

#[async_trait]
impl DocumentConverter for CommandConverter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn convert(&self, pdf_path: &Path) -> Result<ConverterOutput, ConverterError> {
        if !self.writes_output_dir() {
            let stdout = self.run(pdf_path, None).await?;
            return decode_stdout(stdout, self.stdout_format);
        }

        let scratch = create_scratch_dir(self.scratch_dir.clone()).await?;
        let result = match self.run(pdf_path, Some(scratch.path())).await {
            Ok(_) => read_output_dir(scratch.path()).await.map(ConverterOutput::Text),
            Err(e) => Err(e),
        };
        close_scratch_dir(scratch).await;
        result
    }
}

async fn create_scratch_dir(parent: Option<PathBuf>) -> Result<TempDir, ConverterError> {
    let dir = tokio::task::spawn_blocking(move || {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pdf2md-out-");
        match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
    })
    .await
    .map_err(|e| io::Error::other(format!("scratch dir task panicked: {e}")))??;
    Ok(dir)
}

/// Remove a scratch directory on the blocking pool.
///
/// A cancelled conversion skips this and the `TempDir` drop removes it instead.
async fn close_scratch_dir(dir: TempDir) {
    let path = dir.path().to_path_buf();
    match tokio::task::spawn_blocking(move || dir.close()).await {
        Ok(Ok(())) => debug!("Removed scratch dir {}", path.display()),
        Ok(Err(e)) => warn!("Failed to remove scratch dir {}: {}", path.display(), e),
        Err(e) => warn!("Scratch dir cleanup task failed for {}: {}", path.display(), e),
    }
}

/// Decode captured stdout according to `format`.
pub fn decode_stdout(
    stdout: Vec<u8>,
    format: StdoutFormat,
) -> Result<ConverterOutput, ConverterError> {
    let text = String::from_utf8(stdout)
        .map_err(|e| ConverterError::InvalidOutput(format!("stdout is not UTF-8: {e}")))?;

    match format {
        StdoutFormat::Text => Ok(ConverterOutput::Text(text)),
        StdoutFormat::Json => serde_json::from_str::<Value>(&text)
            .map(ConverterOutput::from_json)
            .map_err(|e| ConverterError::InvalidOutput(format!("stdout is not JSON: {e}"))),
        StdoutFormat::Auto => {
            let trimmed = text.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                if let Ok(value) = serde_json::from_str::<Value>(&text) {
                    return Ok(ConverterOutput::from_json(value));
                }
            }
            Ok(ConverterOutput::Text(text))
        }
    }
}

/// Read the first Markdown file (by path order) found under `dir`.
async fn read_output_dir(dir: &Path) -> Result<String, ConverterError> {
    let path = find_markdown(dir).await?.ok_or_else(|| ConverterError::NoOutput {
        dir: dir.to_path_buf(),
    })?;
    debug!("Reading converter output from {}", path.display());

    let bytes = tokio::fs::read(&path).await?;
    String::from_utf8(bytes).map_err(|e| {
        ConverterError::InvalidOutput(format!("'{}' is not UTF-8: {e}", path.display()))
    })
}

async fn find_markdown(dir: &Path) -> Result<Option<PathBuf>, ConverterError> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
            {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found.into_iter().next())
}
