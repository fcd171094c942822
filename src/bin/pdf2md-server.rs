//! Server binary for pdf2md-server.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ServerConfig` / `CommandConverter` and serves until Ctrl-C or SIGTERM.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pdf2md_server::config::{DEFAULT_BIND_ADDR, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SERVICE_NAME};
use pdf2md_server::{Application, CommandConverter, ServerConfig, StdoutFormat};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # marker, writing into a scratch directory (default)
  pdf2md-server

  # any tool that prints Markdown on stdout
  pdf2md-server --converter pdftotext --converter-args "-layout {input} -" --stdout-format text

  # a tool printing {"markdown": ...} JSON, with a 10 minute cap
  pdf2md-server --converter my-converter --converter-args "--json {input}" --convert-timeout 600

  curl -F file=@paper.pdf http://localhost:8000/convert

PLACEHOLDERS:
  {input}       path of the staged PDF (appended when absent)
  {output_dir}  scratch directory; the first *.md written there is the result
"#;

/// Serve PDF-to-Markdown conversion over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-server",
    version,
    about = "Serve PDF-to-Markdown conversion over HTTP",
    long_about = "Accepts PDF uploads on POST /convert, runs an external conversion \
engine on each one and returns the extracted Markdown as JSON.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "PDF2MD_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Name reported by GET /.
    #[arg(long, env = "PDF2MD_SERVICE_NAME", default_value = DEFAULT_SERVICE_NAME)]
    service_name: String,

    /// Directory uploads are staged in (default: system temp dir).
    #[arg(long, env = "PDF2MD_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Maximum request body size in bytes.
    #[arg(long, env = "PDF2MD_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Per-conversion timeout in seconds (default: none).
    #[arg(long, env = "PDF2MD_CONVERT_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    convert_timeout: Option<u64>,

    /// Converter program. Defaults to marker_single with marker's arguments.
    #[arg(long, env = "PDF2MD_CONVERTER")]
    converter: Option<String>,

    /// Whitespace-separated argument templates for --converter, as one value.
    #[arg(
        long,
        env = "PDF2MD_CONVERTER_ARGS",
        allow_hyphen_values = true,
        requires = "converter"
    )]
    converter_args: Option<String>,

    /// How to read the converter's stdout.
    #[arg(long, env = "PDF2MD_STDOUT_FORMAT", value_enum, default_value = "auto")]
    stdout_format: StdoutFormatArg,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MD_VERBOSE")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, env = "PDF2MD_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StdoutFormatArg {
    Text,
    Json,
    Auto,
}

impl From<StdoutFormatArg> for StdoutFormat {
    fn from(arg: StdoutFormatArg) -> Self {
        match arg {
            StdoutFormatArg::Text => StdoutFormat::Text,
            StdoutFormatArg::Json => StdoutFormat::Json,
            StdoutFormatArg::Auto => StdoutFormat::Auto,
        }
    }
}

fn build_config(cli: &Cli) -> Result<ServerConfig> {
    let mut builder = ServerConfig::builder()
        .bind_addr(cli.bind)
        .service_name(&cli.service_name)
        .max_upload_bytes(cli.max_upload_bytes);
    if let Some(ref dir) = cli.staging_dir {
        builder = builder.staging_dir(dir);
    }
    if let Some(secs) = cli.convert_timeout {
        builder = builder.convert_timeout_secs(secs);
    }
    builder.build().context("Invalid server configuration")
}

fn build_converter(cli: &Cli) -> CommandConverter {
    let converter = match cli.converter {
        Some(ref program) => CommandConverter::new(program).args(
            cli.converter_args
                .as_deref()
                .unwrap_or_default()
                .split_whitespace(),
        ),
        None => CommandConverter::marker(),
    };
    converter
        .stdout_format(cli.stdout_format.into())
        .scratch_dir(cli.staging_dir.clone())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and converter ───────────────────────────────────────
    let config = build_config(&cli)?;
    let converter = build_converter(&cli);
    info!(
        "Converter: {} (stdout format: {})",
        converter.program(),
        StdoutFormat::from(cli.stdout_format)
    );

    // ── Serve ────────────────────────────────────────────────────────────
    let app = Application::build(config, Arc::new(converter))
        .await
        .with_context(|| format!("Failed to start server on {}", cli.bind))?;

    app.run_with_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::Path;

    fn rendered(cli: &Cli) -> Vec<OsString> {
        build_converter(cli).render_args(Path::new("/tmp/a.pdf"), None)
    }

    #[test]
    fn converter_args_stop_at_the_next_flag() {
        let cli = Cli::try_parse_from([
            "pdf2md-server",
            "--converter",
            "pdftotext",
            "--converter-args",
            "-layout {input} -",
            "--stdout-format",
            "text",
        ])
        .unwrap();

        assert!(matches!(cli.stdout_format, StdoutFormatArg::Text));
        assert_eq!(
            rendered(&cli),
            vec![
                OsString::from("-layout"),
                OsString::from("/tmp/a.pdf"),
                OsString::from("-"),
            ]
        );
    }

    #[test]
    fn converter_args_collapse_repeated_spaces() {
        let cli = Cli::try_parse_from([
            "pdf2md-server",
            "--converter",
            "my-converter",
            "--converter-args",
            "  --json   {input} ",
            "--convert-timeout",
            "600",
        ])
        .unwrap();

        assert_eq!(cli.convert_timeout, Some(600));
        assert_eq!(
            rendered(&cli),
            vec![OsString::from("--json"), OsString::from("/tmp/a.pdf")]
        );
    }

    #[test]
    fn default_converter_is_marker() {
        let cli = Cli::try_parse_from(["pdf2md-server"]).unwrap();
        let converter = build_converter(&cli);
        assert_eq!(converter.program(), "marker_single");
        assert!(converter.writes_output_dir());
    }

    #[test]
    fn converter_args_require_a_converter() {
        let result = Cli::try_parse_from(["pdf2md-server", "--converter-args", "-x"]);
        assert!(result.is_err());
    }
}
