//! End-to-end tests for pdf2md-server.
//!
//! Each test binds a real server on a random port, with a stub converter and
//! its own staging directory, and talks to it over HTTP with reqwest.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use async_trait::async_trait;
use futures::future::join_all;
use pdf2md_server::{
    Application, CommandConverter, ConverterError, ConverterOutput, DocumentConverter,
    ServerConfig,
};
use reqwest::{multipart, StatusCode};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Converter whose result is fixed per test.
struct CannedConverter(Result<ConverterOutput, String>);

#[async_trait]
impl DocumentConverter for CannedConverter {
    fn name(&self) -> &str {
        "canned"
    }

    async fn convert(&self, _pdf_path: &Path) -> Result<ConverterOutput, ConverterError> {
        self.0.clone().map_err(ConverterError::Failed)
    }
}

struct TestApp {
    address: String,
    staging: TempDir,
    client: reqwest::Client,
}

impl TestApp {
    async fn spawn(converter: Arc<dyn DocumentConverter>) -> Self {
        let staging = TempDir::new().expect("staging dir");
        let config = ServerConfig::builder()
            .bind_addr("127.0.0.1:0".parse().unwrap())
            .staging_dir(staging.path())
            .build()
            .expect("valid config");

        let app = Application::build(config, converter)
            .await
            .expect("Failed to build application");
        let address = format!("http://{}", app.local_addr());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address,
            staging,
            client: reqwest::Client::new(),
        }
    }

    async fn returning(output: ConverterOutput) -> Self {
        Self::spawn(Arc::new(CannedConverter(Ok(output)))).await
    }

    async fn upload(&self, filename: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let form = multipart::Form::new().part(
            "file",
            multipart::Part::bytes(bytes.to_vec())
                .file_name(filename.to_string())
                .mime_str("application/pdf")
                .unwrap(),
        );
        let response = self
            .client
            .post(format!("{}/convert", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.");
        let status = response.status();
        let body = response.json().await.expect("JSON body");
        (status, body)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.");
        let status = response.status();
        (status, response.json().await.expect("JSON body"))
    }

    fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }
}

// ── Fixed endpoints ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_always_ok() {
    let app = TestApp::spawn(Arc::new(CannedConverter(Err("broken".into())))).await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn root_describes_the_service() {
    let app = TestApp::returning(ConverterOutput::from("unused")).await;
    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "name": "Marker API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "/convert": "POST - Convert PDF to Markdown",
                "/health": "GET - Health check"
            }
        })
    );
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn rendered_markdown_is_returned() {
    let app = TestApp::returning(ConverterOutput::Rendered {
        markdown: "# Title".into(),
    })
    .await;
    let (status, body) = app.upload("paper.pdf", b"%PDF-1.7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"markdown": "# Title", "filename": "paper.pdf"}));
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn tuple_result_uses_first_element() {
    let app = TestApp::returning(ConverterOutput::Sequence(vec![
        json!("text body"),
        json!({"images": {}}),
    ]))
    .await;
    let (status, body) = app.upload("paper.pdf", b"%PDF").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markdown"], "text body");
}

#[tokio::test]
async fn plain_string_result() {
    let app = TestApp::returning(ConverterOutput::from("plain text")).await;
    let (status, body) = app.upload("SCAN.PDF", b"%PDF").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markdown"], "plain text");
    assert_eq!(body["filename"], "SCAN.PDF");
}

#[tokio::test]
async fn converter_error_is_500() {
    let app = TestApp::spawn(Arc::new(CannedConverter(Err("boom".into())))).await;
    let (status, body) = app.upload("paper.pdf", b"%PDF").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Conversion failed: boom"), "got: {detail}");
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn non_pdf_uploads_are_rejected_without_staging() {
    let app = TestApp::returning(ConverterOutput::from("unused")).await;
    for name in ["notes.txt", "image.png", "archive.pdf.zip", "pdf"] {
        let (status, body) = app.upload(name, b"data").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{name}");
        assert_eq!(body, json!({"detail": "Only PDF files are supported"}));
    }
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn concurrent_uploads_leave_nothing_behind() {
    let app = TestApp::returning(ConverterOutput::from("ok")).await;
    let names: Vec<String> = (0..8).map(|i| format!("doc-{i}.pdf")).collect();
    let results = join_all(names.iter().map(|name| app.upload(name, b"%PDF"))).await;
    for (status, body) in results {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["markdown"], "ok");
    }
    assert_eq!(app.staged_files(), 0);
}

// ── Command converter ────────────────────────────────────────────────────────

#[cfg(unix)]
#[tokio::test]
async fn command_converter_sees_the_uploaded_bytes() {
    // `cat` echoes the staged PDF back, proving the bytes reached the path.
    let converter = CommandConverter::new("cat").args(["{input}"]);
    let app = TestApp::spawn(Arc::new(converter)).await;
    let (status, body) = app.upload("echo.pdf", b"# Round trip").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markdown"], "# Round trip");
    assert_eq!(app.staged_files(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn command_converter_json_stdout() {
    let converter = CommandConverter::new("sh").args([
        "-c",
        r##"printf '{"markdown": "# From JSON", "metadata": {}}'"##,
        "sh",
        "{input}",
    ]);
    let app = TestApp::spawn(Arc::new(converter)).await;
    let (status, body) = app.upload("doc.pdf", b"%PDF").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markdown"], "# From JSON");
}

#[cfg(unix)]
#[tokio::test]
async fn command_converter_failure_is_500() {
    let converter = CommandConverter::new("sh").args(["-c", "echo 'bad xref' >&2; exit 1", "sh", "{input}"]);
    let app = TestApp::spawn(Arc::new(converter)).await;
    let (status, body) = app.upload("doc.pdf", b"%PDF").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Conversion failed: "), "got: {detail}");
    assert!(detail.contains("bad xref"), "got: {detail}");
    assert_eq!(app.staged_files(), 0);
}
