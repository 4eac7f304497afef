use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use btx_convert_bot::error::PipelineError;
use btx_convert_bot::handlers;
use btx_convert_bot::services::converter::{PvrTexToolCli, TextureConverter};
use btx_convert_bot::services::pipeline::IntakePipeline;
use btx_convert_bot::services::workspace::Workspace;
use btx_convert_bot::transport::{FileTransport, IncomingDocument};

const CHAT_ID: i64 = 42;

/// In-memory transport double: serves a fixed byte blob as the remote file
/// and records every reply and delivered document.
struct MockTransport {
    remote_content: Vec<u8>,
    fail_download: bool,
    messages: Mutex<Vec<String>>,
    /// (display name, content at delivery time)
    delivered: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockTransport {
    fn serving(content: &[u8]) -> Self {
        Self {
            remote_content: content.to_vec(),
            fail_download: false,
            messages: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
        }
    }

    fn failing_download() -> Self {
        Self {
            fail_download: true,
            ..Self::serving(&[])
        }
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileTransport for MockTransport {
    async fn resolve_file_url(&self, file_id: &str) -> Result<String, PipelineError> {
        Ok(format!("mock://files/{file_id}"))
    }

    async fn download_to(&self, _url: &str, dest: &Path) -> Result<u64, PipelineError> {
        if self.fail_download {
            return Err(PipelineError::Transport("connection reset".into()));
        }
        tokio::fs::write(dest, &self.remote_content).await?;
        Ok(self.remote_content.len() as u64)
    }

    async fn send_document(
        &self,
        _chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), PipelineError> {
        let content = tokio::fs::read(path).await?;
        self.delivered
            .lock()
            .unwrap()
            .push((file_name.to_string(), content));
        Ok(())
    }

    async fn send_message(&self, _chat_id: i64, text: &str) -> Result<(), PipelineError> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Converter double: records call arguments and the input file's content,
/// then either writes a scripted output file or fails.
struct ScriptedConverter {
    output: Vec<u8>,
    succeed: bool,
    /// (input path, output path, input content)
    calls: Mutex<Vec<(PathBuf, PathBuf, Vec<u8>)>>,
}

impl ScriptedConverter {
    fn succeeding(output: &[u8]) -> Self {
        Self {
            output: output.to_vec(),
            succeed: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            output: Vec::new(),
            succeed: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(PathBuf, PathBuf, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextureConverter for ScriptedConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        let content = tokio::fs::read(input).await?;
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf(), content));
        if !self.succeed {
            return Err(PipelineError::Conversion("tool exited with 1".into()));
        }
        tokio::fs::write(output, &self.output).await?;
        Ok(())
    }
}

struct Harness {
    _root: tempfile::TempDir,
    upload_dir: PathBuf,
    output_dir: PathBuf,
    pipeline: IntakePipeline,
}

async fn harness(converter: Arc<dyn TextureConverter>) -> Harness {
    let root = tempfile::tempdir().unwrap();
    let upload_dir = root.path().join("uploads");
    let output_dir = root.path().join("outputs");
    let workspace = Workspace::init(&upload_dir, &output_dir).await.unwrap();
    Harness {
        _root: root,
        upload_dir,
        output_dir,
        pipeline: IntakePipeline::new(workspace, converter),
    }
}

fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

fn assert_no_residual_files(h: &Harness) {
    assert!(dir_entries(&h.upload_dir).is_empty(), "uploads not cleaned");
    assert!(dir_entries(&h.output_dir).is_empty(), "outputs not cleaned");
}

fn doc(file_name: &str) -> IncomingDocument {
    IncomingDocument {
        file_name: file_name.to_string(),
        file_id: "remote-file-1".to_string(),
    }
}

#[tokio::test]
async fn successful_conversion_delivers_png_and_cleans_up() {
    let remote: Vec<u8> = (0u8..32).collect();
    let converter = Arc::new(ScriptedConverter::succeeding(b"fake png bytes"));
    let h = harness(converter.clone()).await;
    let transport = MockTransport::serving(&remote);

    h.pipeline
        .process(&transport, CHAT_ID, &doc("model.btx"))
        .await
        .unwrap();

    // The tool saw the header-stripped intermediate
    let calls = converter.calls();
    assert_eq!(calls.len(), 1);
    let (input, output, input_content) = &calls[0];
    assert_eq!(input.extension().unwrap(), "ktx");
    assert_eq!(output.extension().unwrap(), "png");
    assert_eq!(input_content, &remote[4..]);

    // Delivered under the original base name, not the staged name
    let delivered = transport.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "model.png");
    assert_eq!(delivered[0].1, b"fake png bytes");

    assert!(transport.messages().is_empty());
    assert_no_residual_files(&h);
}

#[tokio::test]
async fn wrong_extension_is_rejected_before_any_write() {
    let converter = Arc::new(ScriptedConverter::succeeding(b"unused"));
    let h = harness(converter.clone()).await;
    let transport = MockTransport::serving(b"whatever");

    let err = h
        .pipeline
        .process(&transport, CHAT_ID, &doc("model.obj"))
        .await
        .unwrap_err();
    assert!(err.is_rejection());

    assert!(converter.calls().is_empty());
    assert!(transport.delivered().is_empty());
    assert_no_residual_files(&h);
}

#[tokio::test]
async fn rejection_reply_is_sent_through_the_handler() {
    let converter = Arc::new(ScriptedConverter::succeeding(b"unused"));
    let h = harness(converter).await;
    let transport = MockTransport::serving(b"whatever");

    handlers::handle_document(&h.pipeline, &transport, CHAT_ID, &doc("model.obj")).await;

    assert_eq!(transport.messages(), vec![handlers::REJECTION_REPLY]);
    assert!(transport.delivered().is_empty());
}

#[tokio::test]
async fn tool_failure_yields_generic_reply_and_no_residue() {
    let converter = Arc::new(ScriptedConverter::failing());
    let h = harness(converter).await;
    let remote: Vec<u8> = (0u8..16).collect();
    let transport = MockTransport::serving(&remote);

    handlers::handle_document(&h.pipeline, &transport, CHAT_ID, &doc("model.btx")).await;

    assert_eq!(transport.messages(), vec![handlers::FAILURE_REPLY]);
    assert!(transport.delivered().is_empty());
    assert_no_residual_files(&h);
}

#[tokio::test]
async fn truncated_remote_file_fails_and_cleans_up() {
    let converter = Arc::new(ScriptedConverter::succeeding(b"unused"));
    let h = harness(converter.clone()).await;
    let transport = MockTransport::serving(&[1, 2, 3]);

    let err = h
        .pipeline
        .process(&transport, CHAT_ID, &doc("model.btx"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::TruncatedInput(3)));

    assert!(converter.calls().is_empty());
    assert_no_residual_files(&h);
}

#[tokio::test]
async fn download_failure_fails_and_cleans_up() {
    let converter = Arc::new(ScriptedConverter::succeeding(b"unused"));
    let h = harness(converter.clone()).await;
    let transport = MockTransport::failing_download();

    let err = h
        .pipeline
        .process(&transport, CHAT_ID, &doc("model.btx"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Transport(_)));

    assert!(converter.calls().is_empty());
    assert_no_residual_files(&h);
}

#[tokio::test]
async fn unspawnable_tool_yields_generic_reply_and_no_residue() {
    let converter = Arc::new(PvrTexToolCli::new(
        "/nonexistent/PVRTexToolCLI".to_string(),
        "r8g8b8a8".to_string(),
    ));
    let h = harness(converter).await;
    let remote: Vec<u8> = (0u8..16).collect();
    let transport = MockTransport::serving(&remote);

    handlers::handle_document(&h.pipeline, &transport, CHAT_ID, &doc("model.btx")).await;

    assert_eq!(transport.messages(), vec![handlers::FAILURE_REPLY]);
    assert!(transport.delivered().is_empty());
    assert_no_residual_files(&h);
}

#[tokio::test]
async fn concurrent_same_name_uploads_do_not_collide() {
    let remote_a: Vec<u8> = vec![0, 0, 0, 0, 0xaa, 0xaa];
    let remote_b: Vec<u8> = vec![0, 0, 0, 0, 0xbb, 0xbb];
    let converter = Arc::new(ScriptedConverter::succeeding(b"png"));
    let h = harness(converter.clone()).await;
    let transport_a = MockTransport::serving(&remote_a);
    let transport_b = MockTransport::serving(&remote_b);

    let doc_a = doc("model.btx");
    let doc_b = doc("model.btx");
    let (ra, rb) = tokio::join!(
        h.pipeline.process(&transport_a, CHAT_ID, &doc_a),
        h.pipeline.process(&transport_b, CHAT_ID, &doc_b),
    );
    ra.unwrap();
    rb.unwrap();

    // Both requests ran to completion against distinct staged paths
    let calls = converter.calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].0, calls[1].0);
    let mut seen: Vec<&[u8]> = calls.iter().map(|c| c.2.as_slice()).collect();
    seen.sort();
    let expected: Vec<&[u8]> = vec![&[0xaa, 0xaa], &[0xbb, 0xbb]];
    assert_eq!(seen, expected);

    assert_no_residual_files(&h);
}
