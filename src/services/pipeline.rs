use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::services::converter::TextureConverter;
use crate::services::rewrite::strip_btx_header;
use crate::services::workspace::{StagedPaths, Workspace};
use crate::transport::{FileTransport, IncomingDocument};
use crate::utils::validation::{has_accepted_extension, sanitize_base_name};

/// Orchestrates one conversion request:
/// validate → fetch → rewrite → convert → deliver → cleanup.
///
/// Each request owns its three staged files exclusively (the workspace
/// derives collision-free paths), and every staged file that was created is
/// deleted before control returns, on the success and failure paths alike.
pub struct IntakePipeline {
    workspace: Workspace,
    converter: Arc<dyn TextureConverter>,
}

impl IntakePipeline {
    pub fn new(workspace: Workspace, converter: Arc<dyn TextureConverter>) -> Self {
        Self {
            workspace,
            converter,
        }
    }

    /// Run the full pipeline for one inbound document.
    ///
    /// `UnsupportedExtension` is the validation early-exit: nothing has been
    /// staged yet and no cleanup runs. Every other error has already
    /// triggered cleanup by the time it is returned.
    pub async fn process(
        &self,
        transport: &dyn FileTransport,
        chat_id: i64,
        doc: &IncomingDocument,
    ) -> Result<(), PipelineError> {
        if !has_accepted_extension(&doc.file_name) {
            return Err(PipelineError::UnsupportedExtension(doc.file_name.clone()));
        }

        let base_name = sanitize_base_name(&doc.file_name);
        let staged = self.workspace.stage(&base_name);

        // Tracks which staged paths were actually written, so an early
        // failure never leaves cleanup guessing.
        let mut created: Vec<PathBuf> = Vec::with_capacity(3);

        let result = self
            .run(transport, chat_id, doc, &base_name, &staged, &mut created)
            .await;

        self.cleanup(&created).await;
        result
    }

    async fn run(
        &self,
        transport: &dyn FileTransport,
        chat_id: i64,
        doc: &IncomingDocument,
        base_name: &str,
        staged: &StagedPaths,
        created: &mut Vec<PathBuf>,
    ) -> Result<(), PipelineError> {
        let url = transport.resolve_file_url(&doc.file_id).await?;

        created.push(staged.raw.clone());
        let size = transport.download_to(&url, &staged.raw).await?;
        debug!("fetched {} ({} bytes) to {}", doc.file_name, size, staged.raw.display());

        let raw = Bytes::from(tokio::fs::read(&staged.raw).await?);
        let rewritten = strip_btx_header(raw)?;
        created.push(staged.rewritten.clone());
        tokio::fs::write(&staged.rewritten, &rewritten).await?;

        created.push(staged.converted.clone());
        self.converter
            .convert(&staged.rewritten, &staged.converted)
            .await?;

        let display_name = format!("{base_name}.png");
        transport
            .send_document(chat_id, &staged.converted, &display_name)
            .await?;

        info!("delivered {} to chat {}", display_name, chat_id);
        Ok(())
    }

    /// Best-effort deletion of the staged files this request created.
    /// Missing files are fine; anything else is logged and skipped.
    async fn cleanup(&self, created: &[PathBuf]) {
        for path in created {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("failed to remove staged file {}: {}", path.display(), e),
            }
        }
    }
}
