pub mod telegram;

use std::path::Path;

use crate::error::PipelineError;

/// An inbound file event: the user-visible filename plus the opaque handle
/// the messaging transport resolves to a download location.
#[derive(Debug, Clone)]
pub struct IncomingDocument {
    pub file_name: String,
    pub file_id: String,
}

/// Seam between the intake pipeline and the messaging transport.
///
/// The pipeline fetches and delivers files only through this trait, so tests
/// can substitute an in-memory double and the real Telegram client stays
/// swappable.
#[async_trait::async_trait]
pub trait FileTransport: Send + Sync {
    /// Resolve an opaque file handle to a fetchable URL.
    async fn resolve_file_url(&self, file_id: &str) -> Result<String, PipelineError>;

    /// Stream the file at `url` to `dest`, returning the number of bytes
    /// written.
    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, PipelineError>;

    /// Send the file at `path` back to the conversation as a document
    /// attachment with the given display name.
    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), PipelineError>;

    /// Send a plain text reply to the conversation.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), PipelineError>;
}
