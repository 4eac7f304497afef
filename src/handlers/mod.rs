use tracing::error;

use crate::services::pipeline::IntakePipeline;
use crate::transport::{FileTransport, IncomingDocument};

pub const GREETING: &str =
    "Hi! I can convert BTX files to PNG.\nJust send me a file with the .btx extension";

pub const REJECTION_REPLY: &str = "❌ Please send a file with the .btx extension";

pub const FAILURE_REPLY: &str = "❌ Something went wrong while converting the file";

/// Pipeline boundary for one inbound document: runs the pipeline and maps
/// its outcome to the user-facing reply. Errors never propagate past here;
/// the detail goes to the logs and the user sees one of the two replies.
pub async fn handle_document(
    pipeline: &IntakePipeline,
    transport: &dyn FileTransport,
    chat_id: i64,
    doc: &IncomingDocument,
) {
    match pipeline.process(transport, chat_id, doc).await {
        Ok(()) => {}
        Err(e) if e.is_rejection() => {
            if let Err(e) = transport.send_message(chat_id, REJECTION_REPLY).await {
                error!("failed to send rejection reply: {}", e);
            }
        }
        Err(e) => {
            error!("conversion of {} failed: {}", doc.file_name, e);
            if let Err(e) = transport.send_message(chat_id, FAILURE_REPLY).await {
                error!("failed to send failure reply: {}", e);
            }
        }
    }
}
