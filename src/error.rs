use thiserror::Error;

/// Errors that can occur while a single conversion request moves through the
/// intake pipeline.
///
/// Only `UnsupportedExtension` is reported to the user verbatim (as the
/// rejection reply); every other variant collapses to one generic failure
/// message at the pipeline boundary, with the detail going to the logs.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("input too short to strip BTX header: {0} bytes")]
    TruncatedInput(usize),

    #[error("conversion tool failed: {0}")]
    Conversion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True for the validation early-exit, which stages no files and gets
    /// its own reply instead of the generic failure message.
    pub fn is_rejection(&self) -> bool {
        matches!(self, PipelineError::UnsupportedExtension(_))
    }
}
