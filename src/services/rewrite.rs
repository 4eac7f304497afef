use bytes::Bytes;

use crate::error::PipelineError;

/// Length of the BTX prefix the target KTX container does not use.
pub const BTX_HEADER_LEN: usize = 4;

/// Strips the 4-byte BTX prefix, yielding the KTX-compatible remainder.
///
/// The two container formats are byte-compatible apart from this prefix, so
/// the rest of the buffer passes through unmodified. Inputs shorter than the
/// prefix fail rather than producing a truncated or empty container.
pub fn strip_btx_header(buf: Bytes) -> Result<Bytes, PipelineError> {
    if buf.len() < BTX_HEADER_LEN {
        return Err(PipelineError::TruncatedInput(buf.len()));
    }
    Ok(buf.slice(BTX_HEADER_LEN..))
}
