use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::PipelineError;

/// Trait for texture conversion implementations
///
/// The pipeline only depends on this seam, so tests can substitute a double
/// that records its arguments and returns a scripted outcome instead of
/// requiring the real binary.
#[async_trait::async_trait]
pub trait TextureConverter: Send + Sync {
    /// Convert the file at `input` into `output`, blocking (asynchronously)
    /// until the conversion finishes.
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), PipelineError>;
}

/// Conversion backed by the external PVRTexTool command-line binary.
///
/// Invoked as `<tool> -i <input> -d <output> -f <pixel_format>`; exit code
/// zero is the only success signal. The produced file's contents are not
/// inspected here.
pub struct PvrTexToolCli {
    tool_path: String,
    pixel_format: String,
}

impl PvrTexToolCli {
    pub fn new(tool_path: String, pixel_format: String) -> Self {
        Self {
            tool_path,
            pixel_format,
        }
    }
}

#[async_trait::async_trait]
impl TextureConverter for PvrTexToolCli {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        debug!(
            "running {} -i {} -d {} -f {}",
            self.tool_path,
            input.display(),
            output.display(),
            self.pixel_format
        );

        let result = Command::new(&self.tool_path)
            .arg("-i")
            .arg(input)
            .arg("-d")
            .arg(output)
            .arg("-f")
            .arg(&self.pixel_format)
            .output()
            .await
            .map_err(|e| {
                PipelineError::Conversion(format!("failed to spawn {}: {}", self.tool_path, e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PipelineError::Conversion(format!(
                "{} exited with {}: {}",
                self.tool_path,
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
