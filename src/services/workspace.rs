use std::path::{Path, PathBuf};

use uuid::Uuid;

/// The two transient directories every conversion request stages files in.
///
/// `init` must succeed before any request is handled; directory creation
/// failure is fatal at startup rather than handled per-request.
#[derive(Debug, Clone)]
pub struct Workspace {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

/// The three staged paths derived for one request: the raw intake file, the
/// header-rewritten intermediate, and the converted output.
///
/// All three carry a per-request uuid suffix so that two concurrent uploads
/// of same-named files never collide on disk.
#[derive(Debug, Clone)]
pub struct StagedPaths {
    pub raw: PathBuf,
    pub rewritten: PathBuf,
    pub converted: PathBuf,
}

impl Workspace {
    pub async fn init(
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> std::io::Result<Self> {
        let upload_dir = upload_dir.into();
        let output_dir = output_dir.into();

        tokio::fs::create_dir_all(&upload_dir).await?;
        tokio::fs::create_dir_all(&output_dir).await?;

        Ok(Self {
            upload_dir,
            output_dir,
        })
    }

    /// Derive the staged paths for one request from a sanitized base name.
    pub fn stage(&self, base_name: &str) -> StagedPaths {
        let request_id = Uuid::new_v4();
        let tag = format!("{base_name}-{request_id}");

        StagedPaths {
            raw: self.upload_dir.join(format!("{tag}.btx")),
            rewritten: self.upload_dir.join(format!("{tag}.ktx")),
            converted: self.output_dir.join(format!("{tag}.png")),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
