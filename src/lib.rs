pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod transport;
pub mod utils;

use std::sync::Arc;

use crate::config::BotConfig;
use crate::services::converter::PvrTexToolCli;
use crate::services::pipeline::IntakePipeline;
use crate::services::workspace::Workspace;

/// Wire the intake pipeline from config: create the workspace directories
/// and attach the external conversion tool. Directory creation failure is
/// fatal here, before any request is accepted.
pub async fn build_pipeline(config: &BotConfig) -> std::io::Result<IntakePipeline> {
    let workspace = Workspace::init(&config.upload_dir, &config.output_dir).await?;
    let converter = Arc::new(PvrTexToolCli::new(
        config.converter_path.clone(),
        config.output_pixel_format.clone(),
    ));
    Ok(IntakePipeline::new(workspace, converter))
}
