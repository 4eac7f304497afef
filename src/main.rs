use anyhow::Context;
use btx_convert_bot::config::BotConfig;
use btx_convert_bot::transport::telegram::{self, TelegramApi};
use dotenvy::dotenv;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btx_convert_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env();
    if config.bot_token.is_empty() {
        anyhow::bail!("BOT_TOKEN is not set");
    }
    info!(
        "workspace: uploads={}, outputs={}, tool={}",
        config.upload_dir, config.output_dir, config.converter_path
    );

    let pipeline = btx_convert_bot::build_pipeline(&config)
        .await
        .context("failed to create workspace directories")?;
    let api = TelegramApi::new(config.bot_token.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    telegram::run_polling(&api, &pipeline, shutdown_rx, config.poll_timeout_secs).await;

    info!("bot shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
