use std::path::Path;

use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::handlers;
use crate::services::pipeline::IntakePipeline;
use crate::transport::{FileTransport, IncomingDocument};

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
    pub document: Option<Document>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// Envelope every Bot API method call comes back in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, PipelineError> {
        if self.ok {
            self.result.ok_or_else(|| {
                PipelineError::Transport(format!("{method}: empty result from Bot API"))
            })
        } else {
            Err(PipelineError::Transport(format!(
                "{method}: {}",
                self.description.unwrap_or_else(|| "unknown error".into())
            )))
        }
    }
}

/// Thin client for the Telegram Bot API
pub struct TelegramApi {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl TelegramApi {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_base: API_BASE.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, PipelineError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Transport(format!("{method}: {e}")))?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| PipelineError::Transport(format!("{method}: {e}")))?;
        parsed.into_result(method)
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, PipelineError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// The /start greeting, with the one-button reply keyboard.
    pub async fn send_greeting(&self, chat_id: i64) -> Result<(), PipelineError> {
        let _: Message = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": handlers::GREETING,
                    "reply_markup": {
                        "keyboard": [[{ "text": "🚀 Convert a file" }]],
                        "resize_keyboard": true,
                    },
                }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl FileTransport for TelegramApi {
    async fn resolve_file_url(&self, file_id: &str) -> Result<String, PipelineError> {
        let info: FileInfo = self
            .call("getFile", json!({ "file_id": file_id }))
            .await?;
        let file_path = info.file_path.ok_or_else(|| {
            PipelineError::Transport("getFile: response carried no file_path".into())
        })?;
        Ok(format!(
            "{}/file/bot{}/{}",
            self.api_base, self.token, file_path
        ))
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::Transport(format!("download: {e}")))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| PipelineError::Transport(format!("download: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), PipelineError> {
        let file = tokio::fs::File::open(path).await?;
        let stream = tokio_util::codec::FramedRead::new(file, tokio_util::codec::BytesCodec::new());
        let part = reqwest::multipart::Part::stream(reqwest::Body::wrap_stream(stream))
            .file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Transport(format!("sendDocument: {e}")))?;

        let parsed: ApiResponse<Message> = response
            .json()
            .await
            .map_err(|e| PipelineError::Transport(format!("sendDocument: {e}")))?;
        parsed.into_result("sendDocument").map(|_| ())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), PipelineError> {
        let _: Message = self
            .call(
                "sendMessage",
                json!({ "chat_id": chat_id, "text": text }),
            )
            .await?;
        Ok(())
    }
}

/// Long-polling loop: dispatches /start to the greeting and document
/// messages to the intake pipeline until shutdown is signalled.
pub async fn run_polling(
    api: &TelegramApi,
    pipeline: &IntakePipeline,
    mut shutdown: watch::Receiver<bool>,
    poll_timeout_secs: u64,
) {
    let mut offset = 0i64;
    info!("bot started, polling for updates");

    loop {
        let updates = tokio::select! {
            _ = shutdown.changed() => {
                info!("shutdown signalled, stopping polling loop");
                return;
            }
            result = api.get_updates(offset, poll_timeout_secs) => match result {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("getUpdates failed: {}", e);
                    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                    continue;
                }
            },
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let chat_id = message.chat.id;

            if message.text.as_deref() == Some("/start") {
                if let Err(e) = api.send_greeting(chat_id).await {
                    error!("failed to send greeting: {}", e);
                }
                continue;
            }

            if let Some(document) = message.document {
                let doc = IncomingDocument {
                    file_name: document.file_name.unwrap_or_default(),
                    file_id: document.file_id,
                };
                handlers::handle_document(pipeline, api, chat_id, &doc).await;
            }
        }
    }
}
