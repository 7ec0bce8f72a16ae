//! Telegram Bot API document host.
//!
//! Documents are sent to a fixed chat with `sendDocument`; the returned
//! `file_id` is the handle. Downloads go through `getFile` and the bot file
//! endpoint. Every URL embeds the bot token, so none of them are logged.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use filerelay_shared::config::TelegramConfig;

use super::{DocumentUpload, FileHost, FileStream, HostError, StoredDocument};

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

/// The parts of a `Message` that can carry a sent document.
///
/// Some files come back as `animation`, `video` or `audio` even when sent
/// with `sendDocument`.
#[derive(Debug, Deserialize)]
struct Message {
    document: Option<FileRef>,
    animation: Option<FileRef>,
    video: Option<FileRef>,
    audio: Option<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    file_id: String,
    file_size: Option<u64>,
}

/// `getFile` result.
#[derive(Debug, Deserialize)]
struct TelegramFile {
    file_path: Option<String>,
}

/// Bound on establishing a connection to the Bot API.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram Bot API client.
///
/// Bot API calls are bounded end to end by `request_timeout_secs`. File
/// downloads are only bounded per read, so a slow but live transfer is never
/// cut off after the status and headers have gone out.
pub struct TelegramHost {
    client: Client,
    request_timeout: Duration,
    api_base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramHost {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self, HostError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(request_timeout)
            .build()
            .map_err(|e| HostError::Configuration(e.without_url().to_string()))?;

        Ok(Self {
            client,
            request_timeout,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base_url, self.bot_token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_base_url,
            self.bot_token,
            file_path.trim_start_matches('/')
        )
    }

    /// Unwrap a Bot API envelope into its result.
    async fn read_result<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HostError> {
        let status = response.status();
        let text = response.text().await?;

        let envelope: ApiResponse<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            // Oversized bodies are cut off by the proxy in front of the Bot API
            // before any JSON is produced.
            Err(_) if status == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(HostError::from_api(413, "Request Entity Too Large"));
            }
            Err(e) => {
                return Err(HostError::UnexpectedResponse(format!(
                    "status {status}: {e}"
                )));
            }
        };

        if !envelope.ok {
            return Err(HostError::from_api(
                envelope.error_code.unwrap_or_else(|| status.as_u16()),
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        envelope
            .result
            .ok_or_else(|| HostError::UnexpectedResponse("missing result".to_string()))
    }
}

fn document_part(document: &DocumentUpload) -> Part {
    let len = document.bytes.len() as u64;
    Part::stream_with_length(Body::from(document.bytes.clone()), len)
        .file_name(document.filename.clone())
}

#[async_trait]
impl FileHost for TelegramHost {
    async fn send_document(&self, document: DocumentUpload) -> Result<StoredDocument, HostError> {
        let part = match document.content_type.as_deref() {
            Some(content_type) => document_part(&document)
                .mime_str(content_type)
                .unwrap_or_else(|_| document_part(&document)),
            None => document_part(&document),
        };
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("document", part);

        debug!(
            file_name = %document.filename,
            size = document.bytes.len(),
            "Sending document to Telegram"
        );

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .timeout(self.request_timeout)
            .multipart(form)
            .send()
            .await?;

        let message: Message = Self::read_result(response).await?;
        let file = message
            .document
            .or(message.animation)
            .or(message.video)
            .or(message.audio)
            .ok_or_else(|| {
                warn!("sendDocument result carried no file");
                HostError::UnexpectedResponse("message has no document".to_string())
            })?;

        Ok(StoredDocument {
            file_id: file.file_id,
            file_size: file.file_size.unwrap_or(document.bytes.len() as u64),
        })
    }

    async fn resolve(&self, file_id: &str) -> Result<String, HostError> {
        let response = self
            .client
            .get(self.method_url("getFile"))
            .timeout(self.request_timeout)
            .query(&[("file_id", file_id)])
            .send()
            .await?;

        let file: TelegramFile = Self::read_result(response).await?;
        file.file_path
            .ok_or_else(|| HostError::UnexpectedResponse("file has no file_path".to_string()))
    }

    async fn fetch(&self, file_path: &str) -> Result<FileStream, HostError> {
        let response = self.client.get(self.file_url(file_path)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostError::Status(status.as_u16()));
        }

        Ok(FileStream {
            status: status.as_u16(),
            headers: response.headers().clone(),
            body: response.bytes_stream().map_err(HostError::from).boxed(),
        })
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
