//! Assistant transport.
//!
//! [`AssistantTransport`] is the seam to the remote assistant service:
//! the production implementation speaks HTTP with streamed response
//! bodies, and tests substitute scripted streams.

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use tracing::debug;

use crate::error::AssistantError;
use crate::request::{AiMode, AssistantRequest};

/// Raw response byte stream of an assistant call, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<Bytes, AssistantError>>;

#[async_trait]
pub trait AssistantTransport: Send + Sync {
    /// Issue a request to the endpoint serving `mode` and return the raw
    /// response byte stream. Framing is the caller's concern.
    async fn ask(
        &self,
        mode: AiMode,
        request: &AssistantRequest,
    ) -> Result<ChunkStream, AssistantError>;

    /// Upload a source document so later calls scoped to `index_key` can
    /// retrieve from it. The response body is ignored; only success or
    /// failure matters.
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        index_key: &str,
    ) -> Result<(), AssistantError>;
}

/// HTTP transport against the assistant service. Timeout policy is the
/// transport's: no local deadline is enforced on top of it.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AssistantError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl AssistantTransport for HttpTransport {
    async fn ask(
        &self,
        mode: AiMode,
        request: &AssistantRequest,
    ) -> Result<ChunkStream, AssistantError> {
        let url = self.url(mode.endpoint_path());
        debug!(%url, index_key = %request.index_key, "assistant request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AssistantError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| AssistantError::Request(e.to_string()))?;

        let stream = response
            .bytes_stream()
            .map_err(|e| AssistantError::Stream(e.to_string()));

        Ok(Box::pin(stream))
    }

    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        index_key: &str,
    ) -> Result<(), AssistantError> {
        let url = self.url("/api/upload");
        debug!(%url, file_name, index_key, "uploading document");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("key", index_key.to_string());

        self.client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssistantError::Upload(e.to_string()))?
            .error_for_status()
            .map_err(|e| AssistantError::Upload(e.to_string()))?;

        Ok(())
    }
}
