use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response, StatusCode};
use roadwatch_logging::{rw_debug, rw_info};
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use url::Url;

use crate::{ApiError, ClientSettings, HealthResponse, StatusReport, UploadRequest};

/// Request/response side of the backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn health(&self) -> Result<HealthResponse, ApiError>;

    /// Uploads the file and returns the server-assigned filename.
    async fn upload(&self, request: &UploadRequest) -> Result<String, ApiError>;

    async fn start_processing(&self, filename: &str) -> Result<(), ApiError>;

    async fn status(&self) -> Result<StatusReport, ApiError>;

    /// Streams a server-relative artifact into `sink`, returning the byte count.
    async fn download(
        &self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ApiError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    filename: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    /// Appends percent-encoded segments to the base URL's path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidUrl(format!("{} cannot be a base", self.settings.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn health(&self) -> Result<HealthResponse, ApiError> {
        let url = self.endpoint(&["api", "health"])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let body = success_body(response).await?;
        decode_json(&body)
    }

    async fn upload(&self, request: &UploadRequest) -> Result<String, ApiError> {
        let url = self.endpoint(&["api", "upload"])?;
        let file = tokio::fs::File::open(&request.path)
            .await
            .map_err(|err| ApiError::Io(format!("{}: {err}", request.path.display())))?;
        let byte_len = file
            .metadata()
            .await
            .map_err(|err| ApiError::Io(format!("{}: {err}", request.path.display())))?
            .len();

        let body = Body::wrap_stream(ReaderStream::new(file));
        let mut part =
            Part::stream_with_length(body, byte_len).file_name(request.file_name.clone());
        if let Some(media_type) = request.media_type.as_deref() {
            part = part
                .mime_str(media_type)
                .map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
        }
        let form = Form::new().part("file", part);

        rw_info!("Uploading {} ({} bytes)", request.file_name, byte_len);
        let response = self
            .client
            .post(url)
            .timeout(self.settings.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = success_body(response).await?;
        let accepted: UploadResponse = decode_json(&body)?;
        Ok(accepted.filename)
    }

    async fn start_processing(&self, filename: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "process", filename])?;
        rw_debug!("POST {}", url);
        let response = self.client.post(url).send().await.map_err(map_reqwest_error)?;
        success_body(response).await.map(|_| ())
    }

    async fn status(&self) -> Result<StatusReport, ApiError> {
        let url = self.endpoint(&["api", "status"])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let body = success_body(response).await?;
        decode_json(&body)
    }

    async fn download(
        &self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ApiError> {
        let url = self.settings.resolve(path)?;
        let response = self
            .client
            .get(url)
            .timeout(self.settings.upload_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(rejection(status, response).await);
        }

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            sink.write_all(&chunk)
                .await
                .map_err(|err| ApiError::Io(err.to_string()))?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}

async fn success_body(response: Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(rejection(status, response).await);
    }
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(map_reqwest_error)
}

/// Builds a rejection, pulling `detail` out of the body when it is a string.
async fn rejection(status: StatusCode, response: Response) -> ApiError {
    let detail = match response.bytes().await {
        Ok(body) => extract_detail(&body),
        Err(_) => None,
    };
    ApiError::Rejected {
        status: status.as_u16(),
        detail,
    }
}

fn extract_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

fn decode_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Network(err.to_string())
}
