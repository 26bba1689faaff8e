//! Cover photo hosting on Imgur.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::UploadError;

const DEFAULT_UPLOAD_URL: &str = "https://api.imgur.com/3/image";

/// Somewhere to put an image and get back a public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload `image` and return its public URL.
    async fn upload(&self, image: Vec<u8>) -> Result<String, UploadError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    link: String,
}

/// Anonymous Imgur uploads authenticated with a client ID.
pub struct ImgurClient {
    client_id: SecretString,
    upload_url: String,
    client: reqwest::Client,
}

impl ImgurClient {
    pub fn new(client_id: SecretString) -> Self {
        Self::with_upload_url(client_id, DEFAULT_UPLOAD_URL)
    }

    pub fn with_upload_url(client_id: SecretString, upload_url: impl Into<String>) -> Self {
        Self {
            client_id,
            upload_url: upload_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgurClient {
    async fn upload(&self, image: Vec<u8>) -> Result<String, UploadError> {
        let size = image.len();
        let form = Form::new().part("image", Part::bytes(image).file_name("cover.jpg"));

        let resp = self
            .client
            .post(&self.upload_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Client-ID {}", self.client_id.expose_secret()),
            )
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: UploadResponse = resp
            .json()
            .await
            .map_err(|e| UploadError::Request(format!("invalid response: {e}")))?;

        if parsed.data.link.is_empty() {
            return Err(UploadError::MissingLink);
        }
        tracing::info!(size, link = %parsed.data.link, "Image uploaded");
        Ok(parsed.data.link)
    }
}
