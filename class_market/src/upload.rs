//! Image hosting and card images.

use crate::{
    models::Course,
    validation::{ValidationError, validate_image},
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};
use thiserror::Error;

pub const DEFAULT_IMAGE_HOST_URL: &str = "https://api.imgbb.com/1/upload";

/// Shown on cards whose image is missing or does not load.
pub const FALLBACK_CARD_IMAGE: &str = "https://i.ibb.co/placeholder/class-card-fallback.png";

/// Image upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// File rejected before upload (type or size)
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// No image host key configured
    #[error("Image uploads are not configured")]
    NotConfigured,

    /// Transport failure
    #[error("Image host unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// Host answered but did not return a URL
    #[error("Image host rejected the upload: {0}")]
    Rejected(String),
}

impl UploadError {
    pub fn client_message(&self) -> String {
        match self {
            UploadError::Validation(e) => e.to_string(),
            UploadError::NotConfigured => self.to_string(),
            UploadError::Http(_) | UploadError::Rejected(_) => "Image upload failed".to_string(),
        }
    }
}

/// Result type for uploads
pub type UploadResult<T> = Result<T, UploadError>;

/// External image host: takes bytes, returns a public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> UploadResult<String>;
}

#[derive(Debug, Deserialize)]
struct HostResponse {
    #[serde(default)]
    data: Option<HostData>,
    #[serde(default)]
    error: Option<HostFailure>,
}

#[derive(Debug, Deserialize)]
struct HostData {
    #[serde(default)]
    display_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostFailure {
    #[serde(default)]
    message: String,
}

/// imgbb-style host: `POST ?key=...` with the base64 image as a form field.
#[derive(Debug, Clone)]
pub struct ImgbbHost {
    client: reqwest::Client,
    endpoint: String,
    key: Option<String>,
}

impl ImgbbHost {
    pub fn new(key: Option<String>) -> Self {
        Self::with_endpoint(DEFAULT_IMAGE_HOST_URL, key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            key: key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbHost {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> UploadResult<String> {
        validate_image(file_name, bytes)?;
        let key = self.key.as_deref().ok_or(UploadError::NotConfigured)?;

        debug!("Uploading {} ({} bytes)", file_name, bytes.len());
        let encoded = STANDARD.encode(bytes);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key)])
            .form(&[("image", encoded.as_str()), ("name", file_name)])
            .send()
            .await?;

        let status = response.status();
        let body: HostResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Rejected(e.to_string()))?;

        if !status.is_success() {
            let message = body.error.map(|e| e.message).unwrap_or_else(|| status.to_string());
            return Err(UploadError::Rejected(message));
        }

        body.data
            .and_then(|d| d.display_url.or(d.url))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| UploadError::Rejected("no URL in response".to_string()))
    }
}

/// Image to show on a card: the class image, or the fallback when missing.
pub fn card_image(url: Option<&str>) -> &str {
    match url.map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => FALLBACK_CARD_IMAGE,
    }
}

/// Checks that a card image URL actually serves an image.
#[derive(Debug, Clone)]
pub struct ImageProbe {
    client: reqwest::Client,
}

impl Default for ImageProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl ImageProbe {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// The URL if a HEAD request succeeds with an `image/*` content type,
    /// otherwise the fallback.
    pub async fn resolve(&self, url: Option<&str>) -> String {
        let candidate = card_image(url);
        if candidate == FALLBACK_CARD_IMAGE {
            return candidate.to_string();
        }

        match self.client.head(candidate).send().await {
            Ok(response) if response.status().is_success() => {
                let is_image = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|ct| ct.starts_with("image/"));
                if is_image {
                    candidate.to_string()
                } else {
                    debug!("{} is not an image", candidate);
                    FALLBACK_CARD_IMAGE.to_string()
                }
            }
            Ok(response) => {
                debug!("{} answered {}", candidate, response.status());
                FALLBACK_CARD_IMAGE.to_string()
            }
            Err(e) => {
                warn!("Could not load {}: {}", candidate, e);
                FALLBACK_CARD_IMAGE.to_string()
            }
        }
    }

    /// Check each distinct card image once and record the result on the course.
    pub async fn resolve_cards(&self, courses: &mut [Course]) {
        let mut seen: HashMap<String, String> = HashMap::new();
        for course in courses.iter_mut() {
            let url = card_image(course.image.as_deref()).to_string();
            let shown = match seen.get(&url) {
                Some(shown) => shown.clone(),
                None => {
                    let shown = self.resolve(Some(&url)).await;
                    seen.insert(url, shown.clone());
                    shown
                }
            };
            course.shown_image = Some(shown);
        }
    }
}
