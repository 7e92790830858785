//! Avatar upload to an ImgBB-compatible image host

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::error::ApiError;
use crate::config::UploadConfig;

const PROVIDER_NAME: &str = "imgbb";

/// ImgBB rejects files above 32 MB
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Uploads an image and returns its public URL
#[async_trait]
pub trait AvatarUploader: Send + Sync {
    /// Provider name used in errors and logs
    fn name(&self) -> &str;

    /// Upload `bytes` as `file_name`, returning the public URL
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError>;
}

/// Check that a file looks like an uploadable image
pub fn check_image(file_name: &str, len: usize) -> Result<(), ApiError> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::unsupported(
            PROVIDER_NAME,
            format!("'{file_name}' is not a supported image type"),
        ));
    }
    if len == 0 {
        return Err(ApiError::unsupported(
            PROVIDER_NAME,
            format!("'{file_name}' is empty"),
        ));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(ApiError::unsupported(
            PROVIDER_NAME,
            format!("'{file_name}' is larger than 32 MB"),
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
    error: Option<UploadErrorBody>,
}

#[derive(Deserialize)]
struct UploadData {
    display_url: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct UploadErrorBody {
    message: Option<String>,
}

/// Extract the public URL (or the error) from an upload response
fn parse_upload_response(
    status: u16,
    retry_after: Option<u64>,
    body: &str,
) -> Result<String, ApiError> {
    let parsed: Option<UploadResponse> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let message = parsed
            .and_then(|r| r.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(ApiError::from_status(
            PROVIDER_NAME,
            status,
            retry_after,
            message,
        ));
    }

    parsed
        .and_then(|r| r.data)
        .and_then(|d| d.display_url.or(d.url))
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::invalid_response(PROVIDER_NAME, "response has no image URL"))
}

/// ImgBB upload client
pub struct ImgBbUploader {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
}

impl ImgBbUploader {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("booth/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Build from config; fails with `NotConfigured` when no API key is set
    pub fn from_config(config: &UploadConfig) -> Result<Self, ApiError> {
        match config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Self::new(
                key,
                config.endpoint.clone(),
                Duration::from_secs(config.timeout_secs),
            ),
            _ => Err(ApiError::not_configured(PROVIDER_NAME)),
        }
    }
}

#[async_trait]
impl AvatarUploader for ImgBbUploader {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        check_image(file_name, bytes.len())?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("key", self.api_key.clone())
            .part("image", part);

        tracing::debug!(file = file_name, endpoint = %self.endpoint, "uploading avatar");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        let result = parse_upload_response(status, retry_after, &body);
        match &result {
            Ok(url) => tracing::info!(url = %url, "avatar uploaded"),
            Err(err) => tracing::warn!(error = %err, "avatar upload failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_image() {
        assert!(check_image("ada.png", 10).is_ok());
        assert!(check_image("ADA.JPEG", 10).is_ok());
        assert!(check_image("notes.txt", 10).is_err());
        assert!(check_image("no_extension", 10).is_err());
        assert!(check_image("ada.png", 0).is_err());
        assert!(check_image("ada.png", MAX_UPLOAD_BYTES + 1).is_err());
    }

    #[test]
    fn test_parse_success_prefers_display_url() {
        let body = r#"{"data": {"url": "https://i.ibb.co/full/ada.png", "display_url": "https://i.ibb.co/disp/ada.png"}, "success": true, "status": 200}"#;
        assert_eq!(
            parse_upload_response(200, None, body).unwrap(),
            "https://i.ibb.co/disp/ada.png"
        );
    }

    #[test]
    fn test_parse_success_without_url() {
        let err = parse_upload_response(200, None, r#"{"data": {}}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));

        let err = parse_upload_response(200, None, "<html>").unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));
    }

    #[test]
    fn test_parse_error_message() {
        let body = r#"{"status_code": 400, "error": {"message": "Invalid API v1 key.", "code": 100}}"#;
        let err = parse_upload_response(400, None, body).unwrap_err();
        assert_eq!(err, ApiError::http("imgbb", 400, "Invalid API v1 key."));
    }

    #[test]
    fn test_parse_rate_limited() {
        let err = parse_upload_response(429, Some(60), "").unwrap_err();
        assert_eq!(err, ApiError::rate_limited("imgbb", Some(60)));
    }

    #[test]
    fn test_from_config_without_key() {
        let err = ImgBbUploader::from_config(&UploadConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, ApiError::not_configured("imgbb"));

        let blank = UploadConfig {
            api_key: Some("  ".to_string()),
            ..UploadConfig::default()
        };
        assert!(ImgBbUploader::from_config(&blank).is_err());
    }

    #[test]
    fn test_from_config_with_key() {
        let config = UploadConfig {
            api_key: Some("secret".to_string()),
            ..UploadConfig::default()
        };
        let uploader = ImgBbUploader::from_config(&config).unwrap();
        assert_eq!(uploader.name(), "imgbb");
    }
}
