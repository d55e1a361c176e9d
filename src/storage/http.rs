//! HTTP implementations of the storage endpoints.
//!
//! Three backend surfaces: the project collection (list/upsert/delete) and
//! the multipart image upload. Wire shapes match the backend exactly; see
//! [`crate::project::types::Project`] for the document format.

use async_trait::async_trait;

use crate::config::MuralConfig;
use crate::error::{MuralError, Result};
use crate::project::types::Project;

use super::store::ProjectStore;

/// Project storage over the backend's `/canvases` endpoints.
#[derive(Debug, Clone)]
pub struct HttpProjectStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProjectStore {
    /// Create a store talking to the configured backend.
    pub fn new(config: &MuralConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.canvases_url(),
        }
    }

    /// Create a store with an explicit collection URL (tests).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: url.into(),
        }
    }

    fn check(status: reqwest::StatusCode, action: &str) -> Result<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(MuralError::StorageError(format!(
                "{action}: HTTP {}",
                status.as_u16()
            )))
        }
    }
}

#[async_trait]
impl ProjectStore for HttpProjectStore {
    async fn list(&self) -> Result<Vec<Project>> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| MuralError::StorageError(format!("list projects: {e}")))?;
        Self::check(response.status(), "list projects")?;
        response
            .json()
            .await
            .map_err(|e| MuralError::StorageError(format!("decode project list: {e}")))
    }

    async fn upsert(&self, project: &Project) -> Result<()> {
        let response = self
            .client
            .post(&self.base_url)
            .json(project)
            .send()
            .await
            .map_err(|e| MuralError::StorageError(format!("save project: {e}")))?;
        Self::check(response.status(), "save project")
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = format!("{}/{id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| MuralError::StorageError(format!("delete project: {e}")))?;
        Self::check(response.status(), "delete project")
    }
}

/// Response of the image upload endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UploadedImage {
    /// URL of the stored image, relative to the backend.
    pub url: String,
    /// Server-assigned file name.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Client for the multipart image upload endpoint.
#[derive(Debug, Clone)]
pub struct ImageUploader {
    client: reqwest::Client,
    url: String,
}

impl ImageUploader {
    /// Create an uploader talking to the configured backend.
    pub fn new(config: &MuralConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.upload_url(),
        }
    }

    /// Create an uploader with an explicit endpoint URL (tests).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Upload one image.
    ///
    /// Only `image/*` MIME types are accepted; anything else is rejected
    /// here, before any request is sent.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        mime_type: &str,
    ) -> Result<UploadedImage> {
        if !mime_type.starts_with("image/") {
            return Err(MuralError::ImageError(format!(
                "only image uploads are supported, got {mime_type}"
            )));
        }

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.into())
            .mime_str(mime_type)
            .map_err(|e| MuralError::ImageError(format!("invalid MIME type {mime_type}: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MuralError::RequestError(format!("upload image: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MuralError::RequestError(format!(
                "upload image: HTTP {}",
                status.as_u16()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| MuralError::RequestError(format!("decode upload response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_image_upload_rejected_before_any_request() {
        // Deliberately unroutable URL: the type check must fire first.
        let uploader = ImageUploader::with_url("http://127.0.0.1:1/upload-image");
        let result = uploader
            .upload(b"PDF".to_vec(), "doc.pdf", "application/pdf")
            .await;
        match result {
            Err(e) => {
                assert_eq!(e.code(), "IMAGE_FAILED");
                assert!(e.message().contains("application/pdf"));
            }
            Ok(_) => unreachable!("non-image must be rejected"),
        }
    }

    #[test]
    fn upload_response_decodes_without_filename() {
        let decoded: std::result::Result<UploadedImage, _> =
            serde_json::from_str(r#"{"url": "/storage/images/a.png"}"#);
        match decoded {
            Ok(u) => {
                assert_eq!(u.url, "/storage/images/a.png");
                assert!(u.filename.is_none());
            }
            Err(e) => unreachable!("decode: {e}"),
        }
    }
}
