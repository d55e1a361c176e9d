//! Server-driven image insertion into the canvas document.
//!
//! Triggered when a tool result carries an `image_url`. The image is
//! fetched once to learn its natural dimensions and inline its payload as a
//! data URL; a fetch or decode failure degrades to a fixed fallback size
//! with the source URL standing in for the payload, never aborting the
//! insertion. Each insertion appends an opaque white backing rectangle and
//! then the image element, so the image renders above the rectangle and
//! reads the same on any canvas background.

use async_trait::async_trait;
use base64::Engine as _;

use crate::config::LayoutConfig;
use crate::error::{MuralError, Result};

use super::document::FileBlob;
use super::element::Element;
use super::host::CanvasHost;
use super::layout::{self, DisplaySize, Position};

/// A fetched, decoded image ready for inlining.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Payload as a data URL.
    pub data_url: String,
}

/// Fetches an image and probes its dimensions.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch and decode the image at `url`.
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

/// [`ImageFetcher`] backed by an HTTP client and the `image` decoder.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Create a fetcher with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MuralError::ImageError(format!("fetch {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MuralError::ImageError(format!(
                "fetch {url}: HTTP {}",
                status.as_u16()
            )));
        }
        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MuralError::ImageError(format!("read {url}: {e}")))?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| MuralError::ImageError(format!("decode {url}: {e}")))?;
        let mime_type = header_mime
            .filter(|m| m.starts_with("image/"))
            .unwrap_or_else(|| mime_for_url(url).to_string());
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        Ok(FetchedImage {
            width: decoded.width(),
            height: decoded.height(),
            mime_type: mime_type.clone(),
            data_url: format!("data:{mime_type};base64,{encoded}"),
        })
    }
}

/// Guess a MIME type from a URL's file extension. Defaults to PNG.
pub fn mime_for_url(raw: &str) -> &'static str {
    // Storage URLs are often relative paths; fall back to trimming the
    // query/fragment by hand when they do not parse as absolute URLs.
    let path = match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or(raw)
            .to_string(),
    };
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

/// Outcome of one insertion, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedImage {
    /// Id of the appended image element.
    pub element_id: String,
    /// Id of the registered file blob.
    pub file_id: String,
    /// Where the image landed.
    pub position: Position,
    /// Its display size after capping.
    pub size: DisplaySize,
}

/// Insert the image at `url` into the canvas.
///
/// Never fails: a probe failure falls back to the configured square size
/// and the source URL is stored as the file payload. The caller is
/// expected to follow up with a forced save.
pub async fn insert_image(
    host: &dyn CanvasHost,
    fetcher: &dyn ImageFetcher,
    url: &str,
    config: &LayoutConfig,
) -> InsertedImage {
    let fetched = match fetcher.fetch(url).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::warn!(url, error = %e, "image probe failed, using fallback size");
            FetchedImage {
                width: config.fallback_size as u32,
                height: config.fallback_size as u32,
                mime_type: mime_for_url(url).to_string(),
                data_url: url.to_string(),
            }
        }
    };

    let mut elements = host.elements();
    let position = layout::next_position(&elements, config);
    let size = layout::display_size(f64::from(fetched.width), f64::from(fetched.height), config);

    let file_id = new_id();
    let element_id = new_id();
    let backing_id = new_id();

    host.add_files(vec![FileBlob {
        id: file_id.clone(),
        mime_type: fetched.mime_type,
        data_url: fetched.data_url,
        created: chrono::Utc::now().timestamp_millis().max(0) as u64,
    }]);

    // Backing rectangle first so the image paints above it.
    elements.push(Element::backing_rectangle(
        backing_id,
        position.x,
        position.y,
        size.width,
        size.height,
    ));
    elements.push(Element::image(
        element_id.clone(),
        file_id.clone(),
        position.x,
        position.y,
        size.width,
        size.height,
    ));
    host.update_scene(elements);

    tracing::info!(url, x = position.x, y = position.y, "inserted generated image");
    InsertedImage {
        element_id,
        file_id,
        position,
        size,
    }
}

/// Generate a fresh element/file identifier.
fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
