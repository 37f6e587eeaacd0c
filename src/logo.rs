// src/logo.rs

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use tracing::{debug, info};

/// Raw logo bytes as picked by the user, plus the declared mime type.
#[derive(Clone, PartialEq, Eq)]
pub struct Logo {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Logo {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// `data:<mime>;base64,<payload>`, suitable for an image preview.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Parse a base64 data URL back into a logo. Returns `None` for
    /// anything that is not a base64 data URL.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        let bytes = general_purpose::STANDARD.decode(payload.trim()).ok()?;
        Some(Self::new(bytes, mime))
    }
}

impl std::fmt::Debug for Logo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logo")
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl Serialize for Logo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.data_url())
    }
}

/// Guess the mime type from a file extension the way a browser file
/// picker would report it.
pub fn mime_from_path(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Where a logo comes from. Picking may suspend (file dialogs, disk
/// reads); `Ok(None)` means the user picked nothing.
#[async_trait]
pub trait LogoSource {
    async fn pick(&self) -> std::io::Result<Option<Logo>>;
}

/// Reads the logo from a fixed path on disk.
pub struct FileLogoSource {
    pub path: PathBuf,
}

impl FileLogoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LogoSource for FileLogoSource {
    async fn pick(&self) -> std::io::Result<Option<Logo>> {
        debug!(path = %self.path.display(), "Reading logo file");
        let bytes = tokio::fs::read(&self.path).await?;
        let mime = mime_from_path(&self.path);
        info!(path = %self.path.display(), mime, bytes = bytes.len(), "Logo loaded");
        Ok(Some(Logo::new(bytes, mime)))
    }
}
