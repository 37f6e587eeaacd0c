// src/render/export.rs

use super::{RenderedDocument, pdf};
use crate::error::RenderError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// "Open for interactive preview".
pub trait Viewer {
    fn show(&self, doc: &RenderedDocument) -> Result<(), RenderError>;
}

/// "Persist as a downloadable file". Returns where the file landed.
pub trait Saver {
    fn save(&self, doc: &RenderedDocument, file_name: &str) -> Result<PathBuf, RenderError>;
}

/// Writes a preview copy of the PDF and logs where to open it.
pub struct PdfPreview {
    pub dir: PathBuf,
}

impl PdfPreview {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn preview_path(&self, doc: &RenderedDocument) -> PathBuf {
        // Short fingerprint keeps previews of different layouts apart.
        let fp = doc.fingerprint();
        self.dir.join(format!("preview-{}.pdf", &fp[..12]))
    }
}

impl Viewer for PdfPreview {
    fn show(&self, doc: &RenderedDocument) -> Result<(), RenderError> {
        let bytes = pdf::encode(doc)?;
        let path = self.preview_path(doc);
        write_file(&path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Preview ready");
        Ok(())
    }
}

/// Saves `<dir>/<file_name>`.
pub struct PdfFileSaver {
    pub dir: PathBuf,
}

impl PdfFileSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Saver for PdfFileSaver {
    fn save(&self, doc: &RenderedDocument, file_name: &str) -> Result<PathBuf, RenderError> {
        let bytes = pdf::encode(doc)?;
        let path = self.dir.join(file_name);
        write_file(&path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Invoice saved");
        Ok(path)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
