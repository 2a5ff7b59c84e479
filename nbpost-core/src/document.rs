//! Document loading: format detection by extension and title derivation.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::PublishConfig;
use crate::error::PublishError;

/// Source formats the renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Html,
    Notebook,
}

impl DocumentFormat {
    /// Detect the format from the file extension alone. `None` for anything unrecognised.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") {
            Some(DocumentFormat::Html)
        } else if ext.eq_ignore_ascii_case("ipynb") {
            Some(DocumentFormat::Notebook)
        } else {
            None
        }
    }
}

/// A source document read once per invocation.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    format: DocumentFormat,
    raw: Vec<u8>,
    derived_title: String,
}

impl Document {
    /// Build a document from bytes already in memory. Format and title still come from `path`.
    pub fn from_bytes(path: impl Into<PathBuf>, raw: Vec<u8>) -> Result<Self, PublishError> {
        let path = path.into();
        let format = DocumentFormat::from_path(&path)
            .ok_or_else(|| PublishError::UnsupportedFormat { path: path.clone() })?;
        let derived_title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path,
            format,
            raw,
            derived_title,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// File name without its extension; the default post title.
    pub fn derived_title(&self) -> &str {
        &self.derived_title
    }
}

/// Load the document at `path`. The extension is checked before the file is touched.
pub fn load(path: impl AsRef<Path>, config: &PublishConfig) -> Result<Document, PublishError> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading document");

    let Some(format) = DocumentFormat::from_path(path) else {
        error!(path = %path.display(), "Unsupported document extension");
        return Err(PublishError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    };

    let raw = std::fs::read(path).map_err(|source| {
        error!(error = ?source, path = %path.display(), "Failed to read document");
        PublishError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let document = Document::from_bytes(path, raw)?;
    info!(
        ?format,
        size = document.raw().len(),
        title = document.derived_title(),
        "Document loaded"
    );
    if config.debug {
        let head = &document.raw()[..document.raw().len().min(256)];
        debug!(head = %String::from_utf8_lossy(head), "[DEBUG] Document head");
    }
    Ok(document)
}
