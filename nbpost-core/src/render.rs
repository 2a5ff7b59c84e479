//! Content rendering: turns a [`Document`] into post HTML behind the fixed header fragment.

use tracing::{debug, error, info};

use crate::config::PublishConfig;
use crate::document::{Document, DocumentFormat};
use crate::error::PublishError;
use crate::notebook::notebook_to_html;

/// Prepended to every post: bootstraps MathJax so `$...$` and `$$...$$` are typeset.
pub const HEADER_FRAGMENT: &str = concat!(
    "<script type=\"text/x-mathjax-config\">\n",
    "MathJax.Hub.Config({tex2jax: {inlineMath: [['$','$'], ['\\\\(','\\\\)']], ",
    "processEscapes: true}});\n",
    "</script>\n",
    "<script type=\"text/javascript\" async ",
    "src=\"https://cdnjs.cloudflare.com/ajax/libs/mathjax/2.7.9/MathJax.js?config=TeX-AMS-MML_HTMLorMML\">",
    "</script>\n",
);

/// What gets published: final HTML, title and labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub html: String,
    pub title: String,
    /// Ordered, deduplicated; empty means "none supplied".
    pub labels: Vec<String>,
}

impl RenderedContent {
    /// Render `document` behind [`HEADER_FRAGMENT`] and settle title and labels.
    pub fn build(
        document: &Document,
        title_override: Option<&str>,
        labels: &[String],
        config: &PublishConfig,
    ) -> Result<Self, PublishError> {
        let html = render(document, HEADER_FRAGMENT, config)?;
        let title = title_override
            .map(str::to_owned)
            .unwrap_or_else(|| document.derived_title().to_owned());
        Ok(Self {
            html,
            title,
            labels: normalise_labels(labels),
        })
    }
}

/// Render a document to HTML, starting with `header`.
///
/// HTML documents pass through byte for byte; notebooks are converted cell by cell.
pub fn render(
    document: &Document,
    header: &str,
    config: &PublishConfig,
) -> Result<String, PublishError> {
    let render_error = |reason: String| {
        error!(path = %document.path().display(), reason = %reason, "[RENDER] Failed to render document");
        PublishError::Render {
            path: document.path().to_path_buf(),
            reason,
        }
    };

    let body = match document.format() {
        DocumentFormat::Html => std::str::from_utf8(document.raw())
            .map(str::to_owned)
            .map_err(|e| render_error(format!("HTML is not valid UTF-8: {e}")))?,
        DocumentFormat::Notebook => notebook_to_html(document.raw()).map_err(render_error)?,
    };

    let mut html = String::with_capacity(header.len() + body.len());
    html.push_str(header);
    html.push_str(&body);

    info!(
        path = %document.path().display(),
        format = ?document.format(),
        bytes = html.len(),
        "[RENDER] Document rendered"
    );
    if config.debug {
        debug!(html = %html, "[RENDER][DEBUG] Rendered HTML");
    }
    Ok(html)
}

/// Trim labels, drop empty ones and keep the first occurrence of each.
pub fn normalise_labels(labels: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        if !seen.iter().any(|s| s == label) {
            seen.push(label.to_owned());
        }
    }
    seen
}
