use std::path::PathBuf;

use thiserror::Error;

use crate::contract::{LifecycleState, RemoteError};

/// Every way a publish invocation can fail. All of them abort the run.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("unsupported format: {} (expected .html, .htm or .ipynb)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render error: {}: {reason}", path.display())]
    Render { path: PathBuf, reason: String },

    #[error("blog not found: no accessible blog at {url}")]
    BlogNotFound { url: String },

    #[error("post already exists: \"{title}\" is {state} post {post_id} and updating was not allowed")]
    PostAlreadyExists {
        title: String,
        post_id: String,
        state: LifecycleState,
    },

    #[error("no valid session: {source}")]
    NoSession {
        #[source]
        source: RemoteError,
    },

    #[error("remote call failed: {operation}: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },
}

impl PublishError {
    /// Short failure-kind name for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::UnsupportedFormat { .. } => "unsupported_format",
            PublishError::Io { .. } => "io",
            PublishError::Render { .. } => "render",
            PublishError::BlogNotFound { .. } => "blog_not_found",
            PublishError::PostAlreadyExists { .. } => "post_already_exists",
            PublishError::NoSession { .. } => "no_session",
            PublishError::Remote { .. } => "remote",
        }
    }

    pub(crate) fn remote(operation: &'static str) -> impl FnOnce(RemoteError) -> PublishError {
        move |source| PublishError::Remote { operation, source }
    }
}
