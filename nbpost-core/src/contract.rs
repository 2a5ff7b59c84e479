//! # contract: collaborator interfaces for the publish pipeline
//!
//! This module defines the data model shared by the pipeline and the two traits
//! the core depends on but does not implement:
//!
//! - [`BlogDirectory`]: resolves a blog by URL, lists its posts page by page and
//!   writes posts. Implemented over HTTP by the CLI crate.
//! - [`SessionProvider`]: supplies an authenticated [`Session`]. The pipeline asks
//!   for it once per publish and cannot proceed without it.
//!
//! ## Mocking & Testing
//! Both traits are annotated for `mockall`, so tests get `MockBlogDirectory` and
//! `MockSessionProvider` with call-count expectations.
//!
//! ## Error Shape
//! All collaborator calls return [`RemoteError`], a boxed error. The orchestrator
//! wraps it into [`crate::error::PublishError::Remote`] with the failing operation.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Error returned by collaborator calls.
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Draft,
    Scheduled,
    Live,
}

impl LifecycleState {
    /// Search order used when looking for an existing post before publishing.
    pub const PUBLISH_SCAN_ORDER: [LifecycleState; 3] = [
        LifecycleState::Draft,
        LifecycleState::Scheduled,
        LifecycleState::Live,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Draft => "draft",
            LifecycleState::Scheduled => "scheduled",
            LifecycleState::Live => "live",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote blog, resolved by its public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blog {
    pub id: String,
    pub url: String,
    pub name: String,
}

/// A post as returned by a listing call (bodies excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub labels: Vec<String>,
    pub state: LifecycleState,
    pub published: Option<String>,
    pub url: Option<String>,
}

/// A full post as returned by a write call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub labels: Vec<String>,
    pub state: LifecycleState,
    pub published: Option<String>,
    pub url: Option<String>,
}

/// Parameters of one listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub state: LifecycleState,
    /// Continuation token from the previous page, `None` for the first page.
    pub page_token: Option<String>,
    pub fetch_bodies: bool,
}

/// One page of a post listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostPage {
    pub items: Vec<PostSummary>,
    pub next_page_token: Option<String>,
}

/// Content written by a create or update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    /// `None` sends no labels: a new post gets none, an updated post keeps its own.
    pub labels: Option<Vec<String>>,
}

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Remote blog service: blog lookup, paginated post listing and post writes.
///
/// Every method is a single request/response; implementors must not retry on
/// behalf of the pipeline beyond what their transport already does.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BlogDirectory: Send + Sync {
    /// Resolve a blog from its public URL. `Ok(None)` when no accessible blog matches.
    async fn resolve_blog_by_url(&self, url: &str) -> Result<Option<Blog>, RemoteError>;

    /// Fetch one page of posts in the given state.
    async fn list_posts(&self, blog_id: &str, query: PostQuery) -> Result<PostPage, RemoteError>;

    /// Create a post. `as_draft` keeps it unpublished.
    async fn create_post(
        &self,
        blog_id: &str,
        post: NewPost,
        as_draft: bool,
    ) -> Result<Post, RemoteError>;

    /// Rewrite an existing post in place. Fields not carried by `post` are left as they are.
    async fn update_post(
        &self,
        blog_id: &str,
        post_id: &str,
        post: NewPost,
    ) -> Result<Post, RemoteError>;
}

/// Supplies the authenticated session the directory client runs under.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn session(&self) -> Result<Session, RemoteError>;
}
