//! High-level pipeline: render → resolve blog → find existing post → create or update.
//!
//! This module provides the top-level orchestration for publishing one document.
//! It runs strictly in sequence and fails fast:
//!   - Renders the document (no remote traffic happens before this succeeds)
//!   - Obtains a session once and connects the [`BlogDirectory`] with it
//!   - Resolves the target blog from its URL
//!   - Looks for a post with the same title in draft, scheduled and live states
//!   - Creates a draft, updates the existing post, or refuses, per [`decide`]
//!
//! # Write Guarantee
//! At most one write call (create or update) is made per invocation, and it is
//! always the last remote call.
//!
//! # Duplicate Titles
//! If the remote blog holds several posts with the same title, the first one in
//! scan order (draft, then scheduled, then live; page order within a state) is
//! the one that gets updated or reported.
//!
//! # Navigation
//! - Main entrypoint: [`publish`]
//! - Without session handling: [`publish_rendered`]
//! - Supporting types: [`PublishRequest`], [`PublishReport`], [`Decision`].

use tracing::{debug, error, info};

use crate::config::PublishConfig;
use crate::contract::{BlogDirectory, LifecycleState, NewPost, PostSummary, Session, SessionProvider};
use crate::document::Document;
use crate::error::PublishError;
use crate::finder::find_by_title;
use crate::render::RenderedContent;

/// What the caller asked for, apart from the document itself.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub blog_url: String,
    /// Replaces the title derived from the file name.
    pub title: Option<String>,
    pub labels: Vec<String>,
    /// Allow rewriting a post that already has this title.
    pub update_allowed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    Created,
    Updated,
}

impl PublishAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishAction::Created => "created",
            PublishAction::Updated => "updated",
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub action: PublishAction,
    pub blog_id: String,
    pub post_id: String,
    pub title: String,
    pub state: LifecycleState,
    pub url: Option<String>,
}

/// The create-vs-update choice for one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Create,
    Update(PostSummary),
    Refuse(PostSummary),
}

pub fn decide(existing: Option<PostSummary>, update_allowed: bool) -> Decision {
    match (existing, update_allowed) {
        (None, _) => Decision::Create,
        (Some(post), true) => Decision::Update(post),
        (Some(post), false) => Decision::Refuse(post),
    }
}

/// Publish `document` according to `request`.
///
/// The document is rendered first; only then is `sessions` asked for a session,
/// which `connect` turns into the directory client used for every remote call.
pub async fn publish<S, D, F>(
    config: &PublishConfig,
    document: &Document,
    request: &PublishRequest,
    sessions: &S,
    connect: F,
) -> Result<PublishReport, PublishError>
where
    S: SessionProvider + ?Sized,
    D: BlogDirectory,
    F: FnOnce(Session) -> D,
{
    info!(path = %document.path().display(), blog_url = %request.blog_url, "[PUBLISH] Starting publish");

    let content = RenderedContent::build(
        document,
        request.title.as_deref(),
        &request.labels,
        config,
    )?;

    let session = match sessions.session().await {
        Ok(session) => {
            info!("[PUBLISH] Session established");
            session
        }
        Err(source) => {
            error!(error = ?source, "[PUBLISH][ERROR] No valid session");
            return Err(PublishError::NoSession { source });
        }
    };
    let directory = connect(session);

    publish_rendered(config, &content, request, &directory).await
}

/// Steps after rendering: resolve the blog, search by title and perform at most one write.
pub async fn publish_rendered<D>(
    config: &PublishConfig,
    content: &RenderedContent,
    request: &PublishRequest,
    directory: &D,
) -> Result<PublishReport, PublishError>
where
    D: BlogDirectory + ?Sized,
{
    let blog = match directory.resolve_blog_by_url(&request.blog_url).await {
        Ok(Some(blog)) => {
            info!(blog_id = %blog.id, blog_name = %blog.name, "[PUBLISH] Resolved blog");
            blog
        }
        Ok(None) => {
            error!(blog_url = %request.blog_url, "[PUBLISH][ERROR] No blog at URL");
            return Err(PublishError::BlogNotFound {
                url: request.blog_url.clone(),
            });
        }
        Err(e) => {
            error!(error = ?e, blog_url = %request.blog_url, "[PUBLISH][ERROR] resolve_blog failed");
            return Err(PublishError::remote("resolve_blog")(e));
        }
    };

    let existing = find_by_title(
        directory,
        &blog.id,
        &content.title,
        &config.scan_order,
        config,
    )
    .await?;

    let (action, post) = match decide(existing, request.update_allowed) {
        Decision::Create => {
            let new_post = NewPost {
                title: content.title.clone(),
                content: content.html.clone(),
                labels: (!content.labels.is_empty()).then(|| content.labels.clone()),
            };
            info!(title = %content.title, labels = content.labels.len(), "[PUBLISH] Creating draft post");
            let post = directory
                .create_post(&blog.id, new_post, true)
                .await
                .map_err(|e| {
                    error!(error = ?e, title = %content.title, "[PUBLISH][ERROR] create_post failed");
                    PublishError::remote("create_post")(e)
                })?;
            (PublishAction::Created, post)
        }
        Decision::Refuse(existing) => {
            error!(
                post_id = %existing.id,
                state = %existing.state,
                title = %existing.title,
                "[PUBLISH][ERROR] Post with this title exists and update is not allowed"
            );
            return Err(PublishError::PostAlreadyExists {
                title: existing.title,
                post_id: existing.id,
                state: existing.state,
            });
        }
        Decision::Update(existing) => {
            let new_post = NewPost {
                title: content.title.clone(),
                content: content.html.clone(),
                labels: (!content.labels.is_empty()).then(|| content.labels.clone()),
            };
            info!(post_id = %existing.id, state = %existing.state, "[PUBLISH] Updating existing post");
            let post = directory
                .update_post(&blog.id, &existing.id, new_post)
                .await
                .map_err(|e| {
                    error!(error = ?e, post_id = %existing.id, "[PUBLISH][ERROR] update_post failed");
                    PublishError::remote("update_post")(e)
                })?;
            (PublishAction::Updated, post)
        }
    };

    info!(action = action.as_str(), post_id = %post.id, state = %post.state, "[PUBLISH] Publish complete");
    if config.debug {
        match serde_json::to_string_pretty(&post) {
            Ok(json) => debug!(json = %json, "[PUBLISH][DEBUG] Written post as JSON"),
            Err(e) => error!(error = ?e, "[PUBLISH][DEBUG] Failed to serialize written post"),
        }
    }

    Ok(PublishReport {
        action,
        blog_id: blog.id,
        post_id: post.id,
        title: post.title,
        state: post.state,
        url: post.url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> PostSummary {
        PostSummary {
            id: id.to_string(),
            title: "t".to_string(),
            labels: vec![],
            state: LifecycleState::Live,
            published: None,
            url: None,
        }
    }

    #[test]
    fn decision_table() {
        assert_eq!(decide(None, false), Decision::Create);
        assert_eq!(decide(None, true), Decision::Create);
        assert_eq!(decide(Some(summary("1")), true), Decision::Update(summary("1")));
        assert_eq!(decide(Some(summary("1")), false), Decision::Refuse(summary("1")));
    }
}
