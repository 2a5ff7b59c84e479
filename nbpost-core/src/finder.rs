//! Post lookup by title across lifecycle states.
//!
//! Listing is exposed as [`PostPages`], a restartable lazy stream of pages for one
//! blog and one state. [`find_by_title`] walks those streams in the configured
//! state order and stops at the first exact title match, so no page or state is
//! fetched after a hit.

use futures::pin_mut;
use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, info};

use crate::config::PublishConfig;
use crate::contract::{BlogDirectory, LifecycleState, PostPage, PostQuery, PostSummary};
use crate::error::PublishError;

/// Paginated listing of one blog's posts in one state.
///
/// Each call to [`PostPages::stream`] starts again from the first page. A stream
/// ends after a page without a continuation token or a page with no items.
/// Post bodies are never requested.
pub struct PostPages<'a, D: ?Sized> {
    directory: &'a D,
    blog_id: &'a str,
    state: LifecycleState,
}

impl<'a, D> PostPages<'a, D>
where
    D: BlogDirectory + ?Sized,
{
    pub fn new(directory: &'a D, blog_id: &'a str, state: LifecycleState) -> Self {
        Self {
            directory,
            blog_id,
            state,
        }
    }

    pub fn stream(&self) -> impl Stream<Item = Result<PostPage, PublishError>> + 'a {
        let directory = self.directory;
        let blog_id = self.blog_id;
        let state = self.state;

        // `None` once exhausted, otherwise the token for the next request.
        let start: Option<Option<String>> = Some(None);
        stream::try_unfold(start, move |cursor: Option<Option<String>>| async move {
            let Some(page_token) = cursor else {
                return Ok::<_, PublishError>(None);
            };
            let query = PostQuery {
                state,
                page_token,
                fetch_bodies: false,
            };
            let page = directory
                .list_posts(blog_id, query)
                .await
                .map_err(PublishError::remote("list_posts"))?;
            let next = match &page.next_page_token {
                Some(token) if !page.items.is_empty() => Some(Some(token.clone())),
                _ => None,
            };
            Ok(Some((page, next)))
        })
    }
}

/// Find the first post titled exactly `title`, scanning `states` in order.
pub async fn find_by_title<D>(
    directory: &D,
    blog_id: &str,
    title: &str,
    states: &[LifecycleState],
    config: &PublishConfig,
) -> Result<Option<PostSummary>, PublishError>
where
    D: BlogDirectory + ?Sized,
{
    for &state in states {
        info!(blog_id, %state, title, "[FIND] Scanning posts");
        let pages = PostPages::new(directory, blog_id, state).stream();
        pin_mut!(pages);

        let mut page_number = 0usize;
        while let Some(page) = pages.try_next().await? {
            page_number += 1;
            debug!(
                %state,
                page = page_number,
                items = page.items.len(),
                has_next = page.next_page_token.is_some(),
                "[FIND] Fetched page"
            );
            if config.debug {
                match serde_json::to_string_pretty(&page) {
                    Ok(json) => debug!(json = %json, "[FIND][DEBUG] Listing page as JSON"),
                    Err(e) => debug!(error = ?e, "[FIND][DEBUG] Failed to serialize listing page"),
                }
            }
            if let Some(found) = page.items.into_iter().find(|post| post.title == title) {
                info!(post_id = %found.id, %state, page = page_number, "[FIND] Found post with matching title");
                return Ok(Some(found));
            }
        }
        debug!(%state, pages = page_number, "[FIND] State exhausted without a match");
    }
    info!(title, "[FIND] No existing post with this title");
    Ok(None)
}
