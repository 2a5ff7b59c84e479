#![doc = "Blogger v3 REST client: implements the core BlogDirectory trait over HTTPS with a bearer session."]
//
//! # Blogger client (CLI <-> Core)
//!
//! Bridges [`nbpost_core::contract::BlogDirectory`] to the Blogger v3 API.
//! Every trait method is one HTTP request; transport, wire (de)serialisation and
//! status mapping stay in this module. Non-success responses become errors that
//! carry the HTTP status and response body. Updates are `PATCH`es, so labels and
//! other fields absent from the body keep their remote values.

use async_trait::async_trait;
use nbpost_core::contract::{
    Blog, BlogDirectory, LifecycleState, NewPost, Post, PostPage, PostQuery, PostSummary,
    RemoteError, Session,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub struct BloggerClient {
    http: reqwest::Client,
    api_base: String,
    session: Session,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlog {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePost {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePostList {
    #[serde(default)]
    items: Vec<WirePost>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct WritePost<'a> {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    title: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<&'a [String]>,
}

impl<'a> WritePost<'a> {
    fn new(id: Option<&'a str>, post: &'a NewPost) -> Self {
        Self {
            kind: "blogger#post",
            id,
            title: &post.title,
            content: &post.content,
            labels: post.labels.as_deref(),
        }
    }
}

/// Query value Blogger expects for a lifecycle state.
pub fn api_status(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Draft => "draft",
        LifecycleState::Scheduled => "scheduled",
        LifecycleState::Live => "live",
    }
}

/// Map a Blogger post status (`DRAFT`, `SCHEDULED`, `LIVE`) onto a lifecycle state.
pub fn lifecycle_state(status: &str) -> Option<LifecycleState> {
    match status.to_ascii_uppercase().as_str() {
        "DRAFT" => Some(LifecycleState::Draft),
        "SCHEDULED" => Some(LifecycleState::Scheduled),
        "LIVE" => Some(LifecycleState::Live),
        _ => None,
    }
}

impl WirePost {
    fn state_or(&self, fallback: LifecycleState) -> LifecycleState {
        self.status
            .as_deref()
            .and_then(lifecycle_state)
            .unwrap_or(fallback)
    }

    fn into_summary(self, fallback: LifecycleState) -> PostSummary {
        let state = self.state_or(fallback);
        PostSummary {
            id: self.id,
            title: self.title,
            labels: self.labels,
            state,
            published: self.published,
            url: self.url,
        }
    }

    fn into_post(self, fallback: LifecycleState) -> Post {
        let state = self.state_or(fallback);
        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            labels: self.labels,
            state,
            published: self.published,
            url: self.url,
        }
    }
}

impl BloggerClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, session: Session) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        tracing::info!(api_base = %api_base, "Initialized BloggerClient");
        Self {
            http,
            api_base,
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, RemoteError> {
        request
            .bearer_auth(&self.session.access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(operation, error = ?e, "Blogger request failed to send");
                format!("{operation}: {e}").into()
            })
    }
}

/// Deserialize a successful response, or turn any other status into an error.
async fn read_json<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(operation, %status, body = %body, "Blogger API returned an error");
        return Err(format!("{operation}: HTTP {status}: {body}").into());
    }
    response.json::<T>().await.map_err(|e| {
        tracing::error!(operation, error = ?e, "Failed to decode Blogger response");
        format!("{operation}: invalid response body: {e}").into()
    })
}

#[async_trait]
impl BlogDirectory for BloggerClient {
    async fn resolve_blog_by_url(&self, url: &str) -> Result<Option<Blog>, RemoteError> {
        tracing::info!(blog_url = url, "Resolving blog by URL");
        let request = self.http.get(self.url("blogs/byurl")).query(&[("url", url)]);
        let response = self.send("resolve_blog", request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(blog_url = url, "No blog at URL");
            return Ok(None);
        }
        let blog: WireBlog = read_json("resolve_blog", response).await?;
        Ok(Some(Blog {
            id: blog.id,
            url: blog.url,
            name: blog.name,
        }))
    }

    async fn list_posts(&self, blog_id: &str, query: PostQuery) -> Result<PostPage, RemoteError> {
        let mut params = vec![
            ("status", api_status(query.state).to_string()),
            ("fetchBodies", query.fetch_bodies.to_string()),
        ];
        if let Some(token) = &query.page_token {
            params.push(("pageToken", token.clone()));
        }
        tracing::debug!(blog_id, state = %query.state, page_token = ?query.page_token, "Listing posts");

        let request = self
            .http
            .get(self.url(&format!("blogs/{blog_id}/posts")))
            .query(&params);
        let response = self.send("list_posts", request).await?;
        let list: WirePostList = read_json("list_posts", response).await?;
        Ok(PostPage {
            items: list
                .items
                .into_iter()
                .map(|post| post.into_summary(query.state))
                .collect(),
            next_page_token: list.next_page_token,
        })
    }

    async fn create_post(
        &self,
        blog_id: &str,
        post: NewPost,
        as_draft: bool,
    ) -> Result<Post, RemoteError> {
        tracing::info!(blog_id, title = %post.title, as_draft, "Creating post");
        let request = self
            .http
            .post(self.url(&format!("blogs/{blog_id}/posts")))
            .query(&[("isDraft", as_draft.to_string())])
            .json(&WritePost::new(None, &post));
        let response = self.send("create_post", request).await?;
        let written: WirePost = read_json("create_post", response).await?;
        let fallback = if as_draft {
            LifecycleState::Draft
        } else {
            LifecycleState::Live
        };
        Ok(written.into_post(fallback))
    }

    async fn update_post(
        &self,
        blog_id: &str,
        post_id: &str,
        post: NewPost,
    ) -> Result<Post, RemoteError> {
        tracing::info!(blog_id, post_id, title = %post.title, "Updating post");
        let request = self
            .http
            .patch(self.url(&format!("blogs/{blog_id}/posts/{post_id}")))
            .json(&WritePost::new(Some(post_id), &post));
        let response = self.send("update_post", request).await?;
        let written: WirePost = read_json("update_post", response).await?;
        Ok(written.into_post(LifecycleState::Live))
    }
}
