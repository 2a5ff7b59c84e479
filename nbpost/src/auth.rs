//! Stored-credential session provider.
//!
//! Reads an OAuth access token from a JSON credential store and refreshes it
//! against the token endpoint once it has expired. The refreshed token is written
//! back so the next run can reuse it. The interactive consent flow that produces
//! the first store is out of scope; the store is expected to exist.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use nbpost_core::contract::{RemoteError, Session, SessionProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::load_config::AuthSection;

/// Tokens this close to expiry are refreshed instead of used.
const EXPIRY_MARGIN_SECS: u64 = 60;

/// On-disk credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStore {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds; `None` means the token does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl CredentialStore {
    pub fn is_valid_at(&self, now: u64) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => now.saturating_add(EXPIRY_MARGIN_SECS) < expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

pub struct StoredCredentials {
    http: reqwest::Client,
    path: PathBuf,
    token_endpoint: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl StoredCredentials {
    pub fn new(http: reqwest::Client, auth: &AuthSection) -> Self {
        Self {
            http,
            path: auth.credentials.clone(),
            token_endpoint: auth.token_endpoint.clone(),
            client_id: auth.client_id.clone(),
            client_secret: auth.client_secret.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_store(&self) -> Result<CredentialStore, RemoteError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            error!(error = ?e, path = ?self.path, "Failed to read credential store");
            format!("cannot read credential store {:?}: {e}", self.path)
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            error!(error = ?e, path = ?self.path, "Failed to parse credential store");
            format!("cannot parse credential store {:?}: {e}", self.path).into()
        })
    }

    fn write_store(&self, store: &CredentialStore) -> Result<(), RemoteError> {
        let json = serde_json::to_string_pretty(store)?;
        fs::write(&self.path, json).map_err(|e| {
            error!(error = ?e, path = ?self.path, "Failed to rewrite credential store");
            format!("cannot write credential store {:?}: {e}", self.path).into()
        })
    }

    async fn refresh(&self, store: CredentialStore, now: u64) -> Result<CredentialStore, RemoteError> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            store.refresh_token.as_deref(),
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
        ) else {
            error!(
                has_refresh_token = store.refresh_token.is_some(),
                client_id_set = self.client_id.is_some(),
                client_secret_set = self.client_secret.is_some(),
                "Access token expired and cannot be refreshed"
            );
            return Err("access token expired; refreshing needs a refresh_token plus NBPOST_CLIENT_ID and NBPOST_CLIENT_SECRET".into());
        };

        info!(token_endpoint = %self.token_endpoint, "Refreshing access token");
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "Token refresh rejected");
            return Err(format!("token refresh failed: HTTP {status}: {body}").into());
        }
        let token: TokenResponse = response.json().await?;
        debug!(expires_in = ?token.expires_in, "Token refresh succeeded");

        Ok(CredentialStore {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(store.refresh_token),
            expires_at: token.expires_in.map(|secs| now.saturating_add(secs)),
        })
    }
}

#[async_trait]
impl SessionProvider for StoredCredentials {
    async fn session(&self) -> Result<Session, RemoteError> {
        let store = self.read_store()?;
        let now = unix_now();
        if store.is_valid_at(now) {
            info!(path = ?self.path, "Using stored access token");
            return Ok(Session::new(store.access_token));
        }

        let refreshed = self.refresh(store, now).await?;
        self.write_store(&refreshed)?;
        info!(path = ?self.path, "Stored refreshed access token");
        Ok(Session::new(refreshed.access_token))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
