/// `load_config` module: loads the optional YAML config and injects secrets from the environment.
///
/// This is the only place where user-supplied YAML is parsed. The file holds no
/// secrets; OAuth client credentials always come from the environment.
///
/// # Responsibilities
/// - Parse the YAML file (when one is given) into [`CliConfig`], every key optional
/// - Fill `auth.client_id` / `auth.client_secret` from `NBPOST_CLIENT_ID` / `NBPOST_CLIENT_SECRET`
/// - Let `NBPOST_API_BASE` override `blogger.api_base`
///
/// # Errors
/// Failures are `anyhow::Error`s naming the file and whether it could not be read
/// or could not be parsed.
use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/blogger/v3";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_CREDENTIALS: &str = "./credentials.json";

pub const ENV_CLIENT_ID: &str = "NBPOST_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "NBPOST_CLIENT_SECRET";
pub const ENV_API_BASE: &str = "NBPOST_API_BASE";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub blogger: BloggerSection,
    pub auth: AuthSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BloggerSection {
    pub api_base: String,
}

impl Default for BloggerSection {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// JSON credential store with the access and refresh tokens.
    pub credentials: PathBuf,
    pub token_endpoint: String,
    #[serde(skip)]
    pub client_id: Option<String>,
    #[serde(skip)]
    pub client_secret: Option<String>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            credentials: PathBuf::from(DEFAULT_CREDENTIALS),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            client_id: None,
            client_secret: None,
        }
    }
}

/// Load the config file at `path` (defaults when `None`) and inject environment secrets.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let mut config = match path {
        Some(path_ref) => read_config_file(path_ref)?,
        None => {
            info!("No config file given, using defaults");
            CliConfig::default()
        }
    };

    config.auth.client_id = env::var(ENV_CLIENT_ID).ok().filter(|v| !v.is_empty());
    config.auth.client_secret = env::var(ENV_CLIENT_SECRET).ok().filter(|v| !v.is_empty());
    if let Ok(api_base) = env::var(ENV_API_BASE) {
        if !api_base.is_empty() {
            info!(api_base = %api_base, "API base overridden from environment");
            config.blogger.api_base = api_base;
        }
    }
    config.blogger.api_base = config.blogger.api_base.trim_end_matches('/').to_string();

    info!(
        api_base = %config.blogger.api_base,
        credentials = ?config.auth.credentials,
        client_id_set = config.auth.client_id.is_some(),
        client_secret_set = config.auth.client_secret.is_some(),
        "Configuration loaded"
    );
    Ok(config)
}

fn read_config_file(path_ref: &Path) -> Result<CliConfig> {
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file means "all defaults".
    if config_content.trim().is_empty() {
        return Ok(CliConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!(
                "Failed to parse config YAML {:?}: {e}",
                path_ref
            ))
        }
    }
}
