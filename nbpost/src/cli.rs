/// # nbpost CLI interface
///
/// Command parsing and the async entrypoint [`run`]. All publishing logic lives in
/// [`nbpost_core`]; this module only wires configuration, the credential store and
/// the Blogger client into [`nbpost_core::publish::publish`] and reports the outcome.
///
/// ## How To Use
/// - From the shell: `nbpost post notes.ipynb https://example.blogspot.com --label physics`
/// - Programmatically (integration tests): build a [`Cli`] and await [`run`].
use crate::auth::StoredCredentials;
use crate::blogger::BloggerClient;
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use nbpost_core::document::load;
use nbpost_core::error::PublishError;
use nbpost_core::publish::{publish, PublishAction, PublishRequest};
use nbpost_core::PublishConfig;
use std::path::PathBuf;

/// Publish HTML files and notebooks to a blog.
#[derive(Parser)]
#[clap(
    name = "nbpost",
    version,
    about = "Publish an HTML file or notebook as a blog post, updating by title"
)]
pub struct Cli {
    /// Verbose logging and JSON dumps of remote payloads
    #[clap(short, long, global = true)]
    pub debug: bool,

    /// Path to an optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a draft post, or update the post with the same title
    Post {
        /// Document to publish (.html, .htm or .ipynb)
        path: PathBuf,
        /// URL of the target blog
        url: String,
        /// Post title (defaults to the file name without extension)
        #[clap(long)]
        title: Option<String>,
        /// Label to attach; repeat for several
        #[clap(short, long = "label")]
        labels: Vec<String>,
        /// Overwrite an existing post with the same title
        #[clap(long)]
        update: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;
    let publish_config = PublishConfig::with_debug(cli.debug);
    publish_config.trace_loaded();

    match cli.command {
        Commands::Post {
            path,
            url,
            title,
            labels,
            update,
        } => {
            tracing::info!(command = "post", path = ?path, blog_url = %url, update, "Starting publish");
            let document = load(&path, &publish_config)?;
            let request = PublishRequest {
                blog_url: url,
                title,
                labels,
                update_allowed: update,
            };

            let http = reqwest::Client::new();
            let sessions = StoredCredentials::new(http.clone(), &config.auth);
            let api_base = config.blogger.api_base.clone();

            let outcome = publish(&publish_config, &document, &request, &sessions, |session| {
                BloggerClient::new(http, api_base, session)
            })
            .await;

            match outcome {
                Ok(report) => {
                    tracing::info!(command = "post", action = report.action.as_str(), post_id = %report.post_id, "Publish complete");
                    match report.action {
                        PublishAction::Created => {
                            println!("Created draft post {} \"{}\"", report.post_id, report.title)
                        }
                        PublishAction::Updated => {
                            println!("Updated post {} \"{}\"", report.post_id, report.title)
                        }
                    }
                    if let Some(post_url) = &report.url {
                        println!("{post_url}");
                    }
                    Ok(())
                }
                Err(e @ PublishError::PostAlreadyExists { .. }) => {
                    tracing::warn!(command = "post", kind = e.kind(), "Publish skipped");
                    eprintln!("skipped: {e}; pass --update to overwrite");
                    Err(e.into())
                }
                Err(e) => {
                    tracing::error!(command = "post", kind = e.kind(), error = %e, "Publish failed");
                    Err(e.into())
                }
            }
        }
    }
}
