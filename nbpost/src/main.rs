use clap::Parser;
use nbpost::cli::{run, Cli};
use nbpost_core::PublishError;
use tracing::Level;

#[tokio::main]
async fn main() {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => {
            // `run` has already reported a skipped publish on its own line.
            let skipped = matches!(
                e.downcast_ref::<PublishError>(),
                Some(PublishError::PostAlreadyExists { .. })
            );
            if skipped {
                tracing::info!("CLI exited without publishing");
            } else {
                tracing::error!(error = %e, "CLI exited with error");
                eprintln!("error: {e}");
            }
            std::process::exit(1);
        }
    }
}
