//! ytgrab - channel video and comment-thread extraction.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytgrab::cli;
use ytgrab::errors::{exit_codes, ScrapeError};
use ytgrab::utils::progress::print_error;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "ytgrab=info"
    } else {
        "ytgrab=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&format!("Failed: {err:#}"));
            let code = err
                .downcast_ref::<ScrapeError>()
                .map(ScrapeError::exit_code)
                .unwrap_or(exit_codes::INTERNAL);
            ExitCode::from(code as u8)
        }
    }
}
