mod cli;
mod export;
mod query;
mod search;
mod serp;
mod text;

pub const USER_AGENT: &str = concat!("serpx/", env!("CARGO_PKG_VERSION"));

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use search::CancelToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_directive())),
        )
        .init();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, keeping results fetched so far");
            on_interrupt.cancel("interrupted");
        }
    });

    match cli::run(cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
