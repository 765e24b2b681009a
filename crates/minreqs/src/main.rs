use clap::Parser;
use minreqs::cli::{self, Cli};
use minreqs::config::ProcessEnv;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let read_stdin = async || {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        Ok::<_, std::io::Error>(input)
    };

    let mut stdout = std::io::stdout().lock();
    match cli::run(cli, &ProcessEnv, read_stdin, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("min-reqs: {e}");
            ExitCode::FAILURE
        }
    }
}
