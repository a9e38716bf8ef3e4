// ABOUTME: Entry point for the boot daemon.
// ABOUTME: Parses arguments, sets up logging and runs until interrupted.

mod cli;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Usage errors are startup failures too: exit 1, not clap's 2
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    // RUST_LOG takes precedence over the verbose flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = boot::daemon::run(cli.config()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
