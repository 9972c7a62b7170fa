use clap::Parser;
use wealthcurve::cli::{self, Cli};
use wealthcurve::logging;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    logging::init_logger(args.verbose, args.json_logs);

    if let Err(e) = cli::run(args).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
