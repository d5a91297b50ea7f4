// This is the entry point for the documentation hub server.
// It loads configuration from flags, the environment and an optional .env
// file, then serves the HTTP API until the process is stopped.

use std::process;
use std::sync::Arc;

use clap::Parser;
use openapi_hub::catalog::MemoryCatalog;
use openapi_hub::config::{Args, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Parse command line arguments and pick up a local .env file if present
    let args = Args::parse();
    dotenvy::dotenv().ok();

    init_tracing(args.verbose);

    if let Err(err) = run(&args).await {
        eprintln!("Error starting openapi-hub: {}", err);
        process::exit(1);
    }
}

async fn run(args: &Args) -> openapi_hub::Result<()> {
    let config = Config::load(args)?;
    let store = Arc::new(MemoryCatalog::new());
    openapi_hub::serve(&config, store).await
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "openapi_hub=debug,info"
    } else {
        "openapi_hub=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}
