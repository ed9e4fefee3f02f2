//! TermSync - reconcile the company's payment terms with the accounting system.
//!
//! Reads the reference terms from a JSON file, compares them with the terms
//! held remotely, creates the missing ones and prints the status of each term.

use clap::Parser;
use std::path::PathBuf;
use termsync_cli::config::Config;
use termsync_cli::http::HttpSession;
use termsync_cli::{reconcile_with, reference, report, telemetry};
use termsync_engine::InMemoryRemote;

/// Reconcile company payment terms with the accounting system.
#[derive(Debug, Parser)]
#[command(name = "termsync", version, about)]
struct Cli {
    /// JSON file with the reference terms (`[{"name": ..., "id": ...}]`)
    reference: PathBuf,

    /// Reconcile against an empty in-memory remote instead of the gateway
    #[arg(long)]
    dry_run: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize tracing; the guard flushes the log file on exit
    let _log_guard = telemetry::init(&config.log_dir)?;

    let terms = reference::load(&cli.reference)?;
    tracing::info!(
        count = terms.len(),
        path = %cli.reference.display(),
        "loaded reference terms"
    );

    let result = if cli.dry_run {
        tracing::info!("dry run against in-memory remote");
        reconcile_with(&InMemoryRemote::new(), &config, terms).await?
    } else {
        let session = HttpSession::new(config.require_remote_url()?, config.timeout)?;
        tracing::info!(remote = session.base_url(), "reconciling with remote");
        reconcile_with(&session, &config, terms).await?
    };

    if cli.json {
        println!("{}", report::render_json(&result)?);
    } else {
        print!("{}", report::render_text(&result));
        println!("Data Sync Completed");
    }

    Ok(())
}
