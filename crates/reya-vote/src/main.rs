// Reya governance vote runner entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr)
// 2. Load config
// 3. Load accounts
// 4. Build the HTTP connector and the signing builder
// 5. Run the batch and wait for every account
//
// Errors are logged; the exit status is always 0.

use std::path::Path;

use anyhow::Context;
use tracing::{debug, error, info};

use reya_vote::accounts;
use reya_vote::api::client::HttpConnector;
use reya_vote::config;
use reya_vote::runner::BatchRunner;
use reya_vote::signing::SignedMessageBuilder;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("failed to initialize logging: {e:#}");
    }

    if let Err(e) = run().await {
        error!("{e:#}");
    }
}

async fn run() -> anyhow::Result<()> {
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: api={}, proposal={}",
        config.api.base_url, config.api.proposal
    );

    let accounts = accounts::load_accounts(Path::new(&config.accounts.path))
        .context("failed to load accounts")?;
    info!("Total wallets: {}", accounts.len());

    let connector = HttpConnector::from_config(&config);
    let builder = SignedMessageBuilder::from_config(&config.vote);
    debug!("EIP-712 domain separator: {}", builder.domain().separator());
    let runner = BatchRunner::new(connector, builder, config.batch.concurrency);
    info!("Voting with up to {} accounts at once", runner.concurrency());

    let report = runner.run(accounts).await;

    info!("The work completed ({} accounts processed)", report.len());
    Ok(())
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reya_vote=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
