//! Tenure scenario runner
//!
//! Replays a JSON scenario against an in-memory lender pool and prints one
//! JSON line per step. Pool settings come from the usual config layers and
//! may be overridden by the scenario itself.

mod scenario;

use anyhow::{Context, Result};
use tenure_common::VERSION;
use tenure_ledger::LedgerConfig;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::scenario::{Runner, Scenario};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Tenure scenario runner v{}", VERSION);

    let path = std::env::args()
        .nth(1)
        .context("usage: tenure-cli <scenario.json>")?;
    let input = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read scenario {}", path))?;
    let scenario = Scenario::from_json(&input)?;

    let config = LedgerConfig::load()?;
    debug!(?config, "Loaded configuration");

    let runner = Runner::new(config, &scenario)?;

    // Log every committed ledger change until the pool goes away
    let mut events = runner.pool.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(?event, "Ledger event"),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Event listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!(steps = scenario.steps.len(), "Running scenario {}", path);
    let mut failed = 0usize;
    for (i, step) in scenario.steps.iter().enumerate() {
        let mut outcome = runner.run_step(step).await;
        if outcome["ok"] != true {
            failed += 1;
        }
        outcome["step"] = i.into();
        println!("{}", serde_json::to_string(&outcome)?);
    }

    drop(runner);
    listener.await.context("event listener panicked")?;

    info!(failed, "Scenario complete");
    Ok(())
}
