//! svs-replay
//!
//! Replays a JSON vault scenario under the assertion runner and prints the
//! per-step report. Exits non-zero when any invariant is violated.

use anyhow::{Context, Result};
use svs_invariant_engine::{
    config::EngineConfig,
    scenario::{replay, Scenario},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Logs go to stderr, the report to stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "svs_invariant_engine=info,svs_replay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: svs-replay <scenario.json>")?;

    let config = EngineConfig::from_env();
    info!(
        default_lifespan = config.default_lifespan,
        decimals_offset = config.decimals_offset,
        arm_defaults = config.arm_defaults,
        stop_on_violation = config.stop_on_violation,
        "Configuration loaded"
    );

    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {path}"))?;

    let report = replay(&scenario, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let violations = report.violations().count();
    if violations > 0 {
        warn!(violations, "Scenario violated vault invariants");
        std::process::exit(1);
    }

    info!(steps = report.steps.len(), "Scenario passed");
    Ok(())
}
