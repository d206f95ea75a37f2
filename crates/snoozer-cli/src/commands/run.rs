use std::sync::Arc;

use clap::Args;
use snoozer_core::{daemon, Config, SnoozeEngine, SnoozeStore, SystemTabHost, TokioAlarms};
use tracing_subscriber::EnvFilter;

#[derive(Args)]
pub struct RunArgs {
    /// Log filter, e.g. "info" or "snoozer_core=debug"
    #[arg(long, default_value = "info")]
    pub log: String,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log)?)
        .init();

    // Single-threaded by design: the daemon drains alarms sequentially, so
    // one scan is ever in flight.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(async {
        let (alarms, fired) = TokioAlarms::new();
        let store = SnoozeStore::open()?;
        let config = Config::load_or_default();
        let engine = SnoozeEngine::new(
            store,
            Arc::new(SystemTabHost),
            Arc::new(alarms),
            &config,
        );
        daemon::run(&engine, fired).await?;
        Ok(())
    })
}
