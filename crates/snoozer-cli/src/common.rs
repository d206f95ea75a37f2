use std::sync::Arc;

use snoozer_core::{Config, NoopAlarms, SnoozeEngine, SnoozeStore, SystemTabHost};

/// Engine for one-off commands: real tab surface, no process-local alarms.
/// Precise triggers belong to the daemon, which re-registers them from the
/// store at startup; a short-lived CLI process has nothing to arm.
pub fn open_engine() -> Result<SnoozeEngine, Box<dyn std::error::Error>> {
    let store = SnoozeStore::open()?;
    let config = Config::load_or_default();
    Ok(SnoozeEngine::new(
        store,
        Arc::new(SystemTabHost),
        Arc::new(NoopAlarms),
        &config,
    ))
}
