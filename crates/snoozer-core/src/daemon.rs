//! Delivery daemon: the event loop between the trigger facility and the
//! engine.
//!
//! Fired alarms arrive on an mpsc channel and are drained one at a time, so
//! "at most one scan in flight" holds structurally; the engine's own guard
//! only matters for callers outside this loop.

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::engine::SnoozeEngine;
use crate::error::Result;

/// Run the delivery loop until the alarm channel closes.
///
/// Startup self-heals lost schedule state: the heartbeat is (re-)installed
/// if absent, every persisted record gets its one-shot trigger back, and an
/// immediate scan catches anything that came due while no daemon was
/// running.
pub async fn run(engine: &SnoozeEngine, mut fired: mpsc::UnboundedReceiver<String>) -> Result<()> {
    engine.ensure_heartbeat()?;
    let restored = engine.restore_alarms()?;
    info!(restored, "daemon started, triggers registered");
    if let Err(err) = engine.scan_and_deliver_due() {
        error!(%err, "startup scan failed; heartbeat will retry");
    }

    while let Some(name) = fired.recv().await {
        // A failed pass is never fatal: the guard is already released and
        // the next trigger re-scans the full store.
        if let Err(err) = engine.handle_alarm(&name) {
            error!(%err, alarm = %name, "scan pass failed; awaiting next trigger");
        }
    }
    info!("alarm channel closed, daemon stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HEARTBEAT_ALARM;
    use crate::record::{RecordKey, SnoozeRecord, StoredItem};
    use crate::storage::{Config, SnoozeStore};
    use crate::trigger::{NoopAlarms, TabHost, TabRef};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CountingHost {
        opened: Mutex<Vec<String>>,
    }

    impl TabHost for CountingHost {
        fn create_tab(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }

        fn close_tab(&self, _tab: &TabRef) -> Result<()> {
            Ok(())
        }
    }

    fn engine_with_due_record(host: Arc<CountingHost>) -> SnoozeEngine {
        let store = SnoozeStore::open_memory().unwrap();
        let due = chrono::Utc::now().timestamp_millis() - 5_000;
        let record = SnoozeRecord {
            key: RecordKey {
                origin: 1,
                due_at_ms: due,
            },
            url: "https://a.com".into(),
            title: String::new(),
            due_at_ms: due,
            recurring_id: None,
            processing: false,
            claimed_at_ms: None,
        };
        store
            .set(&record.key.to_string(), &StoredItem::Record(record))
            .unwrap();
        SnoozeEngine::new(store, host, Arc::new(NoopAlarms), &Config::default())
    }

    #[tokio::test]
    async fn startup_delivers_already_due_records() {
        let host = Arc::new(CountingHost::default());
        let engine = engine_with_due_record(host.clone());

        // Closed channel: the loop exits right after the startup phase.
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        run(&engine, rx).await.unwrap();

        assert_eq!(host.opened.lock().unwrap().as_slice(), &["https://a.com"]);
    }

    #[tokio::test]
    async fn heartbeat_alarm_drives_a_scan() {
        let host = Arc::new(CountingHost::default());
        let engine = engine_with_due_record(host.clone());

        // The startup scan delivers the record; the queued heartbeat scan
        // that follows must not deliver it again.
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        tx.send(HEARTBEAT_ALARM.to_string()).unwrap();
        drop(tx);
        run(&engine, rx).await.unwrap();

        // Startup scan + heartbeat scan ran; the tab opened exactly once.
        assert_eq!(host.opened.lock().unwrap().as_slice(), &["https://a.com"]);
    }
}
