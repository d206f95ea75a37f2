//! Snooze engine implementation.
//!
//! The engine owns creation, due-detection, delivery, and recurrence
//! re-arming. It does not own a timer: the trigger facility calls
//! [`SnoozeEngine::handle_alarm`] when a registered alarm fires, and every
//! alarm funnels into the same full-store scan.
//!
//! ## Per-record states during one scan pass
//!
//! ```text
//! PENDING (due_at > now)        -> no action
//! DUE, unclaimed                -> claim persisted -> DELIVERING
//! DELIVERING -> reopen tab
//!   success -> re-arm successor if recurring, remove record -> RETIRED
//!   failure -> claim cleared, record stays DUE for the next pass
//! DUE, claimed, lease fresh     -> skip (delivery in flight)
//! DUE, claimed, lease expired   -> treated as abandoned, re-claimed
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{local_epoch_ms, next_occurrence, now_local, TimeOfDay, WeekdaySet};
use crate::error::{EngineError, Result};
use crate::record::{
    CancelMode, CancelOutcome, RecordKey, RecurringConfig, SnoozeList, SnoozeRecord, StoredItem,
};
use crate::storage::{Config, SnoozeStore};
use crate::trigger::{AlarmScheduler, TabHost, TabRef};

/// Reserved name of the periodic heartbeat alarm. Never a record key.
pub const HEARTBEAT_ALARM: &str = "snoozer-heartbeat";

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_MIN: i64 = 60_000;

/// What a single scan invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOutcome {
    /// A full pass ran; `delivered` tabs were reopened.
    Completed { delivered: usize },
    /// Another pass was in flight; this invocation did nothing. The next
    /// periodic trigger makes up for it.
    Skipped,
}

/// Core snooze engine.
///
/// Single-threaded by design: one pass walks the store sequentially, and
/// the `scanning` slot drops (never queues) re-entrant invocations.
pub struct SnoozeEngine {
    store: SnoozeStore,
    tabs: Arc<dyn TabHost>,
    alarms: Arc<dyn AlarmScheduler>,
    /// Single-slot mutual exclusion for `scan_and_deliver_due`.
    scanning: AtomicBool,
    heartbeat_min: u32,
    lease_ms: i64,
}

impl SnoozeEngine {
    pub fn new(
        store: SnoozeStore,
        tabs: Arc<dyn TabHost>,
        alarms: Arc<dyn AlarmScheduler>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            tabs,
            alarms,
            scanning: AtomicBool::new(false),
            heartbeat_min: config.heartbeat_min,
            lease_ms: i64::from(config.processing_lease_min) * MS_PER_MIN,
        }
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Defer `tab` for `hours_from_now` fractional hours: persist a
    /// one-shot record, register its trigger, and close the tab.
    pub fn create_one_shot(&self, tab: &TabRef, hours_from_now: f64) -> Result<SnoozeRecord> {
        if !hours_from_now.is_finite() || hours_from_now <= 0.0 {
            return Err(EngineError::InvalidTarget(hours_from_now));
        }
        if tab.url.is_empty() {
            return Err(EngineError::NoActiveContext);
        }

        let now = now_ms();
        let due_at_ms = now + (hours_from_now * MS_PER_HOUR).round() as i64;
        let record = SnoozeRecord {
            key: RecordKey {
                origin: tab.id.unwrap_or(now),
                due_at_ms,
            },
            url: tab.url.clone(),
            title: tab.title.clone(),
            due_at_ms,
            recurring_id: None,
            processing: false,
            claimed_at_ms: None,
        };
        self.persist_and_arm(&record)?;
        self.close_snoozed_tab(tab);
        info!(key = %record.key, url = %record.url, "tab snoozed");
        Ok(record)
    }

    /// Set up a weekly recurring snooze for `tab`: persist the schedule
    /// config and its first cycle's record, register the trigger, close the
    /// tab. `time` is "HH:mm"; `days` are weekday numbers (0 = Sunday).
    pub fn create_recurring(&self, tab: &TabRef, time: &str, days: &[u8]) -> Result<SnoozeRecord> {
        let time: TimeOfDay = time.parse().map_err(EngineError::InvalidInput)?;
        let days = WeekdaySet::new(days)?;
        if tab.url.is_empty() {
            return Err(EngineError::NoActiveContext);
        }

        let config = RecurringConfig {
            id: RecurringConfig::new_id(),
            url: tab.url.clone(),
            title: tab.title.clone(),
            time,
            days,
        };
        self.store
            .set(&config.id, &StoredItem::Recurring(config.clone()))?;

        let due_at_ms = local_epoch_ms(next_occurrence(now_local(), config.time, &config.days));
        let record = SnoozeRecord {
            key: RecordKey {
                origin: tab.id.unwrap_or_else(now_ms),
                due_at_ms,
            },
            url: config.url.clone(),
            title: config.title.clone(),
            due_at_ms,
            recurring_id: Some(config.id.clone()),
            processing: false,
            claimed_at_ms: None,
        };
        self.persist_and_arm(&record)?;
        self.close_snoozed_tab(tab);
        info!(key = %record.key, config = %config.id, "recurring snooze set");
        Ok(record)
    }

    // ── Cancellation ─────────────────────────────────────────────────

    /// Cancel the snooze under `key` according to `mode`.
    ///
    /// Series modes also delete the RecurringConfig, so no further
    /// occurrence is ever scheduled. `RemoveSingleAndOpen` re-arms the next
    /// cycle instead, leaving the series scheduled.
    pub fn cancel(&self, key: &RecordKey, mode: CancelMode) -> Result<CancelOutcome> {
        if mode == CancelMode::Cancel {
            return Ok(CancelOutcome::default());
        }

        let key_s = key.to_string();
        let record = match self.store.get(&key_s)? {
            Some(StoredItem::Record(record)) => record,
            _ => return Err(EngineError::UnknownKey(key_s)),
        };
        if mode.requires_recurring() != record.is_recurring() {
            return Err(EngineError::BadCancelMode { mode });
        }

        self.alarms.clear(&key_s)?;
        self.store.remove(&key_s)?;
        let mut outcome = CancelOutcome {
            removed_record: true,
            ..CancelOutcome::default()
        };

        if let Some(id) = &record.recurring_id {
            if mode.removes_series() {
                self.store.remove(id)?;
                outcome.removed_config = true;
            } else if mode == CancelMode::RemoveSingleAndOpen {
                match self.store.get(id)? {
                    Some(StoredItem::Recurring(config)) => {
                        self.arm_next_cycle(&config)?;
                    }
                    _ => warn!(config = %id, "record referenced a missing recurring config"),
                }
            }
        }

        if mode.reopens() {
            self.tabs.create_tab(&record.url)?;
            outcome.reopened = true;
        }
        info!(key = %key_s, ?mode, "snooze cancelled");
        Ok(outcome)
    }

    // ── Due detection and delivery ───────────────────────────────────

    /// Walk the whole store once, delivering every due record.
    ///
    /// Re-entrant calls while a pass is running are dropped, not queued:
    /// due detection re-evaluates the full store each time, so the next
    /// periodic trigger covers anything a dropped call would have seen.
    pub fn scan_and_deliver_due(&self) -> Result<ScanOutcome> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!("scan already in progress; skipping");
            return Ok(ScanOutcome::Skipped);
        }

        let result = self.scan_pass();
        // Release the slot on every path so a failed pass cannot block
        // future scans.
        self.scanning.store(false, Ordering::Release);
        result.map(|delivered| ScanOutcome::Completed { delivered })
    }

    fn scan_pass(&self) -> Result<usize> {
        let now = now_ms();
        let items = self.store.get_all()?;
        let mut delivered = 0;

        for (key, item) in &items {
            let StoredItem::Record(record) = item else {
                continue;
            };
            if !record.is_due(now) {
                continue;
            }
            if record.processing {
                if !self.lease_expired(record, now) {
                    debug!(%key, "skipping, already processing");
                    continue;
                }
                warn!(%key, "reclaiming stale delivery claim");
            }

            // Claim before any side effect: at most one delivery attempt
            // can be in flight per record per scan.
            let mut claimed = record.clone();
            claimed.processing = true;
            claimed.claimed_at_ms = Some(now);
            self.store.set(key, &StoredItem::Record(claimed))?;

            match self.tabs.create_tab(&record.url) {
                Ok(()) => {
                    info!(%key, url = %record.url, "reopened snoozed tab");
                    if let Some(id) = &record.recurring_id {
                        match self.store.get(id)? {
                            Some(StoredItem::Recurring(config)) => {
                                self.arm_next_cycle(&config)?;
                            }
                            _ => warn!(config = %id, "record referenced a missing recurring config"),
                        }
                    }
                    self.store.remove(key)?;
                    delivered += 1;
                }
                Err(err) => {
                    // Leave the record due; the next heartbeat retries.
                    warn!(%key, %err, "failed to reopen tab, will retry");
                    let mut released = record.clone();
                    released.processing = false;
                    released.claimed_at_ms = None;
                    self.store.set(key, &StoredItem::Record(released))?;
                }
            }
        }
        Ok(delivered)
    }

    fn lease_expired(&self, record: &SnoozeRecord, now: i64) -> bool {
        match record.claimed_at_ms {
            Some(claimed_at) => now.saturating_sub(claimed_at) >= self.lease_ms,
            // A processing flag with no claim timestamp predates the lease
            // scheme; recover it rather than leave it stuck forever.
            None => true,
        }
    }

    /// Compute the series' next occurrence, persist its record under a new
    /// key, and register its trigger.
    fn arm_next_cycle(&self, config: &RecurringConfig) -> Result<SnoozeRecord> {
        let due_at_ms = local_epoch_ms(next_occurrence(now_local(), config.time, &config.days));
        let record = SnoozeRecord {
            key: RecordKey {
                origin: now_ms(),
                due_at_ms,
            },
            url: config.url.clone(),
            title: config.title.clone(),
            due_at_ms,
            recurring_id: Some(config.id.clone()),
            processing: false,
            claimed_at_ms: None,
        };
        self.persist_and_arm(&record)?;
        debug!(config = %config.id, key = %record.key, "scheduled next recurring cycle");
        Ok(record)
    }

    fn persist_and_arm(&self, record: &SnoozeRecord) -> Result<()> {
        let key = record.key.to_string();
        self.store.set(&key, &StoredItem::Record(record.clone()))?;
        self.alarms.set_oneshot(&key, record.due_at_ms)?;
        Ok(())
    }

    fn close_snoozed_tab(&self, tab: &TabRef) {
        // Fire-and-forget: a tab that would not close is not worth failing
        // the snooze for.
        if let Err(err) = self.tabs.close_tab(tab) {
            warn!(url = %tab.url, %err, "could not close snoozed tab");
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// All snoozes partitioned for display, each side ascending by due
    /// instant. Read-only.
    pub fn list(&self) -> Result<SnoozeList> {
        let mut list = SnoozeList::default();
        for (_, item) in self.store.get_all()? {
            match item {
                StoredItem::Record(record) if record.is_recurring() => {
                    list.recurring.push(record);
                }
                StoredItem::Record(record) => list.one_shot.push(record),
                StoredItem::Recurring(config) => list.configs.push(config),
            }
        }
        list.one_shot.sort_by_key(|r| r.due_at_ms);
        list.recurring.sort_by_key(|r| r.due_at_ms);
        Ok(list)
    }

    // ── Triggers ─────────────────────────────────────────────────────

    /// Install the periodic heartbeat if it is not already registered.
    pub fn ensure_heartbeat(&self) -> Result<()> {
        let exists = self.alarms.names()?.iter().any(|n| n == HEARTBEAT_ALARM);
        if !exists {
            self.alarms.set_periodic(HEARTBEAT_ALARM, self.heartbeat_min)?;
            info!(every_min = self.heartbeat_min, "heartbeat alarm installed");
        }
        Ok(())
    }

    /// Re-register one-shot triggers for every persisted record. Run at
    /// daemon startup, where process-local alarms from earlier runs are
    /// gone. Past-due records get an immediate trigger.
    pub fn restore_alarms(&self) -> Result<usize> {
        let now = now_ms();
        let mut restored = 0;
        for (key, item) in self.store.get_all()? {
            if let StoredItem::Record(record) = item {
                self.alarms.set_oneshot(&key, record.due_at_ms.max(now))?;
                restored += 1;
            }
        }
        Ok(restored)
    }

    /// Trigger callback. The heartbeat and every record alarm funnel into
    /// the same full-store scan.
    pub fn handle_alarm(&self, name: &str) -> Result<ScanOutcome> {
        if name == HEARTBEAT_ALARM {
            debug!("heartbeat: scanning for due tabs");
        } else {
            debug!(alarm = name, "snooze alarm fired");
        }
        self.scan_and_deliver_due()
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
