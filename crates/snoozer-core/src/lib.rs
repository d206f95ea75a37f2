//! # Snoozer Core Library
//!
//! This library provides the core business logic for Snoozer, a tab
//! snoozing tool: a tab is closed now and its URL reopened automatically at
//! a later time, once or on a weekly recurring schedule. It implements a
//! CLI-first philosophy where all operations are available via a standalone
//! CLI binary; any richer presentation layer is a thin shell over the same
//! core library.
//!
//! ## Architecture
//!
//! - **Clock**: pure wall-clock arithmetic ("hours until 14:00", "next
//!   Monday 09:00") over an injected now
//! - **Storage**: SQLite-backed flat key-value store for snooze records and
//!   recurring configs, plus TOML configuration
//! - **Engine**: creation, due-detection, delivery, and recurrence
//!   re-arming, driven by trigger callbacks
//! - **Triggers**: the external alarm and tab surfaces the engine calls
//!   through trait seams
//!
//! ## Key Components
//!
//! - [`SnoozeEngine`]: core scheduling and delivery state machine
//! - [`SnoozeStore`]: record and config persistence
//! - [`Config`]: application configuration management
//! - [`AlarmScheduler`] / [`TabHost`]: external collaborator traits

pub mod clock;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod presets;
pub mod record;
pub mod storage;
pub mod trigger;

pub use clock::{TimeOfDay, WeekdaySet};
pub use engine::{ScanOutcome, SnoozeEngine, HEARTBEAT_ALARM};
pub use error::{EngineError, Result, StoreError, ValidationError};
pub use presets::{smart_options, SnoozeOption};
pub use record::{
    CancelMode, CancelOutcome, RecordKey, RecurringConfig, SnoozeList, SnoozeRecord, StoredItem,
};
pub use storage::{Config, SnoozeStore};
pub use trigger::{AlarmScheduler, NoopAlarms, SystemTabHost, TabHost, TabRef, TokioAlarms};
