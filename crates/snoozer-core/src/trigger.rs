//! External collaborator seams: the trigger facility and the tab surface.
//!
//! The engine never talks to a timer or a browser directly; it goes through
//! [`AlarmScheduler`] and [`TabHost`]. The implementations here cover the
//! daemon case (tokio timers, system URL opener); tests plug in recording
//! fakes, and a richer host (a browser-extension bridge) would slot in the
//! same way.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{EngineError, Result};

/// Identity of a tab as the presentation layer knows it.
#[derive(Debug, Clone, Default)]
pub struct TabRef {
    /// Host-assigned tab id, when one exists.
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
}

/// The tab/window action surface. The engine calls it, never implements it.
pub trait TabHost {
    /// The tab the user is currently looking at, when the host can tell.
    fn active_tab(&self) -> Option<TabRef> {
        None
    }

    /// Open `url` in a new tab.
    fn create_tab(&self, url: &str) -> Result<()>;

    /// Close the given tab.
    fn close_tab(&self, tab: &TabRef) -> Result<()>;
}

/// Named trigger registration: one-shots at an absolute instant, plus a
/// periodic heartbeat. Fired alarm names come back to the engine through
/// whatever channel the implementation owns.
pub trait AlarmScheduler {
    fn set_oneshot(&self, name: &str, at_ms: i64) -> Result<()>;
    fn set_periodic(&self, name: &str, every_min: u32) -> Result<()>;
    fn clear(&self, name: &str) -> Result<()>;
    /// Names of currently registered alarms (used to avoid duplicate
    /// heartbeat registration).
    fn names(&self) -> Result<Vec<String>>;
}

/// Tokio-backed alarms for the daemon: each registration spawns a timer
/// task that pushes its name into an mpsc channel when it fires. The daemon
/// drains that channel sequentially.
pub struct TokioAlarms {
    fired: mpsc::UnboundedSender<String>,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioAlarms {
    /// Create the scheduler and the receiving end of its fired-alarm queue.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (fired, rx) = mpsc::unbounded_channel();
        (
            Self {
                fired,
                tasks: Mutex::new(HashMap::new()),
            },
            rx,
        )
    }

    fn tasks(&self, name: &str) -> Result<MutexGuard<'_, HashMap<String, JoinHandle<()>>>> {
        self.tasks.lock().map_err(|_| EngineError::Alarm {
            name: name.to_string(),
            message: "scheduler task table poisoned".to_string(),
        })
    }

    fn install(&self, name: &str, handle: JoinHandle<()>) -> Result<()> {
        let mut tasks = self.tasks(name)?;
        if let Some(old) = tasks.insert(name.to_string(), handle) {
            old.abort();
        }
        Ok(())
    }
}

impl AlarmScheduler for TokioAlarms {
    fn set_oneshot(&self, name: &str, at_ms: i64) -> Result<()> {
        let delay_ms = at_ms.saturating_sub(Utc::now().timestamp_millis()).max(0) as u64;
        let fired = self.fired.clone();
        let alarm = name.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let _ = fired.send(alarm);
        });
        self.install(name, handle)
    }

    fn set_periodic(&self, name: &str, every_min: u32) -> Result<()> {
        let period = Duration::from_secs(u64::from(every_min) * 60);
        let fired = self.fired.clone();
        let alarm = name.to_string();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if fired.send(alarm.clone()).is_err() {
                    break;
                }
            }
        });
        self.install(name, handle)
    }

    fn clear(&self, name: &str) -> Result<()> {
        if let Some(handle) = self.tasks(name)?.remove(name) {
            handle.abort();
        }
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self
            .tasks("")?
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect())
    }
}

/// No-op scheduler for one-off CLI invocations: the process exits right
/// after the command, so precise triggers would die with it. Records still
/// land in the store, and the daemon picks them up via its heartbeat and
/// startup re-registration.
pub struct NoopAlarms;

impl AlarmScheduler for NoopAlarms {
    fn set_oneshot(&self, _name: &str, _at_ms: i64) -> Result<()> {
        Ok(())
    }

    fn set_periodic(&self, _name: &str, _every_min: u32) -> Result<()> {
        Ok(())
    }

    fn clear(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Tab surface backed by the desktop: reopening a tab means opening the URL
/// with the system default browser.
pub struct SystemTabHost;

impl TabHost for SystemTabHost {
    fn create_tab(&self, url: &str) -> Result<()> {
        open::that(url).map_err(|e| EngineError::Delivery {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn close_tab(&self, tab: &TabRef) -> Result<()> {
        // A desktop process has no handle on browser tabs; the snoozing
        // surface that owns the tab is expected to close it.
        debug!(url = %tab.url, "close-tab requested; not reachable from this host");
        Ok(())
    }
}
