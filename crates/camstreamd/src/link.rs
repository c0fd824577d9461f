//! Connectivity gate.
//!
//! The link flag is owned by whoever manages the network interface; the
//! streamer only reads it. Reads are relaxed snapshots: a flip may be seen
//! one poll late, which costs at most one extra sleep or one lost frame.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

/// Read side of the connectivity flag.
pub trait LinkState: Send + Sync {
    fn is_up(&self) -> bool;
}

/// Shared boolean link flag.
#[derive(Debug, Clone)]
pub struct LinkFlag(Arc<AtomicBool>);

impl LinkFlag {
    pub fn new(up: bool) -> Self {
        Self(Arc::new(AtomicBool::new(up)))
    }

    pub fn set(&self, up: bool) {
        self.0.store(up, Ordering::Relaxed);
    }
}

impl LinkState for LinkFlag {
    fn is_up(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Interface operstate as reported by sysfs.
pub fn operstate_path(interface: &str) -> PathBuf {
    PathBuf::from("/sys/class/net").join(interface).join("operstate")
}

/// `up` and `unknown` both count as usable. Loopback and many tun devices
/// report `unknown` while passing traffic fine.
fn operstate_is_up(state: &str) -> bool {
    matches!(state.trim(), "up" | "unknown")
}

/// Keep `flag` in sync with the operstate of `interface`.
///
/// Runs until shutdown. A missing interface reads as down.
pub async fn monitor_loop(
    flag: LinkFlag,
    interface: String,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let path = operstate_path(&interface);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(interface, interval_ms = interval.as_millis() as u64, "link monitor starting");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("link monitor shutting down");
                return;
            }

            _ = ticker.tick() => {
                let up = match tokio::fs::read_to_string(&path).await {
                    Ok(state) => operstate_is_up(&state),
                    Err(e) => {
                        tracing::trace!(error = %e, path = %path.display(), "operstate unreadable");
                        false
                    }
                };
                if up != flag.is_up() {
                    tracing::info!(interface, up, "link state changed");
                    flag.set(up);
                }
            }
        }
    }
}
