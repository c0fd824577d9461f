//! Session management — owns the outbound handle and drives the
//! link-wait / stream / teardown cycle.

mod backoff;
mod state;
pub mod streamer;

pub use backoff::Backoff;
pub use state::{SessionState, TeardownReason};
pub use streamer::{StreamExit, Streamer};

use std::time::Duration;

use camstream_core::chunk::ChunkSize;
use camstream_core::config::{OpenFailurePolicy, SendErrorPolicy, StreamerConfig};

/// The slice of configuration the streamer runs on.
#[derive(Debug, Clone)]
pub struct StreamerSettings {
    pub chunk_size: ChunkSize,
    pub cycle_interval: Duration,
    pub link_poll_interval: Duration,
    pub on_send_error: SendErrorPolicy,
    pub on_open_failure: OpenFailurePolicy,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    pub detect_link_loss: bool,
}

impl StreamerSettings {
    pub fn from_config(config: &StreamerConfig) -> Self {
        Self {
            chunk_size: config.stream.chunk_size,
            cycle_interval: config.stream.cycle_interval(),
            link_poll_interval: config.link.poll_interval(),
            on_send_error: config.stream.on_send_error,
            on_open_failure: config.session.on_open_failure,
            backoff_initial: config.session.backoff_initial(),
            backoff_max: config.session.backoff_max(),
            detect_link_loss: config.session.detect_link_loss,
        }
    }
}

impl Default for StreamerSettings {
    fn default() -> Self {
        Self::from_config(&StreamerConfig::default())
    }
}
