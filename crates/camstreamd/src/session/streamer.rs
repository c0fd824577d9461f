//! The streamer — one task, one handle at a time, one frame at a time.
//!
//! ```text
//!             link up, open ok
//!  WaitingForLink ─────────────▶ Active ──┐ handle fault / link lost
//!     ▲    │  │                           │
//!     │    │  └── open failed ──┐         ▼
//!     │    │    (backoff)       │      Teardown ── drop handle
//!     │    │                    ▼         │
//!     │    │                 Backoff ◀────┤ handle fault
//!     └────┴───────────────────┴──────────┘ link lost
//!          open failed (terminate) ──▶ Terminated
//! ```
//!
//! Every sleep races the shutdown signal; those sleeps and the datagram
//! sends are the only places the task yields. The backoff delay grows
//! across failed opens and faulted sessions alike, and resets once a
//! session delivers a frame.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::broadcast;

use camstream_core::config::OpenFailurePolicy;
use camstream_core::CameraSource;

use crate::chunk::transmit;
use crate::link::LinkState;
use crate::source::FrameSourceAdapter;
use crate::stats::StreamStats;
use crate::transport::Transport;

use super::{Backoff, SessionState, StreamerSettings, TeardownReason};

/// How the streamer task ended.
#[derive(Debug)]
pub enum StreamExit {
    /// Shutdown was signalled.
    Shutdown,
    /// The outbound socket could not be created and the policy is to give up.
    TransportUnavailable(io::Error),
}

pub struct Streamer<T, L, S> {
    transport: T,
    link: L,
    frames: FrameSourceAdapter<S>,
    destination: SocketAddr,
    settings: StreamerSettings,
    stats: StreamStats,
    backoff: Backoff,
    shutdown: broadcast::Receiver<()>,
}

impl<T, L, S> Streamer<T, L, S>
where
    T: Transport,
    L: LinkState,
    S: CameraSource,
{
    pub fn new(
        transport: T,
        link: L,
        source: S,
        destination: SocketAddr,
        settings: StreamerSettings,
        stats: StreamStats,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            transport,
            link,
            frames: FrameSourceAdapter::new(source),
            destination,
            backoff: Backoff::new(settings.backoff_initial, settings.backoff_max),
            settings,
            stats,
            shutdown,
        }
    }

    pub async fn run(mut self) -> StreamExit {
        tracing::info!(
            destination = %self.destination,
            chunk_size = %self.settings.chunk_size,
            on_send_error = ?self.settings.on_send_error,
            on_open_failure = ?self.settings.on_open_failure,
            "streamer starting"
        );

        let mut state = SessionState::WaitingForLink;

        loop {
            tracing::debug!(state = state.name(), "streamer state");
            state = match state {
                SessionState::WaitingForLink => {
                    if !self.wait_for_link().await {
                        return StreamExit::Shutdown;
                    }
                    match self.transport.open() {
                        Ok(handle) => {
                            self.stats.session_opened();
                            tracing::info!(destination = %self.destination, "session opened");
                            SessionState::Active(handle)
                        }
                        Err(e) => {
                            self.stats.open_failed();
                            match self.settings.on_open_failure {
                                OpenFailurePolicy::Terminate => SessionState::Terminated(e),
                                OpenFailurePolicy::Backoff => {
                                    tracing::warn!(error = %e, "unable to create socket");
                                    SessionState::Backoff
                                }
                            }
                        }
                    }
                }

                SessionState::Active(handle) => {
                    let reason = self.stream(&handle).await;
                    SessionState::Teardown(handle, reason)
                }

                SessionState::Teardown(handle, reason) => {
                    drop(handle);
                    match reason {
                        TeardownReason::Shutdown => {
                            tracing::info!("session closed for shutdown");
                            return StreamExit::Shutdown;
                        }
                        // a fresh handle may fault straight away; never reopen without a pause
                        TeardownReason::HandleFault => {
                            tracing::warn!(%reason, "session closed, reopening after delay");
                            SessionState::Backoff
                        }
                        TeardownReason::LinkLost => {
                            tracing::warn!(%reason, "session closed, restarting");
                            SessionState::WaitingForLink
                        }
                    }
                }

                SessionState::Backoff => {
                    let delay = self.backoff.next_delay();
                    tracing::info!(
                        attempt = self.backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "opening socket after delay"
                    );
                    if !self.pause(delay).await {
                        return StreamExit::Shutdown;
                    }
                    SessionState::WaitingForLink
                }

                SessionState::Terminated(e) => {
                    tracing::error!(error = %e, "unable to create socket, streamer stopping");
                    return StreamExit::TransportUnavailable(e);
                }
            };
        }
    }

    /// Block until the link is up. Returns false on shutdown.
    async fn wait_for_link(&mut self) -> bool {
        if self.link.is_up() {
            return true;
        }
        tracing::warn!("link not connected, waiting");
        let mut polls: u64 = 0;
        while !self.link.is_up() {
            if !self.pause(self.settings.link_poll_interval).await {
                return false;
            }
            polls += 1;
        }
        tracing::info!(polls, "link up");
        true
    }

    /// Stream frames through `handle` until something ends the session.
    async fn stream(&mut self, handle: &T::Handle) -> TeardownReason {
        loop {
            match self.frames.acquire_frame() {
                Some(frame) => {
                    let result = transmit(
                        handle,
                        self.destination,
                        frame.data(),
                        self.settings.chunk_size,
                        self.settings.on_send_error,
                    )
                    .await;

                    match result {
                        Ok(report) => {
                            self.backoff.reset();
                            tracing::debug!(
                                sequence = frame.sequence(),
                                len = frame.len(),
                                chunks = report.chunks_sent,
                                failed = report.chunks_failed,
                                "frame sent"
                            );
                            self.stats.record_frame(
                                report.chunks_sent as u64,
                                report.chunks_failed as u64,
                                report.bytes_sent as u64,
                                report.aborted,
                            );
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, sequence = frame.sequence(), "frame interrupted");
                            return TeardownReason::HandleFault;
                        }
                    }
                }
                None => self.stats.frame_missed(),
            }

            if !self.pause(self.settings.cycle_interval).await {
                return TeardownReason::Shutdown;
            }
            if self.settings.detect_link_loss && !self.link.is_up() {
                return TeardownReason::LinkLost;
            }
        }
    }

    /// Sleep for `duration`. Returns false if shutdown arrived first.
    async fn pause(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.recv() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
