//! Session states.
//!
//! The active handle lives inside the state value, so a handle exists only
//! while the streamer is `Active` or `Teardown`, and leaving `Teardown`
//! drops it.

use std::fmt;
use std::io;

pub enum SessionState<H> {
    /// Polling the link flag. No handle.
    WaitingForLink,
    /// Streaming frames through the handle.
    Active(H),
    /// Releasing the handle.
    Teardown(H, TeardownReason),
    /// Sleeping after a failed open before trying again.
    Backoff,
    /// The handle could not be created and the policy says give up.
    Terminated(io::Error),
}

impl<H> SessionState<H> {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::WaitingForLink => "waiting_for_link",
            SessionState::Active(_) => "session_active",
            SessionState::Teardown(..) => "session_teardown",
            SessionState::Backoff => "backoff",
            SessionState::Terminated(_) => "terminated",
        }
    }
}

/// Why an active session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// A send reported the handle itself as unusable.
    HandleFault,
    /// The link flag dropped between frames.
    LinkLost,
    Shutdown,
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TeardownReason::HandleFault => "handle fault",
            TeardownReason::LinkLost => "link lost",
            TeardownReason::Shutdown => "shutdown",
        })
    }
}
