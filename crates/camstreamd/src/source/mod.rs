//! Frame source adapter — borrows frames from a camera and guarantees
//! they go back.
//!
//! A frame is handed out as a [`FrameLease`]. Dropping the lease returns
//! the frame to its source, on every path: after the last chunk, after a
//! transport fault, during shutdown. The lease borrows the adapter
//! mutably, so a second frame cannot be acquired while one is out.

pub mod directory;
pub mod pattern;

pub use directory::DirectorySource;
pub use pattern::PatternSource;

use std::ops::Deref;

use bytes::Bytes;

use camstream_core::config::{CameraConfig, CameraKind};
use camstream_core::{CameraSource, Frame};

/// Build the camera collaborator selected in config.
pub fn from_config(config: &CameraConfig) -> std::io::Result<Box<dyn CameraSource>> {
    let source: Box<dyn CameraSource> = match config.source {
        CameraKind::Pattern => Box::new(PatternSource::new(
            config.frame_len,
            config.fb_count,
            config.format,
        )),
        CameraKind::Directory => Box::new(DirectorySource::new(&config.directory, config.format)?),
    };
    Ok(source)
}

pub struct FrameSourceAdapter<S> {
    source: S,
    /// Consecutive polls that came back empty.
    misses: u64,
}

impl<S: CameraSource> FrameSourceAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source, misses: 0 }
    }

    /// Poll the camera once. `None` is recoverable: the caller skips this cycle.
    pub fn acquire_frame(&mut self) -> Option<FrameLease<'_, S>> {
        match self.source.try_get_frame() {
            Some(frame) => {
                if self.misses > 0 {
                    tracing::info!(missed = self.misses, "camera frames available again");
                    self.misses = 0;
                }
                tracing::debug!(
                    len = frame.len(),
                    format = frame.format(),
                    sequence = frame.sequence(),
                    "frame captured"
                );
                Some(FrameLease {
                    source: &mut self.source,
                    frame,
                })
            }
            None => {
                self.misses += 1;
                if self.misses == 1 {
                    tracing::warn!("camera capture failed, no frame available");
                } else {
                    tracing::trace!(misses = self.misses, "still no frame");
                }
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }
}

/// A frame on loan from a camera source.
pub struct FrameLease<'a, S: CameraSource> {
    source: &'a mut S,
    frame: Frame,
}

impl<S: CameraSource> Deref for FrameLease<'_, S> {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &self.frame
    }
}

impl<S: CameraSource> Drop for FrameLease<'_, S> {
    fn drop(&mut self) {
        // Bytes::new() does not allocate
        let frame = std::mem::replace(&mut self.frame, Frame::new(Bytes::new(), 0, 0));
        tracing::trace!(sequence = frame.sequence(), "frame released");
        self.source.release_frame(frame);
    }
}
