//! Frames and the camera collaborator contract.

use bytes::Bytes;

/// One complete compressed image, owned by whoever holds it.
///
/// The payload is immutable for the lifetime of the frame. `format` is an
/// opaque tag from the camera (pixel format / encoder id) used only in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
    format: u32,
    sequence: u64,
}

impl Frame {
    pub fn new(data: Bytes, format: u32, sequence: u64) -> Self {
        Self {
            data,
            format,
            sequence,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn format(&self) -> u32 {
        self.format
    }

    /// Per-source sequence number, starting at 0.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// A frame producer — a camera driver, a file replayer, a test double.
///
/// Every frame returned by [`try_get_frame`](Self::try_get_frame) must be
/// handed back through [`release_frame`](Self::release_frame) exactly once.
/// Sources that pool buffers rely on this to recycle them.
pub trait CameraSource: Send {
    /// Next available frame, or `None` if nothing is ready right now.
    fn try_get_frame(&mut self) -> Option<Frame>;

    /// Return ownership of a frame previously obtained from this source.
    fn release_frame(&mut self, frame: Frame);
}

impl<S: CameraSource + ?Sized> CameraSource for Box<S> {
    fn try_get_frame(&mut self) -> Option<Frame> {
        (**self).try_get_frame()
    }

    fn release_frame(&mut self, frame: Frame) {
        (**self).release_frame(frame)
    }
}
