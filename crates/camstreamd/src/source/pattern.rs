//! Synthetic camera.
//!
//! Produces JPEG-framed test frames (SOI marker, deterministic body, EOI
//! marker) from a fixed pool of frame buffers, the way a camera driver
//! hands out a bounded number of framebuffers. With every buffer out,
//! `try_get_frame` returns `None` until one comes back.

use bytes::{BufMut, BytesMut};

use camstream_core::{CameraSource, Frame};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

#[derive(Debug)]
pub struct PatternSource {
    frame_len: usize,
    fb_count: usize,
    format: u32,
    next_sequence: u64,
    /// Sequence numbers currently on loan.
    outstanding: Vec<u64>,
}

impl PatternSource {
    pub fn new(frame_len: usize, fb_count: usize, format: u32) -> Self {
        Self {
            frame_len,
            fb_count: fb_count.max(1),
            format,
            next_sequence: 0,
            outstanding: Vec::new(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    fn render(&self, sequence: u64) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.frame_len);
        if self.frame_len < SOI.len() + EOI.len() {
            buf.put_bytes(sequence as u8, self.frame_len);
            return buf;
        }
        buf.put_slice(&SOI);
        let body = self.frame_len - SOI.len() - EOI.len();
        for i in 0..body {
            // stay clear of 0xFF so no stray markers appear in the body
            buf.put_u8(((sequence as usize + i) % 0xFF) as u8);
        }
        buf.put_slice(&EOI);
        buf
    }
}

impl CameraSource for PatternSource {
    fn try_get_frame(&mut self) -> Option<Frame> {
        if self.outstanding.len() >= self.fb_count {
            return None;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.outstanding.push(sequence);
        Some(Frame::new(self.render(sequence).freeze(), self.format, sequence))
    }

    fn release_frame(&mut self, frame: Frame) {
        match self.outstanding.iter().position(|&s| s == frame.sequence()) {
            Some(i) => {
                self.outstanding.swap_remove(i);
            }
            None => tracing::warn!(sequence = frame.sequence(), "released a frame this source never lent"),
        }
    }
}
