//! Replays image files from a directory as camera frames.
//!
//! Files ending in `.jpg` / `.jpeg` are served in name order, then the
//! directory is rescanned and playback wraps around. A file that cannot be
//! read is skipped.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use camstream_core::{CameraSource, Frame};

#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    format: u32,
    files: Vec<PathBuf>,
    cursor: usize,
    next_sequence: u64,
}

impl DirectorySource {
    pub fn new(dir: &Path, format: u32) -> io::Result<Self> {
        let files = scan(dir)?;
        tracing::info!(dir = %dir.display(), files = files.len(), "directory camera ready");
        Ok(Self {
            dir: dir.to_path_buf(),
            format,
            files,
            cursor: 0,
            next_sequence: 0,
        })
    }

    fn rescan(&mut self) {
        match scan(&self.dir) {
            Ok(files) => self.files = files,
            Err(e) => tracing::warn!(error = %e, dir = %self.dir.display(), "rescan failed"),
        }
        self.cursor = 0;
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

fn scan(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

impl CameraSource for DirectorySource {
    fn try_get_frame(&mut self) -> Option<Frame> {
        if self.cursor >= self.files.len() {
            self.rescan();
        }
        // at most one pass over the list per poll; a rescan may shrink it
        let attempts = self.files.len();
        for _ in 0..attempts {
            if self.cursor >= self.files.len() {
                self.rescan();
            }
            let path = self.files.get(self.cursor)?;
            self.cursor += 1;
            match std::fs::read(path) {
                Ok(data) => {
                    let sequence = self.next_sequence;
                    self.next_sequence += 1;
                    return Some(Frame::new(Bytes::from(data), self.format, sequence));
                }
                Err(e) => tracing::warn!(error = %e, path = %path.display(), "skipping unreadable frame"),
            }
        }
        None
    }

    fn release_frame(&mut self, frame: Frame) {
        drop(frame);
    }
}
