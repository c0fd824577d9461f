//! Test doubles: a recording transport with fault injection and a
//! scripted camera. Both are cheap clones over shared state so a test can
//! keep a copy after handing one to the streamer.

use std::collections::{HashSet, VecDeque};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use camstream_core::{CameraSource, Frame};

use crate::link::LinkFlag;
use crate::transport::{DatagramHandle, Transport};

#[derive(Default)]
struct TransportState {
    sent: Vec<(Vec<u8>, SocketAddr)>,
    send_attempts: usize,
    fail_at: HashSet<usize>,
    kill_at: Option<usize>,
    born_dead: bool,
    link_down_at: Option<(usize, LinkFlag)>,
    open_attempts: usize,
    opens_to_fail: usize,
    live: usize,
    max_live: usize,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TransportState> {
        self.state.lock().unwrap()
    }

    /// Send attempts with these (zero-based, global) indices fail transiently.
    pub fn fail_sends_at(&self, indices: &[usize]) {
        self.lock().fail_at.extend(indices.iter().copied());
    }

    /// Send attempt `index` reports EBADF and kills the handle that made it.
    pub fn kill_handles_at(&self, index: usize) {
        self.lock().kill_at = Some(index);
    }

    /// Every handle opened from now on reports EBADF on its first send.
    pub fn kill_all_handles(&self) {
        self.lock().born_dead = true;
    }

    /// Clear `flag` once `count` sends have been attempted.
    pub fn drop_link_after(&self, count: usize, flag: LinkFlag) {
        self.lock().link_down_at = Some((count, flag));
    }

    /// The next `n` opens fail. `usize::MAX` = every open fails.
    pub fn fail_opens(&self, n: usize) {
        self.lock().opens_to_fail = n;
    }

    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.lock().sent.clone()
    }

    pub fn sent_bytes(&self) -> Vec<Vec<u8>> {
        self.lock().sent.iter().map(|(b, _)| b.clone()).collect()
    }

    pub fn sent_lengths(&self) -> Vec<usize> {
        self.lock().sent.iter().map(|(b, _)| b.len()).collect()
    }

    pub fn send_attempts(&self) -> usize {
        self.lock().send_attempts
    }

    pub fn open_attempts(&self) -> usize {
        self.lock().open_attempts
    }

    pub fn live_handles(&self) -> usize {
        self.lock().live
    }

    pub fn max_live_handles(&self) -> usize {
        self.lock().max_live
    }
}

impl Transport for MockTransport {
    type Handle = MockHandle;

    fn open(&self) -> io::Result<MockHandle> {
        let mut s = self.lock();
        s.open_attempts += 1;
        if s.opens_to_fail > 0 {
            if s.opens_to_fail != usize::MAX {
                s.opens_to_fail -= 1;
            }
            return Err(io::Error::from_raw_os_error(libc::EMFILE));
        }
        s.live += 1;
        s.max_live = s.max_live.max(s.live);
        Ok(MockHandle {
            state: self.state.clone(),
            dead: AtomicBool::new(s.born_dead),
        })
    }
}

pub struct MockHandle {
    state: Arc<Mutex<TransportState>>,
    dead: AtomicBool,
}

impl DatagramHandle for MockHandle {
    async fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        let result = {
            let mut s = self.state.lock().unwrap();
            let index = s.send_attempts;
            s.send_attempts += 1;
            if let Some((count, flag)) = &s.link_down_at {
                if s.send_attempts >= *count {
                    flag.set(false);
                }
            }

            if s.kill_at == Some(index) {
                self.dead.store(true, Ordering::Relaxed);
            }
            if self.dead.load(Ordering::Relaxed) {
                Err(io::Error::from_raw_os_error(libc::EBADF))
            } else if s.fail_at.contains(&index) {
                Err(io::Error::from_raw_os_error(libc::ENOBUFS))
            } else {
                s.sent.push((buf.to_vec(), dest));
                Ok(buf.len())
            }
        };
        tokio::task::yield_now().await;
        result
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if let Ok(mut s) = self.state.lock() {
            s.live -= 1;
        }
    }
}

#[derive(Default)]
struct CameraState {
    script: VecDeque<Option<Vec<u8>>>,
    repeat: Option<Vec<u8>>,
    next_sequence: u64,
    acquired: Vec<u64>,
    released: Vec<u64>,
}

/// Camera that plays back a fixed script, then optionally repeats one frame
/// forever.
#[derive(Clone, Default)]
pub struct ScriptedCamera {
    state: Arc<Mutex<CameraState>>,
}

impl ScriptedCamera {
    pub fn new(script: Vec<Option<Vec<u8>>>) -> Self {
        let camera = Self::default();
        camera.state.lock().unwrap().script = script.into();
        camera
    }

    pub fn repeating(frame: Vec<u8>) -> Self {
        let camera = Self::default();
        camera.state.lock().unwrap().repeat = Some(frame);
        camera
    }

    pub fn acquired(&self) -> Vec<u64> {
        self.state.lock().unwrap().acquired.clone()
    }

    pub fn released(&self) -> Vec<u64> {
        self.state.lock().unwrap().released.clone()
    }

    pub fn outstanding(&self) -> usize {
        let s = self.state.lock().unwrap();
        s.acquired.len() - s.released.len()
    }
}

impl CameraSource for ScriptedCamera {
    fn try_get_frame(&mut self) -> Option<Frame> {
        let mut s = self.state.lock().unwrap();
        let next = match s.script.pop_front() {
            Some(entry) => entry,
            None => s.repeat.clone(),
        }?;
        let sequence = s.next_sequence;
        s.next_sequence += 1;
        s.acquired.push(sequence);
        Some(Frame::new(Bytes::from(next), 0, sequence))
    }

    fn release_frame(&mut self, frame: Frame) {
        self.state.lock().unwrap().released.push(frame.sequence());
    }
}
