//! camstream integration test harness.
//!
//! Tests here run the real streamer with the real UDP transport against a
//! receiver socket on 127.0.0.1. No root or network setup is needed.
//!
//!   cargo test --test integration
//!
//! Each test owns its receiver socket and its streamer task; nothing is
//! shared between tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use camstream_core::{CameraSource, ChunkSize, Frame};
use camstreamd::link::LinkFlag;
use camstreamd::session::{StreamExit, Streamer, StreamerSettings};
use camstreamd::stats::StreamStats;
use camstreamd::transport::UdpTransport;

mod link;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Largest datagram the receiver will accept.
pub const RECV_BUFFER: usize = 65_536;

/// Bind a receiver on an ephemeral loopback port.
pub async fn bind_receiver() -> Result<(UdpSocket, SocketAddr)> {
    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .context("failed to bind receiver")?;
    let addr = socket.local_addr()?;
    Ok((socket, addr))
}

/// Receive `count` datagrams, failing if any takes longer than `timeout`.
pub async fn recv_datagrams(
    socket: &UdpSocket,
    count: usize,
    timeout: Duration,
) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::with_capacity(count);
    let mut buf = vec![0u8; RECV_BUFFER];
    for i in 0..count {
        let (n, _) = tokio::time::timeout(timeout, socket.recv_from(&mut buf))
            .await
            .with_context(|| format!("timed out waiting for datagram {i}"))??;
        out.push(buf[..n].to_vec());
    }
    Ok(out)
}

/// Assert nothing arrives for `quiet`.
pub async fn expect_silence(socket: &UdpSocket, quiet: Duration) -> Result<()> {
    let mut buf = vec![0u8; RECV_BUFFER];
    match tokio::time::timeout(quiet, socket.recv_from(&mut buf)).await {
        Err(_) => Ok(()),
        Ok(r) => {
            let (n, from) = r?;
            bail!("unexpected {n}-byte datagram from {from}")
        }
    }
}

/// Camera that serves a fixed list of frames once, then nothing.
#[derive(Default)]
pub struct ListCamera {
    frames: Vec<Bytes>,
    next: usize,
}

impl ListCamera {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        Self {
            frames: frames.into_iter().map(Bytes::from).collect(),
            ..Self::default()
        }
    }
}

impl CameraSource for ListCamera {
    fn try_get_frame(&mut self) -> Option<Frame> {
        let data = self.frames.get(self.next)?.clone();
        let sequence = self.next as u64;
        self.next += 1;
        Some(Frame::new(data, 4, sequence))
    }

    fn release_frame(&mut self, frame: Frame) {
        drop(frame);
    }
}

pub fn fast_settings(chunk_size: usize) -> StreamerSettings {
    StreamerSettings {
        chunk_size: ChunkSize::new(chunk_size).expect("valid chunk size"),
        cycle_interval: Duration::from_millis(2),
        link_poll_interval: Duration::from_millis(2),
        ..StreamerSettings::default()
    }
}

/// A running streamer and the means to stop it.
pub struct Running {
    pub shutdown: broadcast::Sender<()>,
    pub stats: StreamStats,
    pub task: JoinHandle<StreamExit>,
}

pub fn spawn_streamer<S: CameraSource + 'static>(
    camera: S,
    link: LinkFlag,
    destination: SocketAddr,
    settings: StreamerSettings,
) -> Running {
    let (shutdown, rx) = broadcast::channel(1);
    let stats = StreamStats::new();
    let streamer = Streamer::new(
        UdpTransport::new(0),
        link,
        camera,
        destination,
        settings,
        stats.clone(),
        rx,
    );
    Running {
        shutdown,
        stats,
        task: tokio::spawn(streamer.run()),
    }
}

impl Running {
    pub async fn stop(self) -> Result<StreamExit> {
        let _ = self.shutdown.send(());
        let exit = tokio::time::timeout(Duration::from_secs(2), self.task)
            .await
            .context("streamer did not stop after shutdown")??;
        Ok(exit)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_receiver_binds_loopback() {
    let (_socket, addr) = bind_receiver().await.expect("bind should succeed");
    assert!(addr.ip().is_loopback());
    assert_ne!(addr.port(), 0);
}
