//! Configuration system for camstream.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $CAMSTREAM_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/camstream/config.toml
//!   3. ~/.config/camstream/config.toml
//!
//! Read once at startup. Nothing here is reloaded while the daemon runs.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chunk::ChunkSize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    pub destination: DestinationConfig,
    pub stream: StreamConfig,
    pub link: LinkConfig,
    pub session: SessionConfig,
    pub camera: CameraConfig,
}

/// Where frames are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Textual IPv4 address of the receiver.
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Datagram payload size in bytes.
    pub chunk_size: ChunkSize,
    /// Sleep between frames while a session is active.
    pub cycle_interval_ms: u64,
    pub on_send_error: SendErrorPolicy,
    /// SO_SNDBUF for the outbound socket. 0 = OS default.
    pub send_buffer_bytes: usize,
    /// Period of the stats log line. 0 = disabled.
    pub stats_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Interface whose operstate gates streaming. Empty = always up.
    pub interface: String,
    /// Sleep between link checks while waiting for the link.
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub on_open_failure: OpenFailurePolicy,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    /// Tear the session down when the link drops mid-stream.
    pub detect_link_loss: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub source: CameraKind,
    /// Image directory for `source = "directory"`.
    pub directory: PathBuf,
    /// Frame length for `source = "pattern"`.
    pub frame_len: usize,
    /// Frame buffers the pattern source can have out at once.
    pub fb_count: usize,
    /// Opaque format tag stamped on generated frames.
    pub format: u32,
}

/// What to do when a single datagram send fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendErrorPolicy {
    /// Count the loss and send the frame's next chunk.
    #[default]
    Continue,
    /// Count the loss and drop the rest of the frame.
    AbortFrame,
}

/// What to do when the outbound socket cannot be created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenFailurePolicy {
    /// Log and stop streaming for good.
    #[default]
    Terminate,
    /// Retry with exponential backoff.
    Backoff,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraKind {
    #[default]
    Pattern,
    Directory,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            host: "192.168.4.1".to_string(),
            port: 3333,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::default(),
            cycle_interval_ms: 10,
            on_send_error: SendErrorPolicy::Continue,
            send_buffer_bytes: 0,
            stats_interval_secs: 10,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            interface: String::new(),
            poll_interval_ms: 1000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            on_open_failure: OpenFailurePolicy::Terminate,
            backoff_initial_ms: 500,
            backoff_max_ms: 30_000,
            detect_link_loss: true,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: CameraKind::Pattern,
            directory: PathBuf::new(),
            frame_len: 20_000,
            fb_count: 2,
            format: 4,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("camstream")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("destination host {0:?} is not an IPv4 address")]
    InvalidHost(String),
    #[error("destination port must be non-zero")]
    InvalidPort,
    #[error("{0} must be greater than zero")]
    InvalidInterval(&'static str),
    #[error("camera directory {0:?} does not exist")]
    MissingDirectory(PathBuf),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl StreamerConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::file_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific file, falling back to defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("CAMSTREAM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        Self::write_default_to(&path)?;
        Ok(path)
    }

    fn write_default_to(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
        }
        let text =
            toml::to_string_pretty(&Self::default()).map_err(ConfigError::SerializeFailed)?;
        std::fs::write(path, text).map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))
    }

    /// Apply CAMSTREAM_* env var overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("CAMSTREAM_DESTINATION__HOST") {
            self.destination.host = v;
        }
        if let Some(v) = var("CAMSTREAM_DESTINATION__PORT") {
            if let Ok(p) = v.parse() {
                self.destination.port = p;
            }
        }
        if let Some(v) = var("CAMSTREAM_STREAM__CHUNK_SIZE") {
            if let Some(size) = v.parse().ok().and_then(ChunkSize::new) {
                self.stream.chunk_size = size;
            }
        }
        if let Some(v) = var("CAMSTREAM_LINK__INTERFACE") {
            self.link.interface = v;
        }
        if let Some(v) = var("CAMSTREAM_CAMERA__SOURCE") {
            match v.as_str() {
                "pattern" => self.camera.source = CameraKind::Pattern,
                "directory" => self.camera.source = CameraKind::Directory,
                _ => {}
            }
        }
        if let Some(v) = var("CAMSTREAM_CAMERA__DIRECTORY") {
            self.camera.directory = PathBuf::from(v);
        }
    }

    /// Check the values that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.destination()?;
        if self.stream.cycle_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval("stream.cycle_interval_ms"));
        }
        if self.link.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval("link.poll_interval_ms"));
        }
        if self.session.on_open_failure == OpenFailurePolicy::Backoff
            && self.session.backoff_initial_ms == 0
        {
            return Err(ConfigError::InvalidInterval("session.backoff_initial_ms"));
        }
        if self.camera.source == CameraKind::Directory && !self.camera.directory.is_dir() {
            return Err(ConfigError::MissingDirectory(self.camera.directory.clone()));
        }
        Ok(())
    }

    /// Resolve the destination address. Pure, so calling it twice is harmless.
    pub fn destination(&self) -> Result<SocketAddr, ConfigError> {
        let ip: Ipv4Addr = self
            .destination
            .host
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.destination.host.clone()))?;
        if self.destination.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        Ok(SocketAddr::V4(SocketAddrV4::new(ip, self.destination.port)))
    }
}

impl StreamConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}

impl LinkConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SessionConfig {
    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms.max(self.backoff_initial_ms))
    }
}
