//! camstream-core — frame and chunk types plus configuration.
//! The daemon and the integration tests depend on this crate; it has no
//! async runtime and touches no sockets.

pub mod chunk;
pub mod config;
pub mod frame;

pub use chunk::{chunk_count, chunk_ranges, ChunkRanges, ChunkSize};
pub use frame::{CameraSource, Frame};
