//! Chunk transmission — the data plane.
//!
//! A frame goes out as consecutive datagrams of at most `chunk_size`
//! bytes, in offset order, one send at a time. There is no header: the
//! receiver sees raw frame bytes and finds frame boundaries itself.

pub mod send;

pub use send::{transmit, TransmitError, TransmitReport};
