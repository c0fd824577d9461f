//! camstreamd — camera frame streamer.
//!
//! One long-lived task pulls frames from a camera source and sends each one,
//! split into fixed-size UDP datagrams, to a single receiver. There are no
//! acknowledgements and no retransmission; a lost datagram is a gap in the
//! receiver's picture.

pub mod chunk;
pub mod link;
pub mod session;
pub mod source;
pub mod stats;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
