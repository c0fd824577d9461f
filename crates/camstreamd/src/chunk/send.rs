//! Chunk sending — split, transmit, account.

use std::io;
use std::net::SocketAddr;

use camstream_core::chunk::{chunk_ranges, ChunkSize};
use camstream_core::config::SendErrorPolicy;

use crate::transport::{is_handle_fault, DatagramHandle};

/// Outcome of sending one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitReport {
    pub chunks_sent: usize,
    pub chunks_failed: usize,
    pub bytes_sent: usize,
    /// The rest of the frame was skipped after a failed send.
    pub aborted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    /// The handle is dead; the session has to be rebuilt.
    #[error("transport handle unusable after {chunks_sent} chunks: {source}")]
    HandleFault {
        chunks_sent: usize,
        #[source]
        source: io::Error,
    },
}

/// Send `data` to `dest` as datagrams of at most `chunk_size` bytes.
///
/// Sends are sequential and never retried. A failed send is counted and
/// then handled per `policy`; only an error that kills the handle itself
/// ends the call early with [`TransmitError::HandleFault`].
pub async fn transmit<H: DatagramHandle>(
    handle: &H,
    dest: SocketAddr,
    data: &[u8],
    chunk_size: ChunkSize,
    policy: SendErrorPolicy,
) -> Result<TransmitReport, TransmitError> {
    let mut report = TransmitReport::default();

    for (index, range) in chunk_ranges(data.len(), chunk_size).enumerate() {
        let chunk = &data[range.clone()];
        match handle.send_to(chunk, dest).await {
            Ok(n) => {
                report.chunks_sent += 1;
                report.bytes_sent += n;
                tracing::trace!(index, offset = range.start, len = n, "chunk sent");
            }
            Err(e) if is_handle_fault(&e) => {
                return Err(TransmitError::HandleFault {
                    chunks_sent: report.chunks_sent,
                    source: e,
                });
            }
            Err(e) => {
                report.chunks_failed += 1;
                tracing::warn!(error = %e, index, offset = range.start, %dest, "chunk send failed");
                if policy == SendErrorPolicy::AbortFrame {
                    report.aborted = true;
                    break;
                }
            }
        }
    }

    Ok(report)
}
