//! Outbound datagram transport.
//!
//! A [`Transport`] opens handles; a handle sends datagrams until it is
//! dropped. Dropping is the only way to close one, so a handle cannot
//! outlive the session that opened it.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Factory for outbound handles.
pub trait Transport: Send + Sync {
    type Handle: DatagramHandle;

    /// Create a fresh, unbound handle.
    fn open(&self) -> io::Result<Self::Handle>;
}

/// A live connectionless endpoint.
pub trait DatagramHandle: Send + Sync {
    /// Send one datagram carrying exactly `buf`.
    fn send_to(
        &self,
        buf: &[u8],
        dest: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send;
}

/// Whether a send error means the handle itself is unusable, as opposed to
/// a transient loss (no route, buffer full, ICMP noise).
pub fn is_handle_fault(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::EBADF | libc::ENOTSOCK | libc::ENOTCONN | libc::EPIPE)
    )
}

/// IPv4 UDP transport.
#[derive(Debug, Clone, Default)]
pub struct UdpTransport {
    /// SO_SNDBUF to request. 0 = leave the OS default.
    send_buffer_bytes: usize,
}

impl UdpTransport {
    pub fn new(send_buffer_bytes: usize) -> Self {
        Self { send_buffer_bytes }
    }
}

impl Transport for UdpTransport {
    type Handle = UdpHandle;

    fn open(&self) -> io::Result<UdpHandle> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        if self.send_buffer_bytes > 0 {
            if let Err(e) = socket.set_send_buffer_size(self.send_buffer_bytes) {
                tracing::warn!(error = %e, bytes = self.send_buffer_bytes, "SO_SNDBUF not applied");
            }
        }
        socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(socket.into())?;
        Ok(UdpHandle { socket })
    }
}

/// One UDP socket. Not bound until the first send; the kernel picks the port.
#[derive(Debug)]
pub struct UdpHandle {
    socket: UdpSocket,
}

impl DatagramHandle for UdpHandle {
    async fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, dest).await
    }
}
