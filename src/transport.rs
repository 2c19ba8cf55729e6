use bytes::BytesMut;
use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Transport scheme tag, used to pick the default request port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Default port implied by the scheme when the `Host` header carries none.
    #[inline]
    pub const fn default_port(self) -> u16 {
        match self {
            Scheme::Https => 443,
            Scheme::Http => 80,
        }
    }
}

/// Capability handle for an accepted connection.
///
/// The connection task is the exclusive owner; nothing here is shared.
/// A TLS-terminating transport plugs in by implementing this trait and
/// reporting [`Scheme::Https`].
pub trait Transport: Send {
    /// Append any available bytes to `buf`, waiting if none are buffered.
    ///
    /// Returns the number of bytes appended; `Ok(0)` means the peer closed
    /// the connection. Must not buffer past what was read.
    fn recv(&mut self, buf: &mut BytesMut) -> impl Future<Output = io::Result<usize>> + Send;

    /// Write all of `bytes` to the peer.
    fn send(&mut self, bytes: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// The peer address, if the peer is still there.
    fn peer_addr(&self) -> io::Result<SocketAddr>;

    /// Scheme tag of this transport.
    fn scheme(&self) -> Scheme;

    /// Close the transport. Calling this twice is a no-op.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Plain TCP [`Transport`].
pub struct TcpTransport {
    stream: TcpStream,
    closed: bool,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream, closed: false }
    }
}

impl Transport for TcpTransport {
    async fn recv(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        self.stream.read_buf(buf).await
    }

    async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    fn scheme(&self) -> Scheme {
        Scheme::Http
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.stream.shutdown().await;
        }
    }
}

impl fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpTransport").finish_non_exhaustive()
    }
}
