//! Transport abstraction (§1 Non-goals): the dispatcher only needs something
//! it can (re)connect into a byte-stream read/write pair. Opening a real
//! serial port, or an RS-485-over-TCP bridge with vendor-specific framing,
//! is left to callers; this module ships a plain TCP transport so the CLI
//! has something to point at.

use std::pin::Pin;

use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::error::ConnectionError;

pub type BoxRead = Pin<Box<dyn AsyncRead + Send + Unpin>>;
pub type BoxWrite = Pin<Box<dyn AsyncWrite + Send + Unpin>>;

/// Something the dispatcher can (re)connect to obtain a fresh read/write
/// pair (§4.3.5). Implementations own their own reconnection details
/// (serial port path, bridge address); the dispatcher just calls
/// `connect()` again after a connection loss.
pub trait Transport: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, Result<(BoxRead, BoxWrite), ConnectionError>>;
}

/// Connects to an RS-485-over-TCP bridge (e.g. `ser2net`, `esp-link`).
pub struct TcpTransport {
    addr: String,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Transport for TcpTransport {
    fn connect(&self) -> BoxFuture<'_, Result<(BoxRead, BoxWrite), ConnectionError>> {
        Box::pin(async move {
            let stream = TcpStream::connect(&self.addr).await.map_err(ConnectionError::Io)?;
            stream.set_nodelay(true).ok();
            let (read_half, write_half) = stream.into_split();
            let read: BoxRead = Box::pin(read_half);
            let write: BoxWrite = Box::pin(write_half);
            Ok((read, write))
        })
    }
}
