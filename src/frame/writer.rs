//! [`Frame`] to byte-stream encoding (§4.1.3).

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time;

use crate::error::Error;
use crate::frame::Frame;

/// Per-`write()` timeout, per §4.1.3 / §5.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Writes frames to an [`AsyncWrite`] transport half.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Serializes and writes a frame, waiting for the transport to drain.
    pub async fn write(&mut self, frame: &mut Frame) -> Result<(), Error> {
        let bytes = frame.to_bytes().map_err(Error::FrameData)?;
        time::timeout(WRITE_TIMEOUT, self.write_inner(&bytes))
            .await
            .map_err(|_| Error::Timeout)??;
        Ok(())
    }

    async fn write_inner(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.inner
            .write_all(bytes)
            .await
            .map_err(crate::error::ReadError::Io)?;
        self.inner
            .flush()
            .await
            .map_err(crate::error::ReadError::Io)?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), Error> {
        self.inner
            .shutdown()
            .await
            .map_err(crate::error::ReadError::Io)?;
        Ok(())
    }
}
