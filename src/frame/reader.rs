//! Byte-stream to [`Frame`] decoding (§4.1.2).

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time;

use crate::error::{ChecksumError, FrameReadError, ReadError};
use crate::frame::{
    bcc, Frame, FrameType, ADDR_BROADCAST, ADDR_ECONET, FRAME_END, FRAME_START, HEADER_SIZE,
    MAX_FRAME_LENGTH, MIN_FRAME_LENGTH,
};

/// Per-`read()` timeout, per §4.1.2 / §5.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads frames off an [`AsyncRead`] transport half.
///
/// Stateless beyond the transport handle itself: every call to [`FrameReader::read`]
/// scans for [`FRAME_START`] from scratch, so a `FrameReader` can be
/// recreated across reconnects without losing synchronization.
pub struct FrameReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the next frame addressed to us.
    ///
    /// Returns `Ok(None)` when a well-formed frame was read but its
    /// recipient is neither the master address nor broadcast -- the frame
    /// is intentionally not an error, just not ours (§4.1.2).
    pub async fn read(&mut self) -> Result<Option<Frame>, FrameReadError> {
        match time::timeout(READ_TIMEOUT, self.read_inner()).await {
            Ok(result) => result,
            Err(_) => Err(ReadError::Timeout.into()),
        }
    }

    async fn read_inner(&mut self) -> Result<Option<Frame>, FrameReadError> {
        loop {
            let byte = self.read_u8().await?;
            if byte == FRAME_START {
                break;
            }
        }

        let mut header_rest = [0u8; HEADER_SIZE - 1];
        if let Err(e) = self.inner.read_exact(&mut header_rest).await {
            return Err(ReadError::Io(e).into());
        }

        let length = u16::from_le_bytes([header_rest[0], header_rest[1]]);
        if !(MIN_FRAME_LENGTH..=MAX_FRAME_LENGTH).contains(&length) {
            return Err(ReadError::LengthOutOfBounds(length).into());
        }

        let recipient = header_rest[2];
        let sender = header_rest[3];
        let sender_type = header_rest[4];
        let econet_version = header_rest[5];

        let remaining = length as usize - HEADER_SIZE;
        let mut rest = vec![0u8; remaining];
        if let Err(_e) = self.inner.read_exact(&mut rest).await {
            return Err(ReadError::IncompletePayload {
                got: 0,
                expected: remaining,
            }
            .into());
        }

        // rest = [frame_type(1), message(remaining-3), bcc(1), end(1)]
        if rest.len() < 3 {
            return Err(ReadError::IncompletePayload {
                got: rest.len(),
                expected: 3,
            }
            .into());
        }

        let frame_type_code = rest[0];
        let received_bcc = rest[rest.len() - 2];
        let end = rest[rest.len() - 1];
        let message = rest[1..rest.len() - 2].to_vec();

        if end != FRAME_END {
            return Err(ReadError::IncompletePayload {
                got: rest.len(),
                expected: remaining,
            }
            .into());
        }

        let mut checked = Vec::with_capacity(length as usize - 2);
        checked.push(FRAME_START);
        checked.extend_from_slice(&header_rest);
        checked.extend_from_slice(&rest[..rest.len() - 2]);
        let expected_bcc = bcc(&checked);

        if expected_bcc != received_bcc {
            return Err(ChecksumError {
                expected: expected_bcc,
                actual: received_bcc,
            }
            .into());
        }

        if recipient != ADDR_ECONET && recipient != ADDR_BROADCAST {
            return Ok(None);
        }

        let frame_type = FrameType::from_code(frame_type_code)?;
        let mut frame = Frame::from_message(frame_type, sender, recipient, message);
        frame.set_sender_type(sender_type);
        frame.set_econet_version(econet_version);
        Ok(Some(frame))
    }

    async fn read_u8(&mut self) -> Result<u8, ReadError> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf).await?;
        Ok(buf[0])
    }
}
