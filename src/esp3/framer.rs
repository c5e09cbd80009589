//! # ESP3 Frame Synchronizer
//!
//! Reads ESP3 frames from a byte stream.
//!
//! The reader walks a small state machine:
//!
//! ```text
//! SeekSync --0x55--> ReadHeader --CRC ok--> ReadBody --> Accepted | Rejected
//!    ^                   |
//!    +----CRC mismatch---+
//! ```
//!
//! Header CRC mismatches are handled internally by resynchronizing. A data CRC
//! mismatch ends the attempt with [`FrameOutcome::Rejected`]. Any I/O error is
//! returned as [`BridgeError::FrameSync`] and is not retried here.

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use super::crc::{crc8, CrcTable};
use super::protocol::{Frame, FrameHeader, HEADER_LENGTH, SYNC_BYTE};
use crate::error::{BridgeError, Result};

/// Where the synchronizer currently is in the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Discarding bytes until a sync byte is seen
    SeekSync,
    /// Sync byte consumed; header and header CRC come next
    ReadHeader,
    /// Header accepted (and clamped); body and data CRC come next
    ReadBody(FrameHeader),
}

/// Why a frame with a valid header was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The trailing data CRC did not match the body
    InvalidDataCrc { received: u8, computed: u8 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidDataCrc { received, computed } => write!(
                f,
                "Invalid data CRC: received 0x{:02X}, computed 0x{:02X}",
                received, computed
            ),
        }
    }
}

/// Result of one frame read attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Accepted(Frame),
    Rejected(RejectReason),
}

/// ESP3 frame reader over any async byte source
pub struct FrameReader<R> {
    reader: R,
    table: Arc<CrcTable>,
    state: SyncState,
    headers_rejected: u64,
}

impl<R> fmt::Debug for FrameReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameReader")
            .field("state", &self.state)
            .field("headers_rejected", &self.headers_rejected)
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a reader that validates checksums with `table`
    pub fn new(reader: R, table: Arc<CrcTable>) -> Self {
        Self {
            reader,
            table,
            state: SyncState::SeekSync,
            headers_rejected: 0,
        }
    }

    /// Current synchronizer state
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Number of headers discarded because of a CRC mismatch
    pub fn headers_rejected(&self) -> u64 {
        self.headers_rejected
    }

    /// Read one complete frame
    ///
    /// # Returns
    ///
    /// * `Ok(FrameOutcome::Accepted)` - Both CRCs matched
    /// * `Ok(FrameOutcome::Rejected)` - Header matched but the body did not
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::FrameSync`] if the underlying read fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use enocean_bridge::esp3::crc::{CrcTable, ESP3_CRC8_POLY};
    /// use enocean_bridge::esp3::encoder::encode_frame;
    /// use enocean_bridge::esp3::framer::{FrameOutcome, FrameReader};
    /// use enocean_bridge::esp3::protocol::PacketType;
    ///
    /// # tokio_test::block_on(async {
    /// let table = Arc::new(CrcTable::from_polynomial(ESP3_CRC8_POLY));
    /// let wire = encode_frame(&table, PacketType::RadioAdvanced, &[0x24, 0x01], &[0x03]).unwrap();
    ///
    /// let mut reader = FrameReader::new(&wire[..], table);
    /// match reader.read_frame().await.unwrap() {
    ///     FrameOutcome::Accepted(frame) => assert_eq!(&frame.payload[..], &[0x24, 0x01]),
    ///     FrameOutcome::Rejected(reason) => panic!("{}", reason),
    /// }
    /// # });
    /// ```
    pub async fn read_frame(&mut self) -> Result<FrameOutcome> {
        let header = self.read_header().await?;
        self.read_body(header).await
    }

    /// Seek the next sync byte and read a header with a matching CRC
    ///
    /// Headers that fail their CRC are dropped and seeking resumes right
    /// after them. On success the reader is left in [`SyncState::ReadBody`]
    /// with the clamped header.
    pub async fn read_header(&mut self) -> Result<FrameHeader> {
        loop {
            self.seek_sync().await?;

            let mut bytes = [0u8; HEADER_LENGTH];
            self.read_exact(&mut bytes).await?;
            let header_crc = self.read_byte().await?;

            match FrameHeader::parse(&bytes, header_crc, &self.table) {
                Some(header) => {
                    let clamped = header.clamped();
                    if clamped != header {
                        debug!(
                            "Clamped frame lengths from {}+{} to {}+{}",
                            header.payload_length,
                            header.optional_length,
                            clamped.payload_length,
                            clamped.optional_length
                        );
                    }
                    self.state = SyncState::ReadBody(clamped);
                    return Ok(clamped);
                }
                None => {
                    self.headers_rejected += 1;
                    debug!("Header CRC mismatch for {:02X?}, resynchronizing", bytes);
                    self.state = SyncState::SeekSync;
                }
            }
        }
    }

    /// Read the body of a frame whose header was accepted
    ///
    /// Reads `payload_length + optional_length` body bytes plus the trailing
    /// data CRC into a freshly allocated buffer.
    pub async fn read_body(&mut self, header: FrameHeader) -> Result<FrameOutcome> {
        let body_length = header.body_length();
        let mut buffer = BytesMut::zeroed(body_length + 1);
        self.read_exact(&mut buffer).await?;
        self.state = SyncState::SeekSync;

        let received = buffer[body_length];
        let computed = crc8(&self.table, &buffer, 0, body_length)?;

        if received != computed {
            return Ok(FrameOutcome::Rejected(RejectReason::InvalidDataCrc {
                received,
                computed,
            }));
        }

        let mut body = buffer.freeze();
        let payload = body.split_to(header.payload_length as usize);
        let optional = body.split_to(header.optional_length as usize);

        trace!(
            "Accepted frame: type {:?}, {} data bytes, {} optional bytes",
            header.packet_type,
            payload.len(),
            optional.len()
        );

        Ok(FrameOutcome::Accepted(Frame {
            header,
            payload,
            optional,
        }))
    }

    async fn seek_sync(&mut self) -> Result<()> {
        self.state = SyncState::SeekSync;

        let mut skipped = 0usize;
        while self.read_byte().await? != SYNC_BYTE {
            skipped += 1;
        }

        if skipped > 0 {
            trace!("Skipped {} bytes before sync", skipped);
        }

        self.state = SyncState::ReadHeader;
        Ok(())
    }

    async fn read_byte(&mut self) -> Result<u8> {
        self.reader.read_u8().await.map_err(BridgeError::FrameSync)
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader
            .read_exact(buf)
            .await
            .map(|_| ())
            .map_err(BridgeError::FrameSync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esp3::crc::ESP3_CRC8_POLY;
    use crate::esp3::encoder::encode_frame;
    use crate::esp3::protocol::{PacketType, BUFFER_LENGTH};
    use std::io;

    fn table() -> Arc<CrcTable> {
        Arc::new(CrcTable::from_polynomial(ESP3_CRC8_POLY))
    }

    fn radio_frame(payload: &[u8], optional: &[u8]) -> Vec<u8> {
        encode_frame(&table(), PacketType::RadioAdvanced, payload, optional).unwrap()
    }

    fn expect_accepted(outcome: FrameOutcome) -> Frame {
        match outcome {
            FrameOutcome::Accepted(frame) => frame,
            FrameOutcome::Rejected(reason) => panic!("Expected accepted frame, got: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_read_valid_frame() {
        let wire = radio_frame(&[0x24, 0x10, 0x20], &[0x01, 0xFF]);
        let mut reader = FrameReader::new(&wire[..], table());

        let frame = expect_accepted(reader.read_frame().await.unwrap());
        assert_eq!(frame.header.payload_length, 3);
        assert_eq!(frame.header.optional_length, 2);
        assert_eq!(frame.header.packet_type, PacketType::RadioAdvanced);
        assert_eq!(&frame.payload[..], &[0x24, 0x10, 0x20]);
        assert_eq!(&frame.optional[..], &[0x01, 0xFF]);
        assert_eq!(reader.state(), SyncState::SeekSync);
    }

    #[tokio::test]
    async fn test_read_frame_without_optional_data() {
        let wire = radio_frame(&[0x24, 0x10], &[]);
        let mut reader = FrameReader::new(&wire[..], table());

        let frame = expect_accepted(reader.read_frame().await.unwrap());
        assert_eq!(&frame.payload[..], &[0x24, 0x10]);
        assert!(frame.optional.is_empty());
    }

    #[tokio::test]
    async fn test_skips_garbage_before_sync() {
        let mut wire = vec![0x00, 0x13, 0xAA, 0xFF];
        wire.extend(radio_frame(&[0x24], &[]));
        let mut reader = FrameReader::new(&wire[..], table());

        let frame = expect_accepted(reader.read_frame().await.unwrap());
        assert_eq!(&frame.payload[..], &[0x24]);
        assert_eq!(reader.headers_rejected(), 0);
    }

    #[tokio::test]
    async fn test_valid_header_moves_to_read_body() {
        let wire = radio_frame(&[0x24, 0x00], &[0x01]);
        let mut reader = FrameReader::new(&wire[..], table());
        assert_eq!(reader.state(), SyncState::SeekSync);

        let header = reader.read_header().await.unwrap();
        assert_eq!(header.payload_length, 2);
        assert_eq!(header.optional_length, 1);
        assert_eq!(reader.state(), SyncState::ReadBody(header));
    }

    #[tokio::test]
    async fn test_corrupted_header_resynchronizes() {
        let mut bad = radio_frame(&[0x01], &[]);
        bad[2] ^= 0x01; // payload length low byte
        let mut wire = bad[..6].to_vec(); // sync + header + header CRC only
        wire.extend(radio_frame(&[0x24, 0x42], &[]));

        let mut reader = FrameReader::new(&wire[..], table());
        let frame = expect_accepted(reader.read_frame().await.unwrap());

        assert_eq!(&frame.payload[..], &[0x24, 0x42]);
        assert_eq!(reader.headers_rejected(), 1);
    }

    #[tokio::test]
    async fn test_data_crc_mismatch_rejects_frame() {
        let mut wire = radio_frame(&[0x24, 0x10, 0x20], &[0x01]);
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        let expected_crc = wire[last] ^ 0xFF;

        let mut reader = FrameReader::new(&wire[..], table());
        match reader.read_frame().await.unwrap() {
            FrameOutcome::Rejected(RejectReason::InvalidDataCrc { received, computed }) => {
                assert_eq!(received, expected_crc ^ 0xFF);
                assert_eq!(computed, expected_crc);
            }
            other => panic!("Expected rejection, got: {:?}", other),
        }
        assert_eq!(reader.state(), SyncState::SeekSync);
    }

    #[tokio::test]
    async fn test_next_frame_after_rejection() {
        let mut wire = radio_frame(&[0x24, 0x10], &[]);
        wire[7] ^= 0x80; // corrupt a data byte
        wire.extend(radio_frame(&[0x24, 0x11], &[]));

        let mut reader = FrameReader::new(&wire[..], table());
        assert!(matches!(
            reader.read_frame().await.unwrap(),
            FrameOutcome::Rejected(_)
        ));

        let frame = expect_accepted(reader.read_frame().await.unwrap());
        assert_eq!(&frame.payload[..], &[0x24, 0x11]);
    }

    #[tokio::test]
    async fn test_oversized_payload_is_truncated() {
        let table = table();
        // Header declares 200 data bytes and 7 optional bytes
        let header = [0x00, 0xC8, 0x07, 0x0A];
        let mut wire = vec![SYNC_BYTE];
        wire.extend_from_slice(&header);
        wire.push(table.checksum(&header));
        // Only BUFFER_LENGTH data bytes plus one CRC byte are consumed
        let body: Vec<u8> = (0..BUFFER_LENGTH as u8).collect();
        wire.extend_from_slice(&body);
        wire.push(table.checksum(&body));

        let mut reader = FrameReader::new(&wire[..], table);
        let frame = expect_accepted(reader.read_frame().await.unwrap());
        assert_eq!(frame.header.payload_length as usize, BUFFER_LENGTH);
        assert_eq!(frame.header.optional_length, 0);
        assert_eq!(frame.payload.len(), BUFFER_LENGTH);
        assert!(frame.optional.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_optional_is_truncated() {
        let table = table();
        // 100 data bytes + 50 optional bytes declared
        let header = [0x00, 100, 50, 0x0A];
        let mut wire = vec![SYNC_BYTE];
        wire.extend_from_slice(&header);
        wire.push(table.checksum(&header));
        let body = vec![0x5A; 128];
        wire.extend_from_slice(&body);
        wire.push(table.checksum(&body));

        let mut reader = FrameReader::new(&wire[..], table);
        let frame = expect_accepted(reader.read_frame().await.unwrap());
        assert_eq!(frame.payload.len(), 100);
        assert_eq!(frame.optional.len(), 28);
    }

    #[tokio::test]
    async fn test_io_error_while_seeking() {
        let mock = tokio_test::io::Builder::new()
            .read(&[0x00, 0x01])
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
            .build();

        let mut reader = FrameReader::new(mock, table());
        match reader.read_frame().await {
            Err(BridgeError::FrameSync(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("Expected FrameSync error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_io_error_while_reading_body() {
        let wire = radio_frame(&[0x24, 0x10, 0x20], &[]);
        let mock = tokio_test::io::Builder::new()
            .read(&wire[..7])
            .read_error(io::Error::new(io::ErrorKind::TimedOut, "stalled"))
            .build();

        let mut reader = FrameReader::new(mock, table());
        assert!(matches!(
            reader.read_frame().await,
            Err(BridgeError::FrameSync(_))
        ));
    }

    #[tokio::test]
    async fn test_end_of_stream_is_frame_sync_failure() {
        let wire = radio_frame(&[0x24, 0x10, 0x20], &[]);
        let mut reader = FrameReader::new(&wire[..4], table());

        match reader.read_frame().await {
            Err(BridgeError::FrameSync(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("Expected FrameSync error, got: {:?}", other),
        }
    }

    #[test]
    fn test_reject_reason_display() {
        let reason = RejectReason::InvalidDataCrc {
            received: 0x12,
            computed: 0xAB,
        };
        assert_eq!(
            reason.to_string(),
            "Invalid data CRC: received 0x12, computed 0xAB"
        );
    }
}
