//! # ESP3 Frame Encoder
//!
//! Builds complete ESP3 frames. The bridge only receives, so this is used
//! for loopback testing and for replaying captured telegrams.

use super::crc::CrcTable;
use super::protocol::*;
use crate::error::{BridgeError, Result};

/// Encode a complete ESP3 frame
///
/// # Arguments
///
/// * `table` - CRC lookup table for the header and data checksums
/// * `packet_type` - Packet type tag
/// * `payload` - Data block
/// * `optional` - Optional data block
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Sync + header + header CRC + data + optional + data CRC
///
/// # Errors
///
/// Returns [`BridgeError::FrameTooLarge`] if the data block exceeds 65535
/// bytes or the optional block exceeds 255 bytes.
pub fn encode_frame(
    table: &CrcTable,
    packet_type: PacketType,
    payload: &[u8],
    optional: &[u8],
) -> Result<Vec<u8>> {
    let payload_length =
        u16::try_from(payload.len()).map_err(|_| BridgeError::FrameTooLarge(payload.len()))?;
    let optional_length =
        u8::try_from(optional.len()).map_err(|_| BridgeError::FrameTooLarge(optional.len()))?;

    let header = FrameHeader {
        payload_length,
        optional_length,
        packet_type,
    }
    .to_bytes();

    let mut frame = Vec::with_capacity(1 + HEADER_LENGTH + 1 + payload.len() + optional.len() + 1);
    frame.push(SYNC_BYTE);
    frame.extend_from_slice(&header);
    frame.push(table.checksum(&header));

    let body_start = frame.len();
    frame.extend_from_slice(payload);
    frame.extend_from_slice(optional);
    let data_crc = table.checksum(&frame[body_start..]);
    frame.push(data_crc);

    Ok(frame)
}

/// Build the 15-byte data block of a multisensor VLD telegram
///
/// `sensor_data` lands right after the [`LEADINGS`] bytes; the leading
/// sender/sub-header bytes and the trailing status byte are zero.
pub fn encode_sensor_payload(sensor_data: &[u8; SENSOR_BYTES]) -> [u8; SENSOR_DATA_LENGTH] {
    let mut payload = [0u8; SENSOR_DATA_LENGTH];
    payload[0] = TELEGRAM_TYPE_VLD_9BIT;
    payload[LEADINGS..LEADINGS + SENSOR_BYTES].copy_from_slice(sensor_data);
    payload
}
