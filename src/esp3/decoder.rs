//! # ESP3 Telegram Decoder
//!
//! Interprets accepted frames. Only radio telegrams carrying 9-bit VLD
//! multisensor data are decoded; everything else is filtered out.

use tracing::trace;

use super::protocol::*;
use crate::error::{BridgeError, Result};
use crate::sensor::bits::SensorBits;

/// Why a frame produced no sensor data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Packet type other than radio
    PacketType(u8),
    /// Radio telegram of a type other than 9-bit VLD
    TelegramType(u8),
    /// Radio frame with an empty data block
    EmptyPayload,
}

/// Decoded telegram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Telegram {
    /// Sensor bits of a 9-bit VLD telegram, ready for field decoding
    SensorData(SensorBits),
    /// Frame filtered out; not an error
    Ignored(IgnoreReason),
}

/// Decode an accepted frame
///
/// # Arguments
///
/// * `frame` - Frame whose header and data CRCs matched
///
/// # Returns
///
/// * `Result<Telegram>` - Sensor bits, or the reason the frame was ignored
///
/// # Errors
///
/// Returns [`BridgeError::UnsupportedDataLength`] for a 9-bit VLD telegram
/// whose data block is not exactly [`SENSOR_DATA_LENGTH`] bytes.
pub fn decode_telegram(frame: &Frame) -> Result<Telegram> {
    match frame.header.packet_type {
        PacketType::RadioAdvanced => {}
        PacketType::Other(tag) => {
            trace!("Ignoring packet type 0x{:02X}", tag);
            return Ok(Telegram::Ignored(IgnoreReason::PacketType(tag)));
        }
    }

    let Some(&tag) = frame.payload.first() else {
        return Ok(Telegram::Ignored(IgnoreReason::EmptyPayload));
    };

    match TelegramType::from(tag) {
        TelegramType::Vld9Bit => decode_sensor_data(&frame.payload).map(Telegram::SensorData),
        TelegramType::Other(tag) => {
            trace!("Ignoring telegram type 0x{:02X}", tag);
            Ok(Telegram::Ignored(IgnoreReason::TelegramType(tag)))
        }
    }
}

/// Extract the sensor bytes of a 9-bit VLD data block
///
/// The sensor bytes sit between the [`LEADINGS`] bytes and the trailing
/// status byte.
pub fn decode_sensor_data(payload: &[u8]) -> Result<SensorBits> {
    if payload.len() != SENSOR_DATA_LENGTH {
        return Err(BridgeError::UnsupportedDataLength(payload.len()));
    }

    let data_length = payload.len() - LEADINGS - 1;
    Ok(SensorBits::new(&payload[LEADINGS..LEADINGS + data_length]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esp3::encoder::encode_sensor_payload;
    use bytes::Bytes;

    fn frame(packet_type: PacketType, payload: &[u8]) -> Frame {
        Frame {
            header: FrameHeader {
                payload_length: payload.len() as u16,
                optional_length: 0,
                packet_type,
            },
            payload: Bytes::copy_from_slice(payload),
            optional: Bytes::new(),
        }
    }

    #[test]
    fn test_decode_sensor_telegram() {
        let data = [0x7D, 0x0C, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01];
        let payload = encode_sensor_payload(&data);

        match decode_telegram(&frame(PacketType::RadioAdvanced, &payload)).unwrap() {
            Telegram::SensorData(bits) => {
                assert_eq!(bits.as_bytes(), &data);
                assert_eq!(bits.len(), SENSOR_BITS);
            }
            other => panic!("Expected sensor data, got: {:?}", other),
        }
    }

    #[test]
    fn test_sensor_bits_skip_leadings_and_status() {
        let mut payload = [0xEEu8; SENSOR_DATA_LENGTH];
        payload[0] = TELEGRAM_TYPE_VLD_9BIT;
        payload[LEADINGS..14].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);

        let bits = decode_sensor_data(&payload).unwrap();
        assert_eq!(bits.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_other_packet_types_are_ignored() {
        let payload = encode_sensor_payload(&[0xFF; 9]);

        for tag in [0x01u8, 0x02, 0x04, 0x09, 0x0B, 0xFF] {
            let result = decode_telegram(&frame(PacketType::from(tag), &payload)).unwrap();
            assert_eq!(result, Telegram::Ignored(IgnoreReason::PacketType(tag)));
        }
    }

    #[test]
    fn test_other_telegram_types_are_ignored() {
        let mut payload = encode_sensor_payload(&[0u8; 9]);
        payload[0] = 0xD2;

        let result = decode_telegram(&frame(PacketType::RadioAdvanced, &payload)).unwrap();
        assert_eq!(result, Telegram::Ignored(IgnoreReason::TelegramType(0xD2)));
    }

    #[test]
    fn test_empty_radio_payload_is_ignored() {
        let result = decode_telegram(&frame(PacketType::RadioAdvanced, &[])).unwrap();
        assert_eq!(result, Telegram::Ignored(IgnoreReason::EmptyPayload));
    }

    #[test]
    fn test_unsupported_data_length() {
        for length in [1usize, 6, 14, 16, 30, 128] {
            let mut payload = vec![0u8; length];
            payload[0] = TELEGRAM_TYPE_VLD_9BIT;

            match decode_telegram(&frame(PacketType::RadioAdvanced, &payload)) {
                Err(BridgeError::UnsupportedDataLength(len)) => assert_eq!(len, length),
                other => panic!("Expected UnsupportedDataLength for {}, got: {:?}", length, other),
            }
        }
    }
}
