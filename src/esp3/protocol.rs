//! # ESP3 Protocol Constants and Types
//!
//! Core protocol definitions for EnOcean Serial Protocol 3 frames.
//!
//! ```text
//! +------+-------------+-------------+----------+------+------+----------+-------+
//! | 0x55 | data length | opt. length | pkt type | CRC8 | data | opt data | CRC8  |
//! |  1   |   2 (BE)    |      1      |    1     |  1   |  n   |    m     |   1   |
//! +------+-------------+-------------+----------+------+------+----------+-------+
//! ```

use bytes::Bytes;

use super::crc::CrcTable;

/// ESP3 frame sync byte (always 0x55)
pub const SYNC_BYTE: u8 = 0x55;

/// Header size without sync byte and header CRC
pub const HEADER_LENGTH: usize = 4;

/// Maximum number of body bytes (data + optional) held for one frame
pub const BUFFER_LENGTH: usize = 128;

/// Data length of a D2-14-41 multisensor VLD telegram
pub const SENSOR_DATA_LENGTH: usize = 15;

/// Bytes at the start of the data block that precede the sensor bits
pub const LEADINGS: usize = 5;

/// Sensor bytes in a D2-14-41 telegram (leadings and status byte excluded)
pub const SENSOR_BYTES: usize = SENSOR_DATA_LENGTH - LEADINGS - 1;

/// Bits available to the field decoder
pub const SENSOR_BITS: usize = SENSOR_BYTES * 8;

/// Radio telegram packet type
pub const PACKET_TYPE_RADIO_ADVANCED: u8 = 0x0A;

/// VLD (variable length data) RORG
pub const TELEGRAM_TYPE_VLD_9BIT: u8 = 0x24;

/// ESP3 packet type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// Radio telegram (0x0A)
    RadioAdvanced,
    /// Any packet type this bridge does not handle
    Other(u8),
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            PACKET_TYPE_RADIO_ADVANCED => PacketType::RadioAdvanced,
            other => PacketType::Other(other),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(value: PacketType) -> Self {
        match value {
            PacketType::RadioAdvanced => PACKET_TYPE_RADIO_ADVANCED,
            PacketType::Other(other) => other,
        }
    }
}

/// Telegram type tag (first data byte of a radio telegram)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramType {
    /// 9-bit VLD data (0x24)
    Vld9Bit,
    /// Any telegram type this bridge does not handle
    Other(u8),
}

impl From<u8> for TelegramType {
    fn from(value: u8) -> Self {
        match value {
            TELEGRAM_TYPE_VLD_9BIT => TelegramType::Vld9Bit,
            other => TelegramType::Other(other),
        }
    }
}

/// Validated ESP3 frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Length of the data block
    pub payload_length: u16,

    /// Length of the optional data block
    pub optional_length: u8,

    /// Packet type
    pub packet_type: PacketType,
}

impl FrameHeader {
    /// Parse the 4 header bytes and check them against the header CRC
    ///
    /// Returns `None` when the CRC does not match.
    pub fn parse(bytes: &[u8; HEADER_LENGTH], header_crc: u8, table: &CrcTable) -> Option<Self> {
        if table.checksum(bytes) != header_crc {
            return None;
        }

        Some(Self {
            payload_length: u16::from_be_bytes([bytes[0], bytes[1]]),
            optional_length: bytes[2],
            packet_type: PacketType::from(bytes[3]),
        })
    }

    /// Raw header bytes (without sync byte and CRC)
    pub fn to_bytes(&self) -> [u8; HEADER_LENGTH] {
        let [hi, lo] = self.payload_length.to_be_bytes();
        [hi, lo, self.optional_length, self.packet_type.into()]
    }

    /// Apply the receive buffer capacity to the declared lengths
    ///
    /// Oversized telegrams are truncated rather than rejected. A data block
    /// larger than [`BUFFER_LENGTH`] drops all optional data; otherwise the
    /// optional block is cut to fit the remaining space.
    pub fn clamped(self) -> Self {
        let payload = self.payload_length as usize;
        let optional = self.optional_length as usize;

        if payload > BUFFER_LENGTH {
            Self {
                payload_length: BUFFER_LENGTH as u16,
                optional_length: 0,
                ..self
            }
        } else if payload + optional > BUFFER_LENGTH {
            Self {
                optional_length: (BUFFER_LENGTH - payload) as u8,
                ..self
            }
        } else {
            self
        }
    }

    /// Number of body bytes covered by the data CRC
    pub fn body_length(&self) -> usize {
        self.payload_length as usize + self.optional_length as usize
    }
}

/// A frame whose header and data CRCs both matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Header after length clamping
    pub header: FrameHeader,

    /// Data block
    pub payload: Bytes,

    /// Optional data block
    pub optional: Bytes,
}
