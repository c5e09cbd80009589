//! # Error Types
//!
//! Custom error types for EnOcean Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for EnOcean Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// I/O failure while seeking sync or reading a header/body
    #[error("Frame sync failure: {0}")]
    FrameSync(#[source] std::io::Error),

    /// Checksum or bit range runs past the end of the buffer
    #[error("Range out of bounds: offset {offset} + count {count} exceeds length {len}")]
    OutOfRange {
        offset: usize,
        count: usize,
        len: usize,
    },

    /// Data block or optional block too long for the header length fields
    #[error("Frame too large to encode: {0} bytes")]
    FrameTooLarge(usize),

    /// VLD telegram whose payload length is not the supported sensor length
    #[error("Unsupported data length: {0} bytes")]
    UnsupportedDataLength(usize),

    /// Field parameter with a degenerate raw range
    #[error("Division by zero: field '{0}' has raw_min == raw_max")]
    DivisionByZero(String),

    /// Malformed field parameter table
    #[error("Invalid sensor parameter: {0}")]
    InvalidParameter(String),

    /// Malformed CRC lookup table
    #[error("Invalid CRC table: {0}")]
    InvalidCrcTable(String),

    /// Decoded measurement set lacks a field required by the message template
    #[error("Missing measurement: {0}")]
    MissingMeasurement(String),

    /// Message sink failed to deliver
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON table or message errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),
}

impl BridgeError {
    /// Whether the read loop may log this error and move on to the next telegram.
    ///
    /// Everything else (I/O failure on the port, bad configuration or tables)
    /// halts processing.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::UnsupportedDataLength(_)
                | BridgeError::MissingMeasurement(_)
                | BridgeError::Delivery(_)
        )
    }
}

/// Result type alias for EnOcean Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(BridgeError::UnsupportedDataLength(14).is_transient());
        assert!(BridgeError::MissingMeasurement("humidity".into()).is_transient());
        assert!(BridgeError::Delivery("broker down".into()).is_transient());

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged");
        assert!(!BridgeError::FrameSync(io).is_transient());
        assert!(!BridgeError::DivisionByZero("temperature".into()).is_transient());
        assert!(!BridgeError::InvalidCrcTable("short".into()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = BridgeError::OutOfRange { offset: 2, count: 5, len: 4 };
        assert_eq!(
            err.to_string(),
            "Range out of bounds: offset 2 + count 5 exceeds length 4"
        );
        assert_eq!(
            BridgeError::UnsupportedDataLength(14).to_string(),
            "Unsupported data length: 14 bytes"
        );
    }
}
