//! # Sensor Bit String
//!
//! Owned MSB-first bit string built from the sensor bytes of a telegram.
//!
//! Bit 0 is the most significant bit of the first byte, so a field at
//! `offset`/`width` reads the same bits as slicing the concatenated
//! `{:08b}` rendering of every byte.

use std::fmt;

use crate::error::{BridgeError, Result};

/// Widest field that fits the extraction accumulator
pub const MAX_FIELD_WIDTH: usize = u64::BITS as usize;

/// Bit string extracted from a sensor telegram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorBits {
    bytes: Vec<u8>,
}

impl SensorBits {
    /// Wrap sensor bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Total number of bits
    pub fn len(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Whether the bit string holds no bits
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Read `width` bits starting at `offset` as an unsigned integer
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::OutOfRange`] if the field runs past the end of
    /// the bit string or is wider than [`MAX_FIELD_WIDTH`].
    ///
    /// # Examples
    ///
    /// ```
    /// use enocean_bridge::sensor::bits::SensorBits;
    ///
    /// let bits = SensorBits::new(vec![0b1010_0000, 0b0100_0000]);
    /// assert_eq!(bits.extract(0, 3).unwrap(), 0b101);
    /// assert_eq!(bits.extract(6, 4).unwrap(), 0b0001);
    /// ```
    pub fn extract(&self, offset: usize, width: usize) -> Result<u64> {
        let out_of_range = || BridgeError::OutOfRange {
            offset,
            count: width,
            len: self.len(),
        };

        let end = offset
            .checked_add(width)
            .filter(|&end| end <= self.len())
            .ok_or_else(out_of_range)?;
        if width > MAX_FIELD_WIDTH {
            return Err(out_of_range());
        }

        let mut value: u64 = 0;
        for index in offset..end {
            let bit = (self.bytes[index / 8] >> (7 - index % 8)) & 1;
            value = (value << 1) | u64::from(bit);
        }

        Ok(value)
    }
}

impl fmt::Display for SensorBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:08b}", byte)?;
        }
        Ok(())
    }
}
