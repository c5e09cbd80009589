//! # Table-Driven CRC-8
//!
//! CRC-8 checksum calculation for ESP3 headers and data blocks.
//!
//! The checksum is defined entirely by a 256-entry lookup table supplied at
//! startup: `crc = table[crc ^ byte]` for every input byte, starting from 0.
//! The table content is part of the wire contract, so it is loaded from
//! configuration rather than derived from a hard-coded polynomial.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{BridgeError, Result};

/// Polynomial used by the ESP3 reference table (x^8 + x^2 + x + 1)
pub const ESP3_CRC8_POLY: u8 = 0x07;

/// Immutable 256-entry CRC-8 lookup table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcTable([u8; 256]);

/// One entry of a JSON CRC table: either `7` or `"0x07"`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableEntry {
    Int(u64),
    Text(String),
}

impl TableEntry {
    fn to_byte(&self, index: usize) -> Result<u8> {
        let value = match self {
            TableEntry::Int(v) => *v,
            TableEntry::Text(s) => {
                let trimmed = s.trim();
                let digits = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .unwrap_or(trimmed);
                u64::from_str_radix(digits, 16).map_err(|_| {
                    BridgeError::InvalidCrcTable(format!("entry {} is not hex: {:?}", index, s))
                })?
            }
        };

        u8::try_from(value).map_err(|_| {
            BridgeError::InvalidCrcTable(format!("entry {} out of byte range: {}", index, value))
        })
    }
}

impl CrcTable {
    /// Wrap an already-built lookup table
    pub const fn new(table: [u8; 256]) -> Self {
        Self(table)
    }

    /// Generate the lookup table for an MSB-first polynomial at compile time
    ///
    /// Useful for producing reference tables; production tables come from
    /// [`CrcTable::load`].
    pub const fn from_polynomial(poly: u8) -> Self {
        let mut table = [0u8; 256];
        let mut i = 0;

        while i < 256 {
            let mut crc = i as u8;
            let mut j = 0;

            while j < 8 {
                if (crc & 0x80) != 0 {
                    crc = (crc << 1) ^ poly;
                } else {
                    crc <<= 1;
                }
                j += 1;
            }

            table[i] = crc;
            i += 1;
        }

        Self(table)
    }

    /// Load a table from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not a JSON array of
    /// exactly 256 entries, or an entry is not a byte value.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use enocean_bridge::esp3::crc::CrcTable;
    ///
    /// let table = CrcTable::load("config/crc8.json")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse a table from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<TableEntry> = serde_json::from_str(json)?;

        if entries.len() != 256 {
            return Err(BridgeError::InvalidCrcTable(format!(
                "expected 256 entries, found {}",
                entries.len()
            )));
        }

        let mut table = [0u8; 256];
        for (index, entry) in entries.iter().enumerate() {
            table[index] = entry.to_byte(index)?;
        }

        Ok(Self(table))
    }

    /// Look up a single entry
    #[inline]
    pub fn get(&self, index: u8) -> u8 {
        self.0[index as usize]
    }

    /// Checksum of a whole slice
    pub fn checksum(&self, data: &[u8]) -> u8 {
        let mut crc: u8 = 0;

        for &byte in data {
            crc = self.get(crc ^ byte);
        }

        crc
    }
}

/// Calculate CRC-8 over `data[offset..offset + count]`
///
/// # Arguments
///
/// * `table` - Lookup table defining the checksum
/// * `data` - Source buffer
/// * `offset` - Index of the first byte covered
/// * `count` - Number of bytes covered
///
/// # Errors
///
/// Returns [`BridgeError::OutOfRange`] if the range does not fit in `data`.
///
/// # Examples
///
/// ```
/// use enocean_bridge::esp3::crc::{crc8, CrcTable, ESP3_CRC8_POLY};
///
/// let table = CrcTable::from_polynomial(ESP3_CRC8_POLY);
/// let header = [0x00, 0x0F, 0x07, 0x0A];
/// let crc = crc8(&table, &header, 0, header.len()).unwrap();
/// assert_eq!(crc, table.checksum(&header));
/// ```
pub fn crc8(table: &CrcTable, data: &[u8], offset: usize, count: usize) -> Result<u8> {
    let end = offset
        .checked_add(count)
        .filter(|&end| end <= data.len())
        .ok_or(BridgeError::OutOfRange {
            offset,
            count,
            len: data.len(),
        })?;

    Ok(table.checksum(&data[offset..end]))
}

/// Bitwise reference implementation, for checking tables
#[cfg(test)]
fn crc8_bitwise(poly: u8, data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ poly;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
