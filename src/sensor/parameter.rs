//! # Sensor Field Parameters
//!
//! Calibration table describing where each measurement lives in the sensor
//! bit string and how its raw value maps to a physical value.
//!
//! The table is loaded once at startup and validated there: a table that
//! loads successfully can decode every telegram without per-field errors.
//!
//! ## JSON format
//!
//! ```json
//! [
//!   { "temperature": { "offset": 0, "size": 10,
//!                      "range": { "min": 0, "max": 1000 },
//!                      "scale": { "min": "-40", "max": "+60" },
//!                      "unit": "°C" } }
//! ]
//! ```
//!
//! Scale bounds may be JSON numbers or numeric strings.

use serde::Deserialize;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::bits::MAX_FIELD_WIDTH;
use super::scaling::LinearScale;
use crate::error::{BridgeError, Result};

/// Calibration descriptor for one measurement
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParameter {
    /// Measurement name (e.g. "temperature")
    pub name: String,

    /// First bit of the field in the sensor bit string
    pub bit_offset: usize,

    /// Field width in bits
    pub bit_width: usize,

    /// Raw anchor values `(min, max)`
    pub raw_range: (i64, i64),

    /// Physical anchor values `(min, max)`
    pub scale_range: (f64, f64),

    /// Physical unit
    pub unit: String,
}

/// A validated field together with its precomputed scale
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedField {
    pub parameter: FieldParameter,
    pub scale: LinearScale,
}

/// Ordered, validated set of field parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    fields: Vec<CalibratedField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    offset: usize,
    size: usize,
    range: RawRange,
    scale: RawScale,
    unit: String,
}

#[derive(Debug, Deserialize)]
struct RawRange {
    min: i64,
    max: i64,
}

#[derive(Debug, Deserialize)]
struct RawScale {
    min: ScaleValue,
    max: ScaleValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScaleValue {
    Number(f64),
    Text(String),
}

impl ScaleValue {
    fn to_f64(&self, field: &str) -> Result<f64> {
        match self {
            ScaleValue::Number(value) => Ok(*value),
            ScaleValue::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                BridgeError::InvalidParameter(format!(
                    "field '{}' has non-numeric scale bound {:?}",
                    field, text
                ))
            }),
        }
    }
}

impl ParameterTable {
    /// Validate parameters against a bit string of `bit_length` bits
    ///
    /// # Errors
    ///
    /// * [`BridgeError::DivisionByZero`] - a field has `raw_min == raw_max`
    /// * [`BridgeError::InvalidParameter`] - empty or duplicate name, zero or
    ///   oversized width, field past the end of the bit string, or an empty table
    pub fn new(parameters: Vec<FieldParameter>, bit_length: usize) -> Result<Self> {
        if parameters.is_empty() {
            return Err(BridgeError::InvalidParameter(
                "parameter table has no fields".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut fields = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            if parameter.name.is_empty() {
                return Err(BridgeError::InvalidParameter(
                    "field name cannot be empty".to_string(),
                ));
            }

            if !names.insert(parameter.name.clone()) {
                return Err(BridgeError::InvalidParameter(format!(
                    "duplicate field '{}'",
                    parameter.name
                )));
            }

            if parameter.bit_width == 0 || parameter.bit_width > MAX_FIELD_WIDTH {
                return Err(BridgeError::InvalidParameter(format!(
                    "field '{}' width {} must be between 1 and {}",
                    parameter.name, parameter.bit_width, MAX_FIELD_WIDTH
                )));
            }

            let fits = parameter
                .bit_offset
                .checked_add(parameter.bit_width)
                .is_some_and(|end| end <= bit_length);
            if !fits {
                return Err(BridgeError::InvalidParameter(format!(
                    "field '{}' bits {}..{} exceed the {}-bit sensor data",
                    parameter.name,
                    parameter.bit_offset,
                    parameter.bit_offset.saturating_add(parameter.bit_width),
                    bit_length
                )));
            }

            let (raw_min, raw_max) = parameter.raw_range;
            let (scale_min, scale_max) = parameter.scale_range;
            let scale = LinearScale::from_anchors(raw_min, scale_min, raw_max, scale_max)
                .ok_or_else(|| BridgeError::DivisionByZero(parameter.name.clone()))?;

            fields.push(CalibratedField { parameter, scale });
        }

        Ok(Self { fields })
    }

    /// Load and validate a parameter table from a JSON file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use enocean_bridge::esp3::protocol::SENSOR_BITS;
    /// use enocean_bridge::sensor::parameter::ParameterTable;
    ///
    /// let table = ParameterTable::load("config/sensor_parameters.json", SENSOR_BITS)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P, bit_length: usize) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents, bit_length)
    }

    /// Parse and validate a parameter table from JSON text
    pub fn from_json_str(json: &str, bit_length: usize) -> Result<Self> {
        let entries: Vec<HashMap<String, RawField>> = serde_json::from_str(json)?;
        let mut parameters = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            if entry.len() != 1 {
                return Err(BridgeError::InvalidParameter(format!(
                    "entry {} must name exactly one field, found {}",
                    index,
                    entry.len()
                )));
            }

            for (name, raw) in entry {
                let scale_min = raw.scale.min.to_f64(&name)?;
                let scale_max = raw.scale.max.to_f64(&name)?;

                parameters.push(FieldParameter {
                    name,
                    bit_offset: raw.offset,
                    bit_width: raw.size,
                    raw_range: (raw.range.min, raw.range.max),
                    scale_range: (scale_min, scale_max),
                    unit: raw.unit,
                });
            }
        }

        Self::new(parameters, bit_length)
    }

    /// Fields in table order
    pub fn fields(&self) -> &[CalibratedField] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the table has no fields (never true for a validated table)
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
