//! # Measurements and Messages
//!
//! Decoded measurements and the message built from them for delivery.

use serde::Serialize;

use crate::error::{BridgeError, Result};

/// One decoded physical value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// Field name from the parameter table
    pub name: String,

    /// Physical value
    pub value: f64,

    /// Physical unit
    pub unit: String,
}

/// Delivery payload: `{"temperature": <value>, "humidity": <value>}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorMessage {
    pub temperature: f64,
    pub humidity: f64,
}

impl SensorMessage {
    /// Pick the template fields out of a measurement set
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MissingMeasurement`] if `temperature` or
    /// `humidity` is absent.
    pub fn from_measurements(measurements: &[Measurement]) -> Result<Self> {
        let find = |name: &str| {
            measurements
                .iter()
                .find(|m| m.name == name)
                .map(|m| m.value)
                .ok_or_else(|| BridgeError::MissingMeasurement(name.to_string()))
        };

        Ok(Self {
            temperature: find("temperature")?,
            humidity: find("humidity")?,
        })
    }

    /// Render the message text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
