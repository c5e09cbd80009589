//! # Serial Communication Module
//!
//! Handles the serial link to the EnOcean USB gateway (USB 300 / TCM 310).
//!
//! This module handles:
//! - Opening the serial port at the ESP3 baud rate (57,600 baud, 8N1)
//! - Auto-detecting the device across common paths
//! - Exposing the port as an async byte stream for the frame reader
//!
//! Read timeouts and reconnection are left to the caller.

use crate::error::{BridgeError, Result};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// ESP3 baud rate
pub const ESP3_BAUD_RATE: u32 = 57_600;

/// Default device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // FTDI-based USB 300 sticks
    "/dev/ttyACM0", // USB CDC gateways
];

/// EnOcean gateway serial port handler
pub struct SensorSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for SensorSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SensorSerial {
    /// Open the gateway, auto-detecting the device path
    ///
    /// # Errors
    ///
    /// Returns error if no device could be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use enocean_bridge::serial::{SensorSerial, ESP3_BAUD_RATE};
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let serial = SensorSerial::open(ESP3_BAUD_RATE)?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open(baud_rate: u32) -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate)
    }

    /// Open the gateway trying each of `paths` in order
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened EnOcean gateway at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(BridgeError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port with ESP3 line settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BridgeError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Hand over the port as a byte stream
    pub fn into_stream(self) -> tokio_serial::SerialStream {
        self.port
    }
}
