//! # Telemetry Module
//!
//! Delivery of decoded sensor messages.
//!
//! This module handles:
//! - The [`MessageSink`] seam the gateway hands messages to
//! - Logging messages through `tracing`
//! - Appending timestamped messages to a JSONL (JSON Lines) file
//!
//! Cloud transport is provided by whatever sink the host plugs in; the
//! gateway's obligation ends once a sink accepts the message.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::{BridgeError, Result};
use crate::sensor::message::SensorMessage;

/// Receiver of decoded sensor messages
#[cfg_attr(test, mockall::automock)]
pub trait MessageSink {
    /// Deliver one message
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Delivery`] if the message could not be handed on.
    fn send_message(&mut self, message: &SensorMessage) -> Result<()>;
}

impl MessageSink for Vec<Box<dyn MessageSink + Send>> {
    /// Deliver to every sink, reporting the first failure after all were tried
    fn send_message(&mut self, message: &SensorMessage) -> Result<()> {
        let mut first_error = None;

        for sink in self.iter_mut() {
            if let Err(e) = sink.send_message(message) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Sink that logs the rendered message at INFO level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn send_message(&mut self, message: &SensorMessage) -> Result<()> {
        info!("Sensor message: {}", message.to_json()?);
        Ok(())
    }
}

/// One JSONL line
#[derive(Debug, Serialize)]
struct TelemetryRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    message: &'a SensorMessage,
}

/// Sink that appends one timestamped JSON object per line
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    writer: W,
    records: u64,
}

impl JsonlSink<BufWriter<File>> {
    /// Open (or create) `log_dir/file_name` for appending
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use enocean_bridge::telemetry::JsonlSink;
    ///
    /// let sink = JsonlSink::create("./logs", "telemetry.jsonl")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn create<P: AsRef<Path>>(log_dir: P, file_name: &str) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(file_name))?;

        info!("Writing telemetry to {}", log_dir.join(file_name).display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlSink<W> {
    /// Wrap an arbitrary writer
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    /// Number of records written
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Underlying writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> MessageSink for JsonlSink<W> {
    fn send_message(&mut self, message: &SensorMessage) -> Result<()> {
        let record = TelemetryRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message,
        };

        let line = serde_json::to_string(&record)?;
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| BridgeError::Delivery(format!("Failed to write telemetry record: {}", e)))?;

        self.records += 1;
        Ok(())
    }
}
