//! # Gateway Pipeline
//!
//! Runs one telegram at a time through the full receive path:
//!
//! ```text
//! bytes -> FrameReader -> decode_telegram -> decode_fields -> SensorMessage -> MessageSink
//! ```
//!
//! Rejected frames, filtered telegrams and transient errors are logged and
//! the loop moves on. I/O failures on the byte source stop the loop.

use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{debug, error, trace, warn};

use crate::error::Result;
use crate::esp3::decoder::{decode_telegram, IgnoreReason, Telegram};
use crate::esp3::framer::{FrameOutcome, FrameReader, RejectReason};
use crate::sensor::decoder::decode_fields;
use crate::sensor::message::SensorMessage;
use crate::sensor::parameter::ParameterTable;
use crate::telemetry::MessageSink;

/// Counters kept across telegrams
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GatewayStats {
    /// Frames with matching header and data CRCs
    pub frames_accepted: u64,
    /// Frames discarded for a data CRC mismatch
    pub frames_rejected: u64,
    /// Accepted frames that were not sensor telegrams
    pub telegrams_ignored: u64,
    /// Sensor telegrams dropped by a transient error
    pub telegrams_failed: u64,
    /// Messages accepted by the sink
    pub messages_sent: u64,
}

/// What happened to one frame
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Sensor telegram decoded and handed to the sink
    Delivered(SensorMessage),
    /// Frame filtered out by packet or telegram type
    Ignored(IgnoreReason),
    /// Frame discarded by the synchronizer
    Rejected(RejectReason),
}

/// Receive loop tying the frame reader, decoders and sink together
pub struct Gateway<R, S> {
    reader: FrameReader<R>,
    parameters: Arc<ParameterTable>,
    sink: S,
    stats: GatewayStats,
}

impl<R, S> Gateway<R, S>
where
    R: AsyncRead + Unpin,
    S: MessageSink,
{
    /// Create a gateway
    ///
    /// # Arguments
    ///
    /// * `reader` - Frame reader over the serial byte stream
    /// * `parameters` - Validated field parameter table
    /// * `sink` - Destination for decoded messages
    pub fn new(reader: FrameReader<R>, parameters: Arc<ParameterTable>, sink: S) -> Self {
        Self {
            reader,
            parameters,
            sink,
            stats: GatewayStats::default(),
        }
    }

    /// Counters so far
    pub fn stats(&self) -> GatewayStats {
        self.stats
    }

    /// Headers the frame reader dropped while resynchronizing
    pub fn headers_rejected(&self) -> u64 {
        self.reader.headers_rejected()
    }

    /// Read and handle exactly one frame
    ///
    /// # Errors
    ///
    /// Returns the underlying error for both transient failures (see
    /// [`crate::error::BridgeError::is_transient`]) and fatal ones.
    pub async fn process_next(&mut self) -> Result<ProcessOutcome> {
        let frame = match self.reader.read_frame().await? {
            FrameOutcome::Accepted(frame) => {
                self.stats.frames_accepted += 1;
                frame
            }
            FrameOutcome::Rejected(reason) => {
                self.stats.frames_rejected += 1;
                warn!("Frame rejected: {}", reason);
                return Ok(ProcessOutcome::Rejected(reason));
            }
        };

        let result = self.handle_telegram(decode_telegram(&frame));
        if matches!(&result, Err(e) if e.is_transient()) {
            self.stats.telegrams_failed += 1;
        }
        result
    }

    fn handle_telegram(&mut self, telegram: Result<Telegram>) -> Result<ProcessOutcome> {
        let bits = match telegram? {
            Telegram::SensorData(bits) => bits,
            Telegram::Ignored(reason) => {
                self.stats.telegrams_ignored += 1;
                trace!("Telegram ignored: {:?}", reason);
                return Ok(ProcessOutcome::Ignored(reason));
            }
        };

        debug!("Sensor bits: {}", bits);

        let measurements = decode_fields(&self.parameters, &bits)?;
        for measurement in &measurements {
            debug!("{}: {:.2} [{}]", measurement.name, measurement.value, measurement.unit);
        }

        let message = SensorMessage::from_measurements(&measurements)?;
        self.sink.send_message(&message)?;
        self.stats.messages_sent += 1;

        Ok(ProcessOutcome::Delivered(message))
    }

    /// Process frames until a fatal error occurs
    ///
    /// Transient errors are logged and counted. The returned error is always
    /// fatal, typically [`crate::error::BridgeError::FrameSync`] when the
    /// serial stream fails.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.process_next().await {
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    warn!("Telegram discarded: {}", e);
                }
                Err(e) => {
                    error!("Receive loop stopped: {}", e);
                    return Err(e);
                }
            }
        }
    }
}
