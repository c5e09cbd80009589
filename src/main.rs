//! # EnOcean Bridge
//!
//! Receive STM 550 multisensor telegrams from an EnOcean USB gateway and
//! forward calibrated temperature and humidity readings.
//!
//! This application reads ESP3 frames from the gateway's serial port, decodes
//! VLD sensor telegrams and hands each message to the configured sinks.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use enocean_bridge::config::{Config, LoggingConfig};
use enocean_bridge::esp3::crc::CrcTable;
use enocean_bridge::esp3::framer::FrameReader;
use enocean_bridge::esp3::protocol::SENSOR_BITS;
use enocean_bridge::gateway::Gateway;
use enocean_bridge::sensor::parameter::ParameterTable;
use enocean_bridge::serial::SensorSerial;
use enocean_bridge::telemetry::{JsonlSink, LogSink, MessageSink};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for daily-rolling diagnostic logs
const LOG_FILE_PREFIX: &str = "enocean-bridge.log";

/// Main entry point for EnOcean Bridge application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging to the console and optionally a rolling file
///    - Load the CRC table and the sensor parameter table
///    - Open the serial connection to the gateway
///
/// 2. **Receive Loop**
///    - Synchronize on ESP3 frames and verify both CRCs
///    - Decode sensor telegrams into temperature and humidity
///    - Deliver each message to the log and the JSONL telemetry file
///
/// 3. **Shutdown**
///    - On Ctrl+C or a serial failure, log the counters and exit
///
/// # Errors
///
/// Returns error if:
/// - The configuration or either table cannot be loaded
/// - No serial device can be opened
/// - The serial stream fails while running
///
/// # Example Output
///
/// ```text
/// INFO enocean_bridge: EnOcean Bridge v0.1.0 starting...
/// INFO enocean_bridge::serial: Successfully opened EnOcean gateway at /dev/ttyUSB0 (57600 baud)
/// INFO enocean_bridge::telemetry: Sensor message: {"temperature":21.5,"humidity":45.5}
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);

    info!("EnOcean Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path);

    let crc_table = CrcTable::load(&config.tables.crc_table)
        .with_context(|| format!("Failed to load CRC table from {}", config.tables.crc_table))?;

    let parameters = ParameterTable::load(&config.tables.sensor_parameters, SENSOR_BITS)
        .with_context(|| {
            format!(
                "Failed to load sensor parameters from {}",
                config.tables.sensor_parameters
            )
        })?;
    info!("Loaded {} sensor fields", parameters.len());

    let serial = if config.serial.port.is_empty() {
        SensorSerial::open(config.serial.baud_rate)?
    } else {
        SensorSerial::open_with_paths(&[config.serial.port.as_str()], config.serial.baud_rate)?
    };
    info!("EnOcean serial port opened at: {}", serial.device_path());

    let mut sinks: Vec<Box<dyn MessageSink + Send>> = vec![Box::new(LogSink)];
    if config.telemetry.enabled {
        let sink = JsonlSink::create(&config.telemetry.log_dir, &config.telemetry.file_name)
            .context("Failed to open telemetry file")?;
        sinks.push(Box::new(sink));
    }

    let reader = FrameReader::new(serial.into_stream(), Arc::new(crc_table));
    let mut gateway = Gateway::new(reader, Arc::new(parameters), sinks);

    info!("Waiting for telegrams");
    info!("Press Ctrl+C to exit");

    let result = tokio::select! {
        result = gateway.run() => result.context("Serial stream failed"),

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(())
        }
    };

    let stats = gateway.stats();
    info!(
        "Frames accepted: {}, rejected: {}, headers dropped: {}",
        stats.frames_accepted,
        stats.frames_rejected,
        gateway.headers_rejected()
    );
    info!(
        "Telegrams ignored: {}, failed: {}, messages sent: {}",
        stats.telegrams_ignored, stats.telegrams_failed, stats.messages_sent
    );

    result
}

/// Install the console subscriber plus an optional daily-rolling file layer
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}
