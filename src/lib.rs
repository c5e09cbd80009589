//! # EnOcean Bridge Library
//!
//! Receive STM 550 multisensor telegrams from an EnOcean USB gateway and
//! forward calibrated temperature and humidity readings.
//!
//! This library provides the ESP3 frame synchronizer, the VLD telegram and
//! sensor field decoders, and the sinks the decoded messages are delivered to.

pub mod config;
pub mod error;
pub mod esp3;
pub mod gateway;
pub mod sensor;
pub mod serial;
pub mod telemetry;
