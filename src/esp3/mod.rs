//! # ESP3 Protocol Module
//!
//! Implementation of EnOcean Serial Protocol 3 for receiving radio telegrams.
//!
//! This module handles:
//! - Table-driven CRC-8 checksums
//! - Frame synchronization and header/data validation
//! - Receive buffer length clamping
//! - Telegram type dispatch and sensor data extraction

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod framer;
pub mod crc;
