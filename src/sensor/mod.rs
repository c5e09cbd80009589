//! # Sensor Module
//!
//! STM 550 multisensor (EEP D2-14-41) data handling.
//!
//! This module handles:
//! - Holding the sensor bit string of a VLD telegram
//! - Loading and validating the field parameter table
//! - Linear scaling of raw field values
//! - Building measurements and the delivery message

pub mod bits;
pub mod parameter;
pub mod scaling;
pub mod decoder;
pub mod message;
