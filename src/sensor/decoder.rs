//! # Field Decoder
//!
//! Turns sensor bits into named physical measurements using a validated
//! [`ParameterTable`].

use tracing::trace;

use super::bits::SensorBits;
use super::message::Measurement;
use super::parameter::ParameterTable;
use crate::error::Result;

/// Decode every field of `table` from `bits`, in table order
///
/// # Errors
///
/// Returns [`crate::error::BridgeError::OutOfRange`] if a field does not fit
/// in `bits`, which only happens when the table was validated against a
/// longer bit string.
///
/// # Examples
///
/// ```
/// use enocean_bridge::sensor::bits::SensorBits;
/// use enocean_bridge::sensor::decoder::decode_fields;
/// use enocean_bridge::sensor::parameter::{FieldParameter, ParameterTable};
///
/// let table = ParameterTable::new(
///     vec![FieldParameter {
///         name: "humidity".into(),
///         bit_offset: 0,
///         bit_width: 8,
///         raw_range: (0, 200),
///         scale_range: (0.0, 100.0),
///         unit: "%".into(),
///     }],
///     8,
/// )
/// .unwrap();
///
/// let measurements = decode_fields(&table, &SensorBits::new(vec![100])).unwrap();
/// assert_eq!(measurements[0].value, 50.0);
/// ```
pub fn decode_fields(table: &ParameterTable, bits: &SensorBits) -> Result<Vec<Measurement>> {
    table
        .fields()
        .iter()
        .map(|field| {
            let parameter = &field.parameter;
            let raw = bits.extract(parameter.bit_offset, parameter.bit_width)?;
            let value = field.scale.apply(raw);

            trace!("{}: raw {} -> {} {}", parameter.name, raw, value, parameter.unit);

            Ok(Measurement {
                name: parameter.name.clone(),
                value,
                unit: parameter.unit.clone(),
            })
        })
        .collect()
}
