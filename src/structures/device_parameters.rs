//! Shared parameter-record layout (§4.2.5): three equal-size little-endian
//! unsigned integers, `value | min_value | max_value`. A record whose bytes
//! are all `0xFF` is absent.

use crate::parameters::ParameterValues;
use crate::structures::BYTE_UNDEFINED;

/// Unpacks one parameter record of `size` bytes per field (`3 * size` bytes
/// total), returning `None` when every byte equals `0xFF`.
pub fn unpack_parameter(message: &[u8], offset: usize, size: usize) -> Option<ParameterValues> {
    let record = &message[offset..offset + size * 3];
    if record.iter().all(|&b| b == BYTE_UNDEFINED) {
        return None;
    }

    let read_uint = |slice: &[u8]| -> u32 {
        let mut acc = 0u32;
        for (i, &byte) in slice.iter().enumerate() {
            acc |= (byte as u32) << (8 * i);
        }
        acc
    };

    Some(ParameterValues {
        value: read_uint(&record[0..size]),
        min_value: read_uint(&record[size..2 * size]),
        max_value: read_uint(&record[2 * size..3 * size]),
    })
}

/// Packs a parameter record back to its wire form, the inverse of
/// [`unpack_parameter`].
pub fn pack_parameter(values: &ParameterValues, size: usize) -> Vec<u8> {
    let write_uint = |v: u32| -> Vec<u8> {
        (0..size).map(|i| ((v >> (8 * i)) & 0xFF) as u8).collect()
    };

    let mut record = Vec::with_capacity(size * 3);
    record.extend(write_uint(values.value));
    record.extend(write_uint(values.min_value));
    record.extend(write_uint(values.max_value));
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_record_is_none() {
        let message = [0xFF, 0xFF, 0xFF];
        assert!(unpack_parameter(&message, 0, 1).is_none());
    }

    #[test]
    fn round_trips_single_byte_fields() {
        let message = [10u8, 0, 100];
        let values = unpack_parameter(&message, 0, 1).unwrap();
        assert_eq!(values, ParameterValues { value: 10, min_value: 0, max_value: 100 });
        assert_eq!(pack_parameter(&values, 1), vec![10, 0, 100]);
    }

    #[test]
    fn wide_fields_are_little_endian() {
        let message = [0x34, 0x12, 0x00, 0x00, 0xFF, 0x00];
        let values = unpack_parameter(&message, 0, 2).unwrap();
        assert_eq!(values.value, 0x1234);
        assert_eq!(values.max_value, 0x00FF);
    }
}
