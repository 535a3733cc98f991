//! Frame-version table decoder (§4.2.6): which version of each frame type a
//! device last reported, consumed by the dispatcher's re-fetch logic
//! (§4.3.3).

use std::collections::HashMap;

use crate::value::{EventDataType, Value};

/// Decodes `[count:u8] + count * [frame_type:u8, version:u16 LE]`, returning
/// the new offset.
pub fn decode(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let mut offset = offset;
    let count = message[offset];
    offset += 1;

    let mut versions = HashMap::with_capacity(count as usize);
    for _ in 0..count {
        let frame_type = message[offset];
        let version = u16::from_le_bytes([message[offset + 1], message[offset + 2]]);
        versions.insert(frame_type, version);
        offset += 3;
    }

    data.insert("frame_versions".to_string(), Value::FrameVersions(versions));
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pairs_little_endian() {
        let message = [0x02, 0x36, 0x01, 0x00, 0x39, 0x34, 0x12];
        let mut data = EventDataType::new();
        let offset = decode(&message, 0, &mut data);
        assert_eq!(offset, 7);
        let versions = data.get("frame_versions").unwrap().as_frame_versions().unwrap();
        assert_eq!(versions.get(&0x36), Some(&1));
        assert_eq!(versions.get(&0x39), Some(&0x1234));
    }
}
