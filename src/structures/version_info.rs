//! Program-version payload (`RESPONSE_PROGRAM_VERSION`, §6.4).

use crate::error::FrameDataError;

#[derive(Debug, Clone, PartialEq)]
pub struct VersionInfo {
    pub version: String,
    pub struct_tag: [u8; 2],
    pub struct_version: u8,
    pub device_id: [u8; 2],
    pub processor_signature: [u8; 3],
    pub sender: u8,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            struct_tag: [0xFF, 0xFF],
            struct_version: 5,
            device_id: [0x7A, 0x00],
            processor_signature: [0x00, 0x00, 0x00],
            sender: crate::frame::ADDR_ECONET,
        }
    }
}

/// Encodes `"<2s B 2s 3s 3H B"` little-endian, per §6.4.
pub fn encode(info: &VersionInfo) -> Result<Vec<u8>, FrameDataError> {
    let parts: Vec<&str> = info.version.split('.').collect();
    if parts.len() != 3 {
        return Err(FrameDataError(format!(
            "version {:?} must have exactly 3 dot-separated components",
            info.version
        )));
    }
    let mut components = [0u16; 3];
    for (i, p) in parts.iter().enumerate() {
        components[i] = p
            .parse()
            .map_err(|_| FrameDataError(format!("invalid version component {p:?}")))?;
    }

    let mut message = Vec::with_capacity(15);
    message.extend_from_slice(&info.struct_tag);
    message.push(info.struct_version);
    message.extend_from_slice(&info.device_id);
    message.extend_from_slice(&info.processor_signature);
    for c in components {
        message.extend_from_slice(&c.to_le_bytes());
    }
    message.push(info.sender);
    Ok(message)
}

pub fn decode(message: &[u8]) -> Result<VersionInfo, FrameDataError> {
    if message.len() < 15 {
        return Err(FrameDataError("program version payload too short".to_string()));
    }
    let struct_tag = [message[0], message[1]];
    let struct_version = message[2];
    let device_id = [message[3], message[4]];
    let processor_signature = [message[5], message[6], message[7]];
    let major = u16::from_le_bytes([message[8], message[9]]);
    let minor = u16::from_le_bytes([message[10], message[11]]);
    let patch = u16::from_le_bytes([message[12], message[13]]);
    let sender = message[14];

    Ok(VersionInfo {
        version: format!("{major}.{minor}.{patch}"),
        struct_tag,
        struct_version,
        device_id,
        processor_signature,
        sender,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_reference_vector() {
        let info = VersionInfo {
            version: "1.0.0".to_string(),
            sender: 0x56,
            ..VersionInfo::default()
        };
        let bytes = encode(&info).unwrap();
        assert_eq!(
            bytes,
            vec![
                0xFF, 0xFF, 0x05, 0x7A, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x56
            ]
        );
    }

    #[test]
    fn round_trips() {
        let info = VersionInfo {
            version: "3.2.1".to_string(),
            sender: 0x45,
            ..VersionInfo::default()
        };
        let bytes = encode(&info).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.version, "3.2.1");
        assert_eq!(decoded.sender, 0x45);
    }
}
