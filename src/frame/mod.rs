//! Frame layout, checksum and the closed frame-type enumeration (§4.1, §6.2).

pub mod reader;
pub mod writer;

use crate::error::UnknownFrameError;
use crate::value::EventDataType;

/// Marks the start of every frame on the wire.
pub const FRAME_START: u8 = 0x68;
/// Marks the end of every frame on the wire.
pub const FRAME_END: u8 = 0x16;
/// `START(1) + length(2) + recipient(1) + sender(1) + sender_type(1) + econet_version(1)`.
pub const HEADER_SIZE: usize = 7;
/// Minimum total frame length (header + type + 0-byte message + bcc + end).
pub const MIN_FRAME_LENGTH: u16 = 10;
/// Maximum total frame length accepted by the reader.
pub const MAX_FRAME_LENGTH: u16 = 1000;

pub const ADDR_BROADCAST: u8 = 0x00;
pub const ADDR_ECOMAX: u8 = 0x45;
pub const ADDR_ECOSTER: u8 = 0x51;
pub const ADDR_ECONET: u8 = 0x56;

pub const SENDER_TYPE_ECONET: u8 = 0x30;
pub const ECONET_VERSION: u8 = 0x05;

/// The closed set of frame types understood by the protocol (§6.2).
///
/// Each variant is grouped into one of three categories: a [`Category::Request`]
/// may carry an optional paired response, a [`Category::Response`] is terminal,
/// and a [`Category::Message`] is unsolicited and pushed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    RequestStopMaster,
    RequestStartMaster,
    RequestCheckDevice,
    RequestEcomaxParameters,
    RequestMixerParameters,
    RequestSetEcomaxParameter,
    RequestSetMixerParameter,
    RequestSetThermostatParameter,
    RequestSetSchedule,
    RequestAlerts,
    RequestUid,
    RequestPassword,
    RequestEcomaxControl,
    RequestProgramVersion,
    RequestDataSchema,
    MessageRegulatorData,
    MessageSensorData,
    ResponseDeviceAvailable,
    ResponseEcomaxParameters,
    ResponseMixerParameters,
    ResponseSetEcomaxParameter,
    ResponseSetMixerParameter,
    ResponseAlerts,
    ResponseUid,
    ResponsePassword,
    ResponseEcomaxControl,
    ResponseProgramVersion,
    ResponseRegulatorDataSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Request,
    Response,
    Message,
}

impl FrameType {
    /// Maps a wire `frame_type` byte to its enum variant.
    pub fn from_code(code: u8) -> Result<Self, UnknownFrameError> {
        use FrameType::*;
        Ok(match code {
            0x18 => RequestStopMaster,
            0x19 => RequestStartMaster,
            0x30 => RequestCheckDevice,
            0x31 => RequestEcomaxParameters,
            0x32 => RequestMixerParameters,
            0x33 => RequestSetEcomaxParameter,
            0x34 => RequestSetMixerParameter,
            0x36 => RequestAlerts,
            0x38 => RequestSetThermostatParameter,
            0x39 => RequestUid,
            0x3A => RequestPassword,
            0x3B => RequestEcomaxControl,
            0x3D => RequestSetSchedule,
            0x40 => RequestProgramVersion,
            0x55 => RequestDataSchema,
            0x08 => MessageRegulatorData,
            0x35 => MessageSensorData,
            0xB0 => ResponseDeviceAvailable,
            0xB1 => ResponseEcomaxParameters,
            0xB2 => ResponseMixerParameters,
            0xB3 => ResponseSetEcomaxParameter,
            0xB4 => ResponseSetMixerParameter,
            0xB6 => ResponseAlerts,
            0xB9 => ResponseUid,
            0xBA => ResponsePassword,
            0xBB => ResponseEcomaxControl,
            0xC0 => ResponseProgramVersion,
            0xD5 => ResponseRegulatorDataSchema,
            other => return Err(UnknownFrameError(other)),
        })
    }

    pub fn code(self) -> u8 {
        use FrameType::*;
        match self {
            RequestStopMaster => 0x18,
            RequestStartMaster => 0x19,
            RequestCheckDevice => 0x30,
            RequestEcomaxParameters => 0x31,
            RequestMixerParameters => 0x32,
            RequestSetEcomaxParameter => 0x33,
            RequestSetMixerParameter => 0x34,
            RequestAlerts => 0x36,
            RequestSetThermostatParameter => 0x38,
            RequestUid => 0x39,
            RequestPassword => 0x3A,
            RequestEcomaxControl => 0x3B,
            RequestSetSchedule => 0x3D,
            RequestProgramVersion => 0x40,
            RequestDataSchema => 0x55,
            MessageRegulatorData => 0x08,
            MessageSensorData => 0x35,
            ResponseDeviceAvailable => 0xB0,
            ResponseEcomaxParameters => 0xB1,
            ResponseMixerParameters => 0xB2,
            ResponseSetEcomaxParameter => 0xB3,
            ResponseSetMixerParameter => 0xB4,
            ResponseAlerts => 0xB6,
            ResponseUid => 0xB9,
            ResponsePassword => 0xBA,
            ResponseEcomaxControl => 0xBB,
            ResponseProgramVersion => 0xC0,
            ResponseRegulatorDataSchema => 0xD5,
        }
    }

    pub fn category(self) -> Category {
        use FrameType::*;
        match self {
            RequestStopMaster | RequestStartMaster | RequestCheckDevice
            | RequestEcomaxParameters | RequestMixerParameters | RequestSetEcomaxParameter
            | RequestSetMixerParameter | RequestSetThermostatParameter | RequestSetSchedule
            | RequestAlerts | RequestUid | RequestPassword | RequestEcomaxControl
            | RequestProgramVersion | RequestDataSchema => Category::Request,
            MessageRegulatorData | MessageSensorData => Category::Message,
            ResponseDeviceAvailable
            | ResponseEcomaxParameters
            | ResponseMixerParameters
            | ResponseSetEcomaxParameter
            | ResponseSetMixerParameter
            | ResponseAlerts
            | ResponseUid
            | ResponsePassword
            | ResponseEcomaxControl
            | ResponseProgramVersion
            | ResponseRegulatorDataSchema => Category::Response,
        }
    }

    /// Request frame type expected to be re-issued when a `frame_versions`
    /// update reports a new version of the corresponding response (§4.3.3).
    pub fn request_for_response(self) -> Option<Self> {
        use FrameType::*;
        Some(match self {
            ResponseEcomaxParameters => RequestEcomaxParameters,
            ResponseMixerParameters => RequestMixerParameters,
            ResponseAlerts => RequestAlerts,
            ResponseUid => RequestUid,
            ResponsePassword => RequestPassword,
            ResponseRegulatorDataSchema => RequestDataSchema,
            _ => return None,
        })
    }
}

/// A single frame exchanged on the wire.
///
/// Exactly one of `message`/`data` is authoritative; the other is derived
/// lazily. Construct with [`Frame::from_message`] when bytes were just read
/// off the wire, or with [`Frame::from_data`] when synthesizing a frame to
/// send.
#[derive(Debug, Clone)]
pub struct Frame {
    pub frame_type: FrameType,
    pub recipient: u8,
    pub sender: u8,
    pub sender_type: u8,
    pub econet_version: u8,
    message: Option<Vec<u8>>,
    data: Option<EventDataType>,
}

impl Frame {
    pub fn from_message(frame_type: FrameType, sender: u8, recipient: u8, message: Vec<u8>) -> Self {
        Self {
            frame_type,
            recipient,
            sender,
            sender_type: SENDER_TYPE_ECONET,
            econet_version: ECONET_VERSION,
            message: Some(message),
            data: None,
        }
    }

    pub fn from_data(frame_type: FrameType, recipient: u8, data: EventDataType) -> Self {
        Self {
            frame_type,
            recipient,
            sender: ADDR_ECONET,
            sender_type: SENDER_TYPE_ECONET,
            econet_version: ECONET_VERSION,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_sender(mut self, sender: u8) -> Self {
        self.sender = sender;
        self
    }

    pub fn set_sender_type(&mut self, sender_type: u8) {
        self.sender_type = sender_type;
    }

    pub fn set_econet_version(&mut self, econet_version: u8) {
        self.econet_version = econet_version;
    }

    /// Returns the raw message bytes, encoding from `data` if necessary.
    pub fn message(&mut self) -> Result<&[u8], crate::error::FrameDataError> {
        if self.message.is_none() {
            let data = self.data.clone().unwrap_or_default();
            let encoded = crate::frames::encode(self.frame_type, &data)?;
            self.message = Some(encoded);
        }
        Ok(self.message.as_deref().unwrap())
    }

    /// Returns the decoded data, decoding from `message` if necessary.
    pub fn data(&mut self) -> Result<&EventDataType, crate::error::Error> {
        if self.data.is_none() {
            let message = self.message.clone().unwrap_or_default();
            let decoded = crate::frames::decode(self.frame_type, &message)?;
            self.data = Some(decoded);
        }
        Ok(self.data.as_ref().unwrap())
    }

    /// Serializes the full frame, including header, bcc and end delimiter.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, crate::error::FrameDataError> {
        let message = self.message()?.to_vec();
        let length = (HEADER_SIZE + 1 + message.len() + 1 + 1) as u16;
        let mut buffer = Vec::with_capacity(length as usize);
        buffer.push(FRAME_START);
        buffer.extend_from_slice(&length.to_le_bytes());
        buffer.push(self.recipient);
        buffer.push(self.sender);
        buffer.push(self.sender_type);
        buffer.push(self.econet_version);
        buffer.push(self.frame_type.code());
        buffer.extend_from_slice(&message);
        buffer.push(bcc(&buffer));
        buffer.push(FRAME_END);
        Ok(buffer)
    }
}

/// Block check character: XOR of all given bytes.
pub fn bcc(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcc_is_xor_of_all_bytes() {
        assert_eq!(bcc(&[0x01, 0x02, 0x03]), 0x01 ^ 0x02 ^ 0x03);
    }

    #[test]
    fn frame_type_round_trips_through_code() {
        for code in [0x18u8, 0x30, 0x35, 0xB0, 0xC0, 0xD5] {
            let ft = FrameType::from_code(code).unwrap();
            assert_eq!(ft.code(), code);
        }
    }

    #[test]
    fn unknown_frame_type_is_reported() {
        assert!(FrameType::from_code(0xEE).is_err());
    }
}
