//! Alert log decoder (`RESPONSE_ALERTS`).

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::value::{EventDataType, Value};

const ALERT_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub code: u8,
    pub from: i64,
    pub to: Option<i64>,
}

/// Converts a relative-seconds timestamp (seconds since 2000-01-01) to a
/// Unix timestamp, matching the original decoder's calendar arithmetic.
fn convert_to_unix(seconds: u32) -> i64 {
    let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    (epoch.naive_utc() + chrono::Duration::seconds(seconds as i64))
        .and_utc()
        .timestamp()
}

fn read_u32(message: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([message[offset], message[offset + 1], message[offset + 2], message[offset + 3]])
}

fn is_present(record: &[u8]) -> bool {
    record.iter().any(|&b| b != 0xFF)
}

fn unpack_alert(message: &[u8], offset: usize) -> Alert {
    let code = message[offset];
    let from = convert_to_unix(read_u32(message, offset + 1));
    let to_record = &message[offset + 5..offset + ALERT_SIZE];
    let to = is_present(to_record).then(|| convert_to_unix(read_u32(message, offset + 5)));
    Alert { code, from, to }
}

/// Decodes `[_, start, count] + count * 9-byte alert record`, returning the
/// new offset.
pub fn decode(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let start = message[offset + 1];
    let count = message[offset + 2];
    let mut offset = offset + 3;

    let mut alerts = Vec::new();
    for _ in start..start.saturating_add(count) {
        alerts.push(unpack_alert(message, offset));
        offset += ALERT_SIZE;
    }

    data.insert(
        "alerts".to_string(),
        Value::List(
            alerts
                .into_iter()
                .map(|a| {
                    let mut m = std::collections::HashMap::new();
                    m.insert("code".to_string(), Value::U8(a.code));
                    m.insert("from".to_string(), Value::I64(a.from));
                    if let Some(to) = a.to {
                        m.insert("to".to_string(), Value::I64(to));
                    }
                    Value::Map(m)
                })
                .collect(),
        ),
    );

    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_open_alert() {
        let mut message = vec![0x00, 0x00, 0x01];
        message.push(5); // code
        message.extend_from_slice(&100u32.to_le_bytes()); // from
        message.extend_from_slice(&[0xFF; 4]); // to absent
        let mut data = EventDataType::new();
        let offset = decode(&message, 0, &mut data);
        assert_eq!(offset, message.len());
        let alerts = data.get("alerts").unwrap();
        if let Value::List(list) = alerts {
            assert_eq!(list.len(), 1);
        } else {
            panic!("expected list");
        }
    }
}
