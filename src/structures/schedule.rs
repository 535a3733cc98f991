//! Weekly schedule decoder/encoder (§3.5, §4.2.5) and the `set_on` helper
//! used to build a day's on/off plan from clock times.

use crate::error::FrameDataError;
use crate::parameters::ParameterValues;
use crate::value::{EventDataType, Value};

pub const SCHEDULE_SIZE: usize = 42; // 6 bytes/day * 7 days
pub const INTERVALS_PER_DAY: usize = 48; // 30-minute increments

/// One day's on/off plan, Sunday-first, in 30-minute increments.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDay(pub [bool; INTERVALS_PER_DAY]);

impl Default for ScheduleDay {
    fn default() -> Self {
        ScheduleDay([false; INTERVALS_PER_DAY])
    }
}

fn parse_time(time: &str) -> Result<usize, FrameDataError> {
    let (hour, minute) = time
        .split_once(':')
        .ok_or_else(|| FrameDataError(format!("invalid time {time:?}")))?;
    let hour: usize = hour.parse().map_err(|_| FrameDataError(format!("invalid hour in {time:?}")))?;
    let minute: usize = minute.parse().map_err(|_| FrameDataError(format!("invalid minute in {time:?}")))?;
    if hour > 23 || (minute != 0 && minute != 30) {
        return Err(FrameDataError(format!("time {time:?} out of range")));
    }
    Ok(hour * 2 + if minute >= 30 { 1 } else { 0 })
}

impl ScheduleDay {
    /// Toggles on every interval from `start` to `end` inclusive. Times are
    /// `"HH:MM"` with `MM` one of `00`/`30`. Fails if `end` precedes `start`.
    pub fn set_on(&mut self, start: &str, end: &str) -> Result<(), FrameDataError> {
        let start_idx = parse_time(start)?;
        let end_idx = parse_time(end)?;
        if end_idx < start_idx {
            return Err(FrameDataError(format!("end {end:?} precedes start {start:?}")));
        }
        for interval in &mut self.0[start_idx..=end_idx] {
            *interval = true;
        }
        Ok(())
    }

    fn split_byte(byte: u8) -> [bool; 8] {
        let mut bits = [false; 8];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = byte & (1 << (7 - i)) != 0;
        }
        bits
    }

    fn join_bits(bits: &[bool]) -> u8 {
        bits.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8)
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        let mut intervals = Vec::with_capacity(INTERVALS_PER_DAY);
        for &byte in bytes {
            intervals.extend_from_slice(&Self::split_byte(byte));
        }
        let mut day = ScheduleDay::default();
        day.0.copy_from_slice(&intervals[..INTERVALS_PER_DAY]);
        day
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.chunks(8).map(Self::join_bits).collect()
    }
}

/// A full weekly plan: 7 days, Sunday first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schedule(pub [ScheduleDay; 7]);

fn unpack_schedule(message: &[u8], offset: usize) -> Schedule {
    let bytes = &message[offset..offset + SCHEDULE_SIZE];
    let days: Vec<ScheduleDay> = bytes.chunks(6).map(ScheduleDay::from_bytes).collect();
    let days: [ScheduleDay; 7] = days.try_into().expect("42-byte bitmap decodes into exactly 7 days");
    Schedule(days)
}

/// Decodes `[_, first_index, count] + count * { index, switch(1B),
/// parameter record, 42-byte bitmap }` (§4.2.5).
pub fn decode(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    use crate::structures::device_parameters::unpack_parameter;

    let start = message[offset + 1];
    let count = message[offset + 2];
    let mut offset = offset + 3;

    let mut schedules = std::collections::HashMap::new();
    let mut parameters = std::collections::HashMap::new();

    for _ in start..start.saturating_add(count) {
        let index = message[offset];
        let switch = ParameterValues { value: message[offset + 1] as u32, min_value: 0, max_value: 1 };
        let parameter = unpack_parameter(message, offset + 2, 1);
        offset += 5;

        let schedule = unpack_schedule(message, offset);
        offset += SCHEDULE_SIZE;

        schedules.insert(index.to_string(), schedule_to_value(&schedule));
        parameters.insert((index as u16 * 2).to_string(), parameter_values_to_value(&switch));
        if let Some(parameter) = parameter {
            parameters.insert((index as u16 * 2 + 1).to_string(), parameter_values_to_value(&parameter));
        }
    }

    data.insert("schedules".to_string(), Value::Map(schedules));
    data.insert("schedule_parameters".to_string(), Value::Map(parameters));
    offset
}

fn parameter_values_to_value(values: &ParameterValues) -> Value {
    Value::Map(std::collections::HashMap::from([
        ("value".to_string(), Value::U32(values.value)),
        ("min_value".to_string(), Value::U32(values.min_value)),
        ("max_value".to_string(), Value::U32(values.max_value)),
    ]))
}

fn schedule_to_value(schedule: &Schedule) -> Value {
    Value::List(
        schedule
            .0
            .iter()
            .map(|day| Value::List(day.0.iter().map(|&b| Value::Bool(b)).collect()))
            .collect(),
    )
}

/// Encodes a `RequestSetSchedule` body: `1, schedule_index, switch,
/// parameter, 42-byte bitmap` (the inverse of [`decode`]'s per-entry shape).
pub fn encode(
    schedule_index: u8,
    switch: bool,
    parameter: u32,
    schedule: &Schedule,
) -> Vec<u8> {
    let mut message = vec![1, schedule_index, switch as u8, parameter as u8];
    for day in &schedule.0 {
        message.extend(day.to_bytes());
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_on_toggles_inclusive_range() {
        let mut day = ScheduleDay::default();
        day.set_on("00:00", "01:00").unwrap();
        assert!(day.0[0] && day.0[1] && day.0[2]);
        assert!(!day.0[3]);
    }

    #[test]
    fn set_on_rejects_reversed_range() {
        let mut day = ScheduleDay::default();
        assert!(day.set_on("01:00", "00:30").is_err());
    }

    #[test]
    fn byte_round_trips_through_split_and_join() {
        let bits = ScheduleDay::split_byte(0b1010_1010);
        assert_eq!(ScheduleDay::join_bits(&bits), 0b1010_1010);
    }
}
