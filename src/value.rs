//! A dynamically typed value carried through the event map and decoded
//! frame payloads.
//!
//! The wire protocol mixes booleans, several integer widths, floats,
//! strings and small nested records in a single keyed payload, and the
//! set of keys a given frame produces depends on runtime state (the
//! regulator-data schema). A closed `enum` is a better fit here than a
//! family of generic containers; callers narrow with the `as_*` helpers.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::Serialize;

use crate::parameters::ParameterValues;
use crate::structures::lambda_sensor::LambdaState;
use crate::structures::modules::ConnectedModules;
use crate::structures::sensor_data::DeviceState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    DeviceState(DeviceState),
    LambdaState(LambdaState),
    Modules(ConnectedModules),
    ParameterValues(ParameterValues),
    FrameVersions(HashMap<u8, u16>),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v as i64),
            Value::I16(v) => Some(v as i64),
            Value::I32(v) => Some(v as i64),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v as i64),
            Value::U16(v) => Some(v as i64),
            Value::U32(v) => Some(v as i64),
            Value::U64(v) => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_parameter_values(&self) -> Option<&ParameterValues> {
        match self {
            Value::ParameterValues(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_frame_versions(&self) -> Option<&HashMap<u8, u16>> {
        match self {
            Value::FrameVersions(v) => Some(v),
            _ => None,
        }
    }

    /// Tolerance-aware comparison used by the `on_change` filter: numeric
    /// values compare with an absolute tolerance of 0.1, everything else
    /// compares with `PartialEq`.
    pub fn significantly_differs_from(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return (a - b).abs() > 0.1;
        }

        self != other
    }
}

macro_rules! impl_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from!(Bool, bool);
impl_from!(I8, i8);
impl_from!(I16, i16);
impl_from!(I32, i32);
impl_from!(I64, i64);
impl_from!(U8, u8);
impl_from!(U16, u16);
impl_from!(U32, u32);
impl_from!(U64, u64);
impl_from!(F32, f32);
impl_from!(F64, f64);
impl_from!(Str, String);
impl_from!(Ipv4, Ipv4Addr);
impl_from!(Ipv6, Ipv6Addr);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// A decoded frame payload: an ordered set of named values.
pub type EventDataType = HashMap<String, Value>;
