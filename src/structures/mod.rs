//! The zoo of binary structure decoders carried inside sensor-data,
//! regulator-data, parameter-table, schedule, alert and product-info
//! frames (§4.2).

pub mod alerts;
pub mod device_parameters;
pub mod ecomax_parameters;
pub mod frame_versions;
pub mod lambda_sensor;
pub mod mixer_parameters;
pub mod modules;
pub mod network_info;
pub mod product_info;
pub mod regulator_data;
pub mod regulator_data_schema;
pub mod schedule;
pub mod sensor_data;
pub mod thermostat_parameters;
pub mod uid;
pub mod version_info;

/// A byte value meaning "this optional field is absent" across several
/// structures (fuel level, boiler load, module versions, ...).
pub const BYTE_UNDEFINED: u8 = 0xFF;
