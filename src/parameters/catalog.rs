//! Static, ordered parameter catalogs per product variant (§4.4.3). Index
//! into these tables with the wire-level parameter index; a product-specific
//! override table (see [`super::custom`]) may replace individual entries by
//! name.

use super::ParameterDescription as D;

/// ecoMAX-P (pellet boiler) ecoMAX parameter table, in wire order.
pub const ECOMAX_P_PARAMETERS: &[D] = &[
    D::number("airflow_power_100"),
    D::number("airflow_power_50"),
    D::number("airflow_power_30"),
    D::number("power_100"),
    D::number("power_50"),
    D::number("power_30"),
    D::number("max_fan_boiler_power"),
    D::number("min_fan_boiler_power"),
    D::number("fuel_feeding_time_100"),
    D::number("fuel_feeding_time_50"),
    D::number("fuel_feeding_time_30"),
    D::number("fuel_feeding_break_100"),
    D::number("fuel_feeding_break_50"),
    D::number("fuel_feeding_break_30"),
    D::number("cycle_time"),
    D::number("h2_hysteresis"),
    D::number("h1_hysteresis"),
    D::number("heating_hysteresis"),
    D::switch("fuzzy_logic"),
    D::number("min_fuzzy_logic_power"),
    D::number("max_fuzzy_logic_power"),
    D::number("min_boiler_power"),
    D::number("max_boiler_power"),
    D::number("min_fan_power"),
    D::number("max_fan_power"),
    D::number("reduction_airflow_temp"),
    D::number("fan_power_gain"),
    D::number("fuel_flow_correction_fuzzy_logic"),
    D::number("fuel_flow_correction"),
    D::number("airflow_correction_100"),
    D::number("feeder_correction_100"),
    D::number("airflow_correction_50"),
    D::number("feeder_correction_50"),
    D::number("airflow_correction_30"),
    D::number("feeder_correction_30"),
    D::number("heating_target_temp"),
    D::number("min_heating_target_temp"),
    D::number("max_heating_target_temp"),
    D::number("heating_pump_on_temp"),
    D::switch("heating_weather_control"),
    D::number("heating_heat_curve").with_multiplier(10),
    D::number("heating_heat_curve_shift").with_multiplier(10),
    D::number("water_heater_target_temp"),
    D::number("min_water_heater_target_temp"),
    D::number("max_water_heater_target_temp"),
    D::number("water_heater_work_mode"),
    D::number("water_heater_hysteresis"),
    D::switch("water_heater_disinfection"),
    D::number("summer_mode"),
    D::number("summer_mode_on_temp"),
    D::number("summer_mode_off_temp"),
    D::switch("circulation_control"),
    D::number("circulation_pause_time"),
    D::number("circulation_work_time"),
    D::number("circulation_start_temp"),
    D::number("buffer_control"),
    D::number("max_buffer_temp"),
    D::number("min_buffer_temp"),
    D::number("buffer_hysteresis"),
];

/// ecoMAX-I (installation/heat-source) ecoMAX parameter table.
pub const ECOMAX_I_PARAMETERS: &[D] = &[
    D::number("water_heater_target_temp"),
    D::switch("water_heater_priority"),
    D::number("water_heater_support"),
    D::number("min_water_heater_target_temp"),
    D::number("max_water_heater_target_temp"),
    D::number("water_heater_feeding_extension_time"),
    D::number("water_heater_hysteresis"),
    D::switch("water_heater_disinfection"),
    D::number("water_heater_work_mode"),
    D::switch("solar_support"),
    D::number("solar_pump_on_delta_temp").with_multiplier(10),
    D::number("solar_pump_off_delta_temp").with_multiplier(10),
    D::number("min_collector_temp"),
    D::number("max_collector_temp"),
    D::number("collector_off_temp"),
    D::number("min_pump_revolutions"),
    D::number("solar_antifreeze"),
    D::switch("circulation_control"),
    D::number("circulation_pause_time"),
    D::number("circulation_work_time"),
    D::number("circulation_start_temp"),
];

/// Per-mixer parameter table (§4.2.5), shared across all mixer indices.
pub const MIXER_PARAMETERS: &[D] = &[
    D::number("mix_target_temp"),
    D::number("min_mix_target_temp"),
    D::number("max_mix_target_temp"),
    D::number("low_mix_target_temp"),
    D::switch("ctrl_weather_mix"),
    D::number("mix_heat_curve").with_multiplier(10),
    D::number("parallel_offset_heat_curve"),
    D::number("weather_temp_factor"),
    D::number("mix_operation"),
    D::number("mix_insensitivity"),
    D::number("mix_therm_operation"),
    D::number("mix_therm_mode"),
    D::switch("mix_off_therm_pump"),
    D::switch("mix_summer_work"),
];

/// Profile parameter (index 0) plus per-thermostat table. Entries ending in
/// `target_temp` are wire-width 2 (§4.2.5); everything else is 1.
pub const THERMOSTAT_PROFILE: D = D::number("thermostat_profile");

pub const THERMOSTAT_PARAMETERS: &[D] = &[
    D::number("mode"),
    D::number("party_target_temp").with_size(2),
    D::number("summer_target_temp").with_size(2),
    D::number("correction"),
    D::number("away_timer"),
    D::number("vent_timer"),
    D::number("party_timer"),
    D::number("holiday_timer"),
    D::number("hysteresis"),
    D::number("day_target_temp").with_size(2),
    D::number("night_target_temp").with_size(2),
    D::number("antifreeze_target_temp").with_size(2),
    D::number("heating_target_temp").with_size(2),
    D::number("heating_timer"),
    D::number("off_timer"),
];

/// Schedule names, in the order their `(switch, parameter)` pairs are keyed
/// (§3.5): `index * 2` is the switch, `index * 2 + 1` is the parameter.
pub const SCHEDULES: &[&str] = &[
    "heating",
    "water_heater",
    "circulation_pump",
    "boiler_work",
    "boiler_clean",
    "hear_exchanger_clean",
    "mixer_1",
    "mixer_2",
    "mixer_3",
    "mixer_4",
    "mixer_5",
    "mixer_6",
    "mixer_7",
    "mixer_8",
    "mixer_9",
    "mixer_10",
    "thermostat_1",
    "thermostat_2",
    "thermostat_3",
    "circuit_1",
    "circuit_2",
    "circuit_3",
    "circuit_4",
    "circuit_5",
    "circuit_6",
    "circuit_7",
    "panel_1",
    "panel_2",
    "panel_3",
    "panel_4",
    "panel_5",
    "panel_6",
    "panel_7",
    "main_heater_solar",
    "heating_circulation",
    "internal_thermostat",
    "heater",
    "water_heater_2",
    "intake",
    "intake_summer",
];
