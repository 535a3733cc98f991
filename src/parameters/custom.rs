//! Product-specific parameter overrides (§4.4.3 last sentence): data, not
//! code, looked up by canonical product model name to repurpose slots on
//! firmware whose parameter order deviates from the catalog.

use super::ParameterDescription;

pub struct Override {
    pub original: &'static str,
    pub replacement: ParameterDescription,
}

pub struct CustomParameters {
    pub model: &'static str,
    pub replacements: &'static [Override],
}

/// Replacements for the ecoMAX 860D3-HB, whose firmware repurposes several
/// water-heater/summer-mode slots in the ecoMAX-P table.
pub const ECOMAX_860D3_HB: CustomParameters = CustomParameters {
    model: "ecoMAX 860D3-HB",
    replacements: &[
        Override {
            original: "summer_mode_disable_temp",
            replacement: ParameterDescription::number("__unknown_parameter_1"),
        },
        Override {
            original: "water_heater_target_temp",
            replacement: ParameterDescription::number("summer_mode"),
        },
        Override {
            original: "min_water_heater_target_temp",
            replacement: ParameterDescription::number("summer_mode_enable_temp"),
        },
        Override {
            original: "max_water_heater_target_temp",
            replacement: ParameterDescription::number("summer_mode_disable_temp"),
        },
        Override {
            original: "disable_pump_on_thermostat",
            replacement: ParameterDescription::number("water_heater_target_temp"),
        },
        Override {
            original: "boiler_alert_temp",
            replacement: ParameterDescription::number("min_water_heater_target_temp"),
        },
        Override {
            original: "max_feeder_temp",
            replacement: ParameterDescription::number("max_water_heater_target_temp"),
        },
        Override {
            original: "water_heater_work_mode",
            replacement: ParameterDescription::number("water_heater_feeding_extension"),
        },
        Override {
            original: "external_boiler_temp",
            replacement: ParameterDescription::number("water_heater_work_mode"),
        },
        Override {
            original: "alert_notify",
            replacement: ParameterDescription::number("water_heater_hysteresis"),
        },
        Override {
            original: "pump_hysteresis",
            replacement: ParameterDescription::switch("water_heater_disinfection"),
        },
    ],
};

const KNOWN_OVERRIDES: &[&CustomParameters] = &[&ECOMAX_860D3_HB];

/// Looks up the override table for a canonicalized product model name, if
/// any firmware-specific replacement is known for it.
pub fn lookup(model: &str) -> Option<&'static CustomParameters> {
    KNOWN_OVERRIDES.iter().copied().find(|c| c.model == model)
}

/// Applies an override table to a catalog, replacing entries by name.
pub fn apply(catalog: &[ParameterDescription], overrides: &CustomParameters) -> Vec<ParameterDescription> {
    catalog
        .iter()
        .map(|original| {
            overrides
                .replacements
                .iter()
                .find(|o| o.original == original.name)
                .map(|o| o.replacement)
                .unwrap_or(*original)
        })
        .collect()
}
