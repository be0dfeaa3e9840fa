use serde::{Deserialize, Serialize};

/// The unit system a concentration is entered or displayed in.
/// Storage is always micromolar; this only affects parsing and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcentrationUnit {
    #[default]
    Molar,
    Mass,
}

const UNITS_MOLAR: [&str; 3] = ["µM", "nM", "pM"];
const UNITS_MASS: [&str; 3] = ["µg/mL", "ng/mL", "pg/mL"];

/// Converts µg/mL to µM. A non-positive molecular weight yields 0,
/// which callers must treat as "conversion not possible".
pub fn mass_to_molar(value_ug_per_ml: f64, mw: f64) -> f64 {
    if mw <= 0.0 {
        return 0.0;
    }
    value_ug_per_ml * 1000.0 / mw
}

/// Converts µM to µg/mL. Inverse of [`mass_to_molar`].
pub fn molar_to_mass(value_um: f64, mw: f64) -> f64 {
    if mw <= 0.0 {
        return 0.0;
    }
    value_um * mw / 1000.0
}

fn format_value_with_unit(value: f64, units: &[&str]) -> String {
    if value <= 0.0 {
        return String::new();
    }
    let mut display = value;
    let mut unit_index = 0;
    while display > 0.0 && display < 1.0 && unit_index < units.len() - 1 {
        display *= 1000.0;
        unit_index += 1;
    }
    format!("{display:.2} {}", units[unit_index])
}

/// Formats a stored µM concentration for display, auto-scaling to the
/// best-fitting metric prefix. Values ≤ 0 produce an empty string, never "0".
/// Purely presentational; never use the output to decide storage values.
pub fn format_concentration(value_um: f64, mw: f64, unit: ConcentrationUnit) -> String {
    if value_um <= 0.0 {
        return String::new();
    }
    match unit {
        ConcentrationUnit::Molar => format_value_with_unit(value_um, &UNITS_MOLAR),
        ConcentrationUnit::Mass => {
            if mw <= 0.0 {
                return "N/A".to_string();
            }
            format_value_with_unit(molar_to_mass(value_um, mw), &UNITS_MASS)
        }
    }
}

/// The unit symbol for values entered in `unit`, before any auto-scaling.
pub fn base_unit_symbol(unit: ConcentrationUnit) -> &'static str {
    match unit {
        ConcentrationUnit::Molar => UNITS_MOLAR[0],
        ConcentrationUnit::Mass => UNITS_MASS[0],
    }
}
