use crate::plate::Plate;
use crate::plate_format::PlateFormat;
use crate::units::{self, ConcentrationUnit};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DilutionScale {
    Log,
    Linear,
}

/// User input for the dilution series generator. `start`/`end` name the two
/// endpoints of the line to fill; concentrations are in `unit` and converted
/// to µM before computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DilutionRequest {
    pub start: String,
    pub end: String,
    pub compound: String,
    #[serde(default)]
    pub mw: f64,
    pub scale: DilutionScale,
    pub start_conc: f64,
    #[serde(default)]
    pub end_conc: Option<f64>,
    #[serde(default)]
    pub factor: Option<f64>,
    #[serde(default)]
    pub unit: ConcentrationUnit,
}

/// Concentration after `step` serial dilutions of `start` at `factor`.
/// A non-positive factor collapses every step after the first to 0; this is
/// accepted input, not an error.
pub fn serial_concentration(start: f64, factor: f64, step: usize) -> f64 {
    if step == 0 {
        return start;
    }
    if factor <= 0.0 {
        return 0.0;
    }
    start / factor.powi(step as i32)
}

/// The concentration series for `n` wells, in µM.
pub fn dilution_series(
    scale: DilutionScale,
    start_um: f64,
    end_um: f64,
    factor: f64,
    n: usize,
) -> Vec<f64> {
    (0..n)
        .map(|i| match scale {
            DilutionScale::Log => serial_concentration(start_um, factor, i),
            DilutionScale::Linear => {
                if n > 1 {
                    start_um + (end_um - start_um) * i as f64 / (n - 1) as f64
                } else {
                    start_um
                }
            }
        })
        .collect()
}

/// Derives a new plate with the dilution series applied along the line from
/// `start` to `end`. Each well on the line receives its computed µM
/// concentration, the compound name, and the molecular weight; everything
/// else is untouched. Fails before touching anything if the endpoints are
/// not collinear or a mass-unit input lacks a molecular weight.
pub fn generate_dilution(
    format: &PlateFormat,
    plate: &Plate,
    request: &DilutionRequest,
) -> Result<Plate, String> {
    let line = format
        .well_range(&request.start, &request.end)
        .ok_or_else(|| "Selection must be a single row or column".to_string())?;

    let mut start_um = request.start_conc;
    let mut end_um = request.end_conc.unwrap_or(0.0);
    if request.unit == ConcentrationUnit::Mass {
        if request.mw <= 0.0 {
            return Err("Molecular weight required to perform dilution in mass units".to_string());
        }
        start_um = units::mass_to_molar(start_um, request.mw);
        end_um = units::mass_to_molar(end_um, request.mw);
    }

    let factor = request.factor.unwrap_or(1.0);
    let series = dilution_series(request.scale, start_um, end_um, factor, line.len());

    let mut next = plate.clone();
    for (id, conc) in line.iter().zip(series) {
        let well = next
            .well_mut(format, id)
            .ok_or_else(|| format!("Well '{id}' not found on the plate"))?;
        well.concentration = conc;
        well.compound = request.compound.clone();
        well.mw = request.mw;
        well.slot = None;
    }
    Ok(next)
}
