use crate::dilution::serial_concentration;
use crate::plate::Plate;
use crate::plate_format::PlateFormat;
use crate::units::{self, ConcentrationUnit};
use crate::well::{CheckerboardSlot, ControlType, Well};
use serde::{Deserialize, Serialize};

pub const GROWTH_CONTROL_LABEL: &str = "Growth Control";

const DEFAULT_COLOR_A: &str = "#1d91c0";
const DEFAULT_COLOR_B: &str = "#e31a1c";

/// Derived description of a generated checkerboard, kept alongside the plate
/// so read-side interpretation (colors, per-drug reports) never has to be
/// reconstructed from free-text compound names. All concentrations in µM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerboardConfig {
    pub drug_a_name: String,
    pub drug_b_name: String,
    pub max_conc_a: f64,
    pub max_conc_b: f64,
    pub factor: f64,
    pub color_a: String,
    pub color_b: String,
    pub mw_a: f64,
    pub mw_b: f64,
}

impl CheckerboardConfig {
    pub fn combination_compound(&self) -> String {
        format!("{} + {}", self.drug_a_name, self.drug_b_name)
    }

    /// Drug B's concentration in a given column. Combination wells store
    /// only drug A's concentration; drug B's is derived from column
    /// position: highest in the last column, one dilution step per column
    /// moving left.
    pub fn conc_b_for_column(&self, col_index: usize, cols: usize) -> f64 {
        if col_index >= cols {
            return 0.0;
        }
        serial_concentration(self.max_conc_b, self.factor, cols - 1 - col_index)
    }
}

/// User input for the checkerboard generator. Concentrations are in the
/// per-drug display unit and converted to µM before layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerboardRequest {
    pub drug_a: String,
    pub conc_a: f64,
    #[serde(default)]
    pub unit_a: ConcentrationUnit,
    #[serde(default)]
    pub mw_a: f64,
    pub drug_b: String,
    pub conc_b: f64,
    #[serde(default)]
    pub unit_b: ConcentrationUnit,
    #[serde(default)]
    pub mw_b: f64,
    pub factor: f64,
    #[serde(default = "default_color_a")]
    pub color_a: String,
    #[serde(default = "default_color_b")]
    pub color_b: String,
}

fn default_color_a() -> String {
    DEFAULT_COLOR_A.to_string()
}

fn default_color_b() -> String {
    DEFAULT_COLOR_B.to_string()
}

fn to_canonical(
    conc: f64,
    unit: ConcentrationUnit,
    mw: f64,
    drug: &str,
) -> Result<f64, String> {
    match unit {
        ConcentrationUnit::Molar => Ok(conc),
        ConcentrationUnit::Mass => {
            if mw <= 0.0 {
                return Err(format!("Molecular weight required for {drug} to use mass units"));
            }
            Ok(units::mass_to_molar(conc, mw))
        }
    }
}

/// Lays out a full two-drug orthogonal titration on the 96-well format.
///
/// Drug A is serially diluted down rows A-G, identical across all columns;
/// row H carries drug B alone. Drug B is serially diluted across columns
/// 2-12 (highest in column 12); column 1 carries no drug B. Combination
/// wells (rows A-G, columns 2-12) are labeled `"<A> + <B>"` and store drug
/// A's concentration only; drug B's value is derived per column via
/// [`CheckerboardConfig::conc_b_for_column`]. H1 becomes the positive
/// growth control with concentration and molecular weight forced to 0.
pub fn generate_checkerboard(
    format: &PlateFormat,
    request: &CheckerboardRequest,
) -> Result<(Plate, CheckerboardConfig), String> {
    if format.rows() != 8 || format.cols() != 12 {
        return Err(format!(
            "Checkerboard layout requires the 8x12 96-well format, got {}x{}",
            format.rows(),
            format.cols()
        ));
    }

    let max_conc_a = to_canonical(request.conc_a, request.unit_a, request.mw_a, &request.drug_a)?;
    let max_conc_b = to_canonical(request.conc_b, request.unit_b, request.mw_b, &request.drug_b)?;

    let config = CheckerboardConfig {
        drug_a_name: request.drug_a.clone(),
        drug_b_name: request.drug_b.clone(),
        max_conc_a,
        max_conc_b,
        factor: request.factor,
        color_a: request.color_a.clone(),
        color_b: request.color_b.clone(),
        mw_a: request.mw_a,
        mw_b: request.mw_b,
    };

    let rows = format.rows();
    let cols = format.cols();
    let mut plate = Plate::new(format);

    // Drug A down rows A-G, full dilution step per row, all columns.
    for row in 0..rows - 1 {
        let conc_a = serial_concentration(max_conc_a, config.factor, row);
        for col in 0..cols {
            if let Some(id) = format.well_id(row, col) {
                if let Some(well) = plate.well_mut(format, &id) {
                    well.compound = config.drug_a_name.clone();
                    well.concentration = conc_a;
                    well.mw = config.mw_a;
                    well.slot = Some(CheckerboardSlot::DrugA);
                }
            }
        }
    }

    // Drug B across columns 2-12: combination wells in rows A-G keep drug
    // A's stored concentration, row H carries drug B alone.
    for col in 1..cols {
        let conc_b = config.conc_b_for_column(col, cols);
        for row in 0..rows {
            if let Some(id) = format.well_id(row, col) {
                if let Some(well) = plate.well_mut(format, &id) {
                    if row < rows - 1 {
                        well.compound = config.combination_compound();
                        well.slot = Some(CheckerboardSlot::Combination);
                    } else {
                        well.compound = config.drug_b_name.clone();
                        well.concentration = conc_b;
                        well.mw = config.mw_b;
                        well.slot = Some(CheckerboardSlot::DrugB);
                    }
                }
            }
        }
    }

    // H1: designated growth control.
    if let Some(id) = format.well_id(rows - 1, 0) {
        if let Some(well) = plate.well_mut(format, &id) {
            well.compound = GROWTH_CONTROL_LABEL.to_string();
            well.control_type = ControlType::Positive;
            well.concentration = 0.0;
            well.mw = 0.0;
            well.slot = None;
        }
    }

    Ok((plate, config))
}

/// Classifies a well against a checkerboard config: the explicit slot tag
/// wins; name equality is the fallback for layouts supplied by external
/// collaborators, which carry no tag.
pub fn classify_well(well: &Well, config: &CheckerboardConfig) -> Option<CheckerboardSlot> {
    if let Some(slot) = well.slot {
        return Some(slot);
    }
    if well.compound.is_empty() {
        return None;
    }
    if well.compound == config.drug_a_name {
        Some(CheckerboardSlot::DrugA)
    } else if well.compound == config.drug_b_name {
        Some(CheckerboardSlot::DrugB)
    } else if well.compound == config.combination_compound() {
        Some(CheckerboardSlot::Combination)
    } else {
        None
    }
}

/// Both drugs' effective values in a combination well, for tooltips and
/// tabular reports. `None` for anything that is not a combination well.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationReport {
    pub drug_a: String,
    pub conc_a_um: f64,
    pub mw_a: f64,
    pub drug_b: String,
    pub conc_b_um: f64,
    pub mw_b: f64,
}

pub fn combination_report(
    well: &Well,
    config: &CheckerboardConfig,
    format: &PlateFormat,
) -> Option<CombinationReport> {
    if classify_well(well, config) != Some(CheckerboardSlot::Combination) {
        return None;
    }
    let (_, col_index) = format.parse_well_id(&well.id)?;
    Some(CombinationReport {
        drug_a: config.drug_a_name.clone(),
        conc_a_um: well.concentration,
        mw_a: config.mw_a,
        drug_b: config.drug_b_name.clone(),
        conc_b_um: config.conc_b_for_column(col_index, format.cols()),
        mw_b: config.mw_b,
    })
}

/// Fixed-template protocol document for the generated assay. Pure literal
/// substitution: stock concentrations at 4x and 8x the highest final
/// concentrations, in the units the request was entered in.
pub fn generate_protocol(request: &CheckerboardRequest) -> String {
    let unit_a = units::base_unit_symbol(request.unit_a);
    let unit_b = units::base_unit_symbol(request.unit_b);
    let stock_sa = format!("{:.2}", request.conc_a * 4.0);
    let stock_2xsa = format!("{:.2}", request.conc_a * 8.0);
    let stock_sb = format!("{:.2}", request.conc_b * 4.0);
    let drug_a = &request.drug_a;
    let drug_b = &request.drug_b;
    let factor = request.factor;

    format!(
        "Method Protocol: Drug Combination Study by Checkerboard Assay
Protocol adapted from: Bellio, P., Fagnani, L., Nazzicone, L., & Celenza, G. (2021). New and simplified method for drug combination studies by checkerboard assay. MethodsX, 8, 101543. https://doi.org/10.1016/j.mex.2021.101543

Required Stock Solutions:
- {drug_a} (Stock SA, 4x): Prepare a {stock_sa} {unit_a} solution in 2xCAMHB.
- {drug_a} (Stock 2xSA, 8x): Prepare a {stock_2xsa} {unit_a} solution in 2xCAMHB.
- {drug_b} (Stock SB, 4x): Prepare a {stock_sb} {unit_b} solution in 2xCAMHB.

Highest Final Concentrations:
- Drug A: {conc_a} {unit_a}
- Drug B: {conc_b} {unit_b}
- Dilution Factor: 1:{factor}

---

DAY 1: Preparation of Media, Stocks, and Inoculum

1. Preparation of Culture Media:
   - Prepare Mueller-Hinton Broth (MHB) and 2x concentrated Cation-adjusted Mueller-Hinton Broth (2xCAMHB) according to manufacturer instructions.
   - Sterilize by autoclaving at 121°C for 15 minutes.

2. Preparation of Microbial Inoculum:
   - Inoculate a single colony of the test microorganism into 10 mL of MHB.
   - Grow at 35±2°C in a shaker incubator (approx. 200 rpm) for 18±2 hours. This should yield a culture of ~10⁸ CFU/mL.

3. Preparation of Drug Stock Solutions:
   - Prepare the 4x and 8x stock solutions for Drug A and Drug B as specified in the \"Required Stock Solutions\" section above using 2xCAMHB as the diluent.
   - You will need at least 1.5 mL of Stock SA, 500 µL of Stock 2xSA, and 1.0 mL of Stock SB.

---

DAY 2: Plate Preparation and Dilutions

1. Initial Plate Setup:
   - This protocol results in a final volume of 200 µL per well.
   - All wells initially contain 50 µL of 2xCAMHB medium.
   - 50 µL of Drug A solution is added.
   - 50 µL of Drug B solution is added.
   - 50 µL of inoculum is added.

2. Preparation and Dispensing of {drug_a}:
   - Dispense 100 µL of the 4x stock (Stock SA) of {drug_a} into each well of row A, columns 1-11.
   - Dispense 100 µL of the 8x stock (Stock 2xSA) of {drug_a} into well A12.

3. First Serial Dilution ({drug_a}):
   - Using a multichannel pipette set to 100 µL, perform a 1:{factor} serial dilution of {drug_a} by transferring from row A to row B, then B to C, and so on, down to row G.
   - Mix thoroughly by pipetting up and down in each row before transferring to the next.
   - Discard 100 µL from row G after the final mix. Row H will contain no {drug_a}.

4. Preparation and Dispensing of {drug_b}:
   - Dispense 100 µL of the 4x stock (Stock SB) of {drug_b} into each well of column 12 (rows A-H).

5. Second Serial Dilution ({drug_b}):
   - Using a multichannel pipette set to 100 µL, perform a 1:{factor} serial dilution of {drug_b} by transferring from column 12 to column 11, then 11 to 10, and so on, across to column 2.
   - Mix thoroughly by pipetting up and down in each column before transferring to the next.
   - Discard 100 µL from column 2 after the final mix. Column 1 will contain no {drug_b}.

6. Plate Inoculation:
   - Prepare a bacterial inoculum of 10⁶ CFU/mL in 0.9% NaCl from the Day 1 culture.
   - Using a multichannel pipette, dispense 100 µL of this final inoculum into each well of the microplate.
   - The final inoculum concentration in each well will be 5 x 10⁵ CFU/mL.
   - Note: It is recommended to prepare a parallel \"mirror plate\" with all reagents but without bacteria to serve as a background/no-growth control.

7. Plate Incubation:
   - Cover the plate and place it in a static incubator at 35±2°C for 18±2 hours.
   - A tray with water can be added to the incubator to prevent evaporation.

---

DAY 3: Analysis

1. Optical Density Reading:
   - After incubation, mix the contents of the wells with a multichannel pipette.
   - Read the optical density (OD) of the plate at 600 nm (or a similar wavelength) using a microplate reader.

2. Data Analysis:
   - Calculate the percentage of growth for each well using the formula:
     Growth % = [(OD_combination_well - OD_background) / (OD_drug_free_well - OD_background)] x 100
   - OD_drug_free_well: Well H1 (growth control).
   - OD_background: A blank well or the corresponding well from the mirror plate.
   - The Minimal Inhibitory Concentration (MIC) can be determined as the lowest drug concentration that reduces bacterial growth by a defined threshold (e.g., >80%).",
        conc_a = request.conc_a,
        conc_b = request.conc_b,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckerboardRequest {
        CheckerboardRequest {
            drug_a: "Colistin".to_string(),
            conc_a: 100.0,
            unit_a: ConcentrationUnit::Molar,
            mw_a: 1155.4,
            drug_b: "Rifampicin".to_string(),
            conc_b: 50.0,
            unit_b: ConcentrationUnit::Molar,
            mw_b: 822.9,
            factor: 2.0,
            color_a: default_color_a(),
            color_b: default_color_b(),
        }
    }

    #[test]
    fn test_drug_a_titration_down_rows() {
        let format = PlateFormat::plate_96();
        let (plate, _) = generate_checkerboard(&format, &request()).unwrap();
        assert_eq!(plate.well(&format, "A1").unwrap().concentration, 100.0);
        assert_eq!(plate.well(&format, "B1").unwrap().concentration, 50.0);
        assert_eq!(plate.well(&format, "G1").unwrap().concentration, 100.0 / 64.0);
        // Column 1 rows A-G carry drug A alone.
        assert_eq!(plate.well(&format, "A1").unwrap().compound, "Colistin");
        assert_eq!(
            plate.well(&format, "A1").unwrap().slot,
            Some(CheckerboardSlot::DrugA)
        );
    }

    #[test]
    fn test_combination_wells_store_drug_a_concentration() {
        let format = PlateFormat::plate_96();
        let (plate, config) = generate_checkerboard(&format, &request()).unwrap();
        let g12 = plate.well(&format, "G12").unwrap();
        assert_eq!(g12.compound, "Colistin + Rifampicin");
        assert_eq!(g12.concentration, 1.5625);
        assert_eq!(g12.slot, Some(CheckerboardSlot::Combination));
        // Drug B's value is derived, never stored.
        assert_eq!(config.conc_b_for_column(11, 12), 50.0);
        assert_eq!(config.conc_b_for_column(1, 12), 50.0 / 1024.0);
    }

    #[test]
    fn test_row_h_carries_drug_b_alone() {
        let format = PlateFormat::plate_96();
        let (plate, _) = generate_checkerboard(&format, &request()).unwrap();
        let h12 = plate.well(&format, "H12").unwrap();
        assert_eq!(h12.compound, "Rifampicin");
        assert_eq!(h12.concentration, 50.0);
        assert_eq!(h12.mw, 822.9);
        assert_eq!(h12.slot, Some(CheckerboardSlot::DrugB));
        let h2 = plate.well(&format, "H2").unwrap();
        assert_eq!(h2.concentration, 50.0 / 1024.0);
    }

    #[test]
    fn test_growth_control_at_h1() {
        let format = PlateFormat::plate_96();
        let (plate, _) = generate_checkerboard(&format, &request()).unwrap();
        let h1 = plate.well(&format, "H1").unwrap();
        assert_eq!(h1.compound, GROWTH_CONTROL_LABEL);
        assert_eq!(h1.control_type, ControlType::Positive);
        assert_eq!(h1.concentration, 0.0);
        assert_eq!(h1.mw, 0.0);
        assert_eq!(h1.slot, None);
    }

    #[test]
    fn test_mass_units_require_mw() {
        let format = PlateFormat::plate_96();
        let mut req = request();
        req.unit_a = ConcentrationUnit::Mass;
        req.mw_a = 0.0;
        let err = generate_checkerboard(&format, &req).unwrap_err();
        assert!(err.contains("Molecular weight required"));
    }

    #[test]
    fn test_mass_units_convert_to_micromolar() {
        let format = PlateFormat::plate_96();
        let mut req = request();
        req.unit_a = ConcentrationUnit::Mass;
        req.conc_a = 115.54; // µg/mL at mw 1155.4 -> 100 µM
        let (plate, config) = generate_checkerboard(&format, &req).unwrap();
        assert!((config.max_conc_a - 100.0).abs() < 1e-9);
        assert!((plate.well(&format, "A1").unwrap().concentration - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_96_well_format() {
        let format = PlateFormat::new(
            vec!["A".to_string(), "B".to_string()],
            vec!["1".to_string(), "2".to_string()],
        );
        let err = generate_checkerboard(&format, &request()).unwrap_err();
        assert!(err.contains("8x12"));
    }

    #[test]
    fn test_classify_prefers_slot_tag() {
        let config = CheckerboardConfig {
            drug_a_name: "A".to_string(),
            drug_b_name: "B".to_string(),
            max_conc_a: 100.0,
            max_conc_b: 50.0,
            factor: 2.0,
            color_a: default_color_a(),
            color_b: default_color_b(),
            mw_a: 0.0,
            mw_b: 0.0,
        };
        let mut well = Well::empty("A1");
        well.compound = "renamed by user".to_string();
        well.slot = Some(CheckerboardSlot::DrugA);
        assert_eq!(classify_well(&well, &config), Some(CheckerboardSlot::DrugA));

        // Untagged wells fall back to name equality.
        well.slot = None;
        assert_eq!(classify_well(&well, &config), None);
        well.compound = "A + B".to_string();
        assert_eq!(
            classify_well(&well, &config),
            Some(CheckerboardSlot::Combination)
        );
    }

    #[test]
    fn test_combination_report() {
        let format = PlateFormat::plate_96();
        let (plate, config) = generate_checkerboard(&format, &request()).unwrap();
        let report =
            combination_report(plate.well(&format, "G12").unwrap(), &config, &format).unwrap();
        assert_eq!(report.conc_a_um, 1.5625);
        assert_eq!(report.conc_b_um, 50.0);
        assert_eq!(report.drug_b, "Rifampicin");
        // Not a combination well.
        assert!(combination_report(plate.well(&format, "H12").unwrap(), &config, &format).is_none());
    }

    #[test]
    fn test_protocol_substitution() {
        let protocol = generate_protocol(&request());
        assert!(protocol.contains("Prepare a 400.00 µM solution in 2xCAMHB"));
        assert!(protocol.contains("Prepare a 800.00 µM solution in 2xCAMHB"));
        assert!(protocol.contains("Prepare a 200.00 µM solution in 2xCAMHB"));
        assert!(protocol.contains("Dilution Factor: 1:2"));
        assert!(protocol.contains("Colistin"));
        assert!(protocol.contains("Rifampicin"));
    }
}
