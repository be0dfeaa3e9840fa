use crate::plate::Plate;
use crate::plate_format::PlateFormat;
use crate::units::{self, ConcentrationUnit};
use anyhow::{Context, Result};
use std::path::Path;

/// Serializes the grid as an ordered array of well objects, one per well in
/// grid order. Reloading this array through [`layout_from_json`]
/// reconstructs an identical grid.
pub fn layout_to_json(plate: &Plate) -> Result<String> {
    serde_json::to_string_pretty(plate.wells()).context("Could not serialize plate layout")
}

/// Parses and validates a well array produced by [`layout_to_json`] or by an
/// external collaborator (the same validation applies to both). The prior
/// grid is left untouched on failure.
pub fn layout_from_json(format: &PlateFormat, json: &str) -> Result<Plate> {
    let wells = serde_json::from_str(json).context("Could not parse plate layout JSON")?;
    Plate::from_wells(format, wells).map_err(anyhow::Error::msg)
}

pub fn save_layout(plate: &Plate, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = layout_to_json(plate)?;
    std::fs::write(path, json)
        .with_context(|| format!("Could not write layout file '{}'", path.display()))
}

pub fn load_layout(format: &PlateFormat, path: impl AsRef<Path>) -> Result<Plate> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read layout file '{}'", path.display()))?;
    layout_from_json(format, &json)
}

/// Tabular export, one row per well in grid order, with concentrations
/// rendered in the requested display unit.
pub fn layout_to_csv(plate: &Plate, unit: ConcentrationUnit) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "Well",
        "Compound",
        "Concentration",
        "MW (g/mol)",
        "Strain",
        "Control",
        "Replicate",
    ])?;
    for well in plate.wells() {
        let mw = if well.mw > 0.0 {
            format!("{}", well.mw)
        } else {
            String::new()
        };
        let replicate = if well.replicate_group > 0 {
            well.replicate_group.to_string()
        } else {
            String::new()
        };
        writer.write_record([
            well.id.as_str(),
            well.compound.as_str(),
            &units::format_concentration(well.concentration, well.mw, unit),
            &mw,
            well.strain.as_str(),
            &format!("{:?}", well.control_type),
            &replicate,
        ])?;
    }
    let bytes = writer.into_inner().context("Could not finish CSV output")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}
