use crate::checkerboard::CheckerboardConfig;
use crate::plate::Plate;
use crate::plate_format::PlateFormat;
use crate::units::{self, ConcentrationUnit};
use crate::well_color::{
    checkerboard_well_color, contrasting_text_color, linear_scale_color, Theme,
};
use svg::node::element::{Circle, Rectangle, Text};
use svg::Document;

const CELL: f32 = 64.0;
const WELL_RADIUS: f32 = 26.0;
const MARGIN_LEFT: f32 = 56.0;
const MARGIN_TOP: f32 = 72.0;
const MARGIN_RIGHT: f32 = 24.0;
const MARGIN_BOTTOM: f32 = 24.0;
const TITLE_Y: f32 = 30.0;

const EMPTY_FILL: &str = "#e5e7eb";
const EMPTY_FILL_DARK: &str = "#374151";

fn background_color(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "#111827",
        Theme::Light | Theme::Publication => "#ffffff",
    }
}

fn label_color(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "#d1d5db",
        Theme::Light | Theme::Publication => "#374151",
    }
}

fn empty_fill(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => EMPTY_FILL_DARK,
        Theme::Light | Theme::Publication => EMPTY_FILL,
    }
}

fn well_fill(
    plate: &Plate,
    format: &PlateFormat,
    well_id: &str,
    theme: Theme,
    checkerboard: Option<&CheckerboardConfig>,
) -> String {
    let Some(well) = plate.well(format, well_id) else {
        return empty_fill(theme).to_string();
    };
    if let Some(config) = checkerboard {
        if let Some(color) = checkerboard_well_color(well, config, format) {
            return color;
        }
    }
    if let Some(color) = linear_scale_color(well.concentration, plate.max_concentration(), theme) {
        return color.to_string();
    }
    empty_fill(theme).to_string()
}

/// Renders the plate as a standalone SVG document: one circle per well,
/// filled by the same color rules the interactive grid uses, with the
/// concentration printed inside assigned wells in the requested unit.
pub fn export_plate_svg(
    format: &PlateFormat,
    plate: &Plate,
    unit: ConcentrationUnit,
    theme: Theme,
    checkerboard: Option<&CheckerboardConfig>,
) -> String {
    let width = MARGIN_LEFT + format.cols() as f32 * CELL + MARGIN_RIGHT;
    let height = MARGIN_TOP + format.rows() as f32 * CELL + MARGIN_BOTTOM;

    let mut doc = Document::new()
        .set("viewBox", (0, 0, width, height))
        .set("width", width)
        .set("height", height)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", width)
                .set("height", height)
                .set("fill", background_color(theme)),
        );
    let mut labels: Vec<Text> = vec![];

    let title = match checkerboard {
        Some(config) => format!(
            "Checkerboard: {} x {}",
            config.drug_a_name, config.drug_b_name
        ),
        None => format!("{}-well plate", format.well_count()),
    };
    labels.push(
        Text::new(title)
            .set("x", MARGIN_LEFT)
            .set("y", TITLE_Y)
            .set("font-family", "monospace")
            .set("font-size", 16)
            .set("fill", label_color(theme)),
    );

    for (col, label) in format.col_labels().iter().enumerate() {
        labels.push(
            Text::new(label.clone())
                .set("x", MARGIN_LEFT + (col as f32 + 0.5) * CELL)
                .set("y", MARGIN_TOP - 12.0)
                .set("text-anchor", "middle")
                .set("font-family", "monospace")
                .set("font-size", 12)
                .set("fill", label_color(theme)),
        );
    }
    for (row, label) in format.row_labels().iter().enumerate() {
        labels.push(
            Text::new(label.clone())
                .set("x", MARGIN_LEFT - 16.0)
                .set("y", MARGIN_TOP + (row as f32 + 0.5) * CELL + 4.0)
                .set("text-anchor", "middle")
                .set("font-family", "monospace")
                .set("font-size", 12)
                .set("fill", label_color(theme)),
        );
    }

    for row in 0..format.rows() {
        for col in 0..format.cols() {
            let Some(id) = format.well_id(row, col) else {
                continue;
            };
            let cx = MARGIN_LEFT + (col as f32 + 0.5) * CELL;
            let cy = MARGIN_TOP + (row as f32 + 0.5) * CELL;
            let fill = well_fill(plate, format, &id, theme, checkerboard);
            doc = doc.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", WELL_RADIUS)
                    .set("fill", fill.as_str())
                    .set("stroke", label_color(theme))
                    .set("stroke-width", 1),
            );

            let Some(well) = plate.well(format, &id) else {
                continue;
            };
            if !well.is_assigned() {
                continue;
            }
            let text_color = contrasting_text_color(&fill);
            if well.concentration > 0.0 {
                labels.push(
                    Text::new(units::format_concentration(well.concentration, well.mw, unit))
                        .set("x", cx)
                        .set("y", cy + 3.0)
                        .set("text-anchor", "middle")
                        .set("font-family", "monospace")
                        .set("font-size", 8)
                        .set("fill", text_color),
                );
            } else if !well.compound.is_empty() {
                let short: String = well.compound.chars().take(8).collect();
                labels.push(
                    Text::new(short)
                        .set("x", cx)
                        .set("y", cy + 3.0)
                        .set("text-anchor", "middle")
                        .set("font-family", "monospace")
                        .set("font-size", 8)
                        .set("fill", text_color),
                );
            }
        }
    }

    for label in labels {
        doc = doc.add(label);
    }

    doc.to_string()
}
