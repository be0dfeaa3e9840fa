use crate::checkerboard::{self, CheckerboardConfig};
use crate::plate_format::PlateFormat;
use crate::well::{CheckerboardSlot, Well};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Saturated multi-hue scale for on-screen concentration display.
pub const CONCENTRATION_COLOR_SCALE: [&str; 9] = [
    "#ffffd9", "#edf8b1", "#c7e9b4", "#7fcdbb", "#41b6c4", "#1d91c0", "#225ea8", "#253494",
    "#081d58",
];

/// Grayscale scale for publication-style figures.
pub const PUBLICATION_COLOR_SCALE: [&str; 9] = [
    "#ffffff", "#f0f0f0", "#d9d9d9", "#bdbdbd", "#969696", "#737373", "#525252", "#252525",
    "#000000",
];

/// Raw intensities are remapped to [0.25, 1.0] so the lowest nonzero
/// concentration stays visually distinguishable from an empty well.
const BASE_INTENSITY: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Publication,
}

impl Theme {
    pub fn concentration_palette(self) -> &'static [&'static str; 9] {
        match self {
            Theme::Publication => &PUBLICATION_COLOR_SCALE,
            Theme::Light | Theme::Dark => &CONCENTRATION_COLOR_SCALE,
        }
    }
}

lazy_static! {
    static ref HEX_COLOR: Regex =
        Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
            .expect("hex color regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn from_hex(hex: &str) -> Option<Self> {
        let caps = HEX_COLOR.captures(hex)?;
        let channel = |i: usize| u8::from_str_radix(&caps[i], 16).ok();
        Some(Self {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation from `self` toward `other` by `factor` in [0,1].
    pub fn interpolate(self, other: Rgb, factor: f64) -> Rgb {
        let lerp = |a: u8, b: u8| (a as f64 + factor * (b as f64 - a as f64)).round() as u8;
        Rgb {
            r: lerp(self.r, other.r),
            g: lerp(self.g, other.g),
            b: lerp(self.b, other.b),
        }
    }

    /// Channel-wise weighted average; `weight` is the share of `other`.
    pub fn mix(self, other: Rgb, weight: f64) -> Rgb {
        let w1 = 1.0 - weight;
        let avg = |a: u8, b: u8| (a as f64 * w1 + b as f64 * weight).round() as u8;
        Rgb {
            r: avg(self.r, other.r),
            g: avg(self.g, other.g),
            b: avg(self.b, other.b),
        }
    }
}

/// Palette index for a concentration ratio in [0,1].
pub fn scale_index(ratio: f64, palette_len: usize) -> usize {
    ((ratio * palette_len as f64).floor() as usize).min(palette_len - 1)
}

/// Linear-scale color for a well relative to the plate-wide maximum, or
/// `None` when the well (or the plate) carries no concentration.
pub fn linear_scale_color(concentration: f64, max: f64, theme: Theme) -> Option<&'static str> {
    if concentration <= 0.0 || max <= 0.0 {
        return None;
    }
    let palette = theme.concentration_palette();
    Some(palette[scale_index(concentration / max, palette.len())])
}

fn adjusted_intensity(raw: f64) -> f64 {
    if raw <= 0.0 {
        return 0.0;
    }
    BASE_INTENSITY + (1.0 - BASE_INTENSITY) * raw
}

/// Blended color for a well of a generated checkerboard, or `None` for wells
/// outside the assay (controls, untouched wells); callers fall back to the
/// linear scale or a neutral default. Each drug's intensity interpolates its
/// base color from white; combination wells average the two at equal weight.
pub fn checkerboard_well_color(
    well: &Well,
    config: &CheckerboardConfig,
    format: &PlateFormat,
) -> Option<String> {
    let color_a = Rgb::from_hex(&config.color_a)?;
    let color_b = Rgb::from_hex(&config.color_b)?;

    let mut conc_a = 0.0;
    let mut conc_b = 0.0;
    match checkerboard::classify_well(well, config)? {
        CheckerboardSlot::DrugA => conc_a = well.concentration,
        CheckerboardSlot::DrugB => conc_b = well.concentration,
        CheckerboardSlot::Combination => {
            // Drug A's value is the stored one; drug B's is derived from
            // column position.
            conc_a = well.concentration;
            let (_, col_index) = format.parse_well_id(&well.id)?;
            conc_b = config.conc_b_for_column(col_index, format.cols());
        }
    }

    let raw_a = if config.max_conc_a > 0.0 {
        conc_a / config.max_conc_a
    } else {
        0.0
    };
    let raw_b = if config.max_conc_b > 0.0 {
        conc_b / config.max_conc_b
    } else {
        0.0
    };
    if raw_a <= 0.0 && raw_b <= 0.0 {
        return None;
    }

    let shade_a = Rgb::WHITE.interpolate(color_a, adjusted_intensity(raw_a));
    let shade_b = Rgb::WHITE.interpolate(color_b, adjusted_intensity(raw_b));
    let color = if raw_a > 0.0 && raw_b > 0.0 {
        shade_a.mix(shade_b, 0.5)
    } else if raw_a > 0.0 {
        shade_a
    } else {
        shade_b
    };
    Some(color.to_hex())
}

/// Black or white, whichever contrasts with the given background.
pub fn contrasting_text_color(hex: &str) -> &'static str {
    let Some(rgb) = Rgb::from_hex(hex) else {
        return "#000000";
    };
    let luminance =
        (0.299 * rgb.r as f64 + 0.587 * rgb.g as f64 + 0.114 * rgb.b as f64) / 255.0;
    if luminance > 0.5 { "#000000" } else { "#FFFFFF" }
}
