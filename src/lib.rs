use lazy_static::lazy_static;
use plate_format::PlateFormat;

pub mod checkerboard;
pub mod dilution;
pub mod engine;
pub mod history;
pub mod layout_io;
pub mod plate;
pub mod plate_format;
pub mod render_plate;
pub mod selection;
pub mod units;
pub mod well;
pub mod well_color;

lazy_static! {
    // The canonical 8x12 layout; all other formats are constructed explicitly
    pub static ref PLATE_96: PlateFormat = PlateFormat::plate_96();
}
