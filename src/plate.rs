use crate::plate_format::PlateFormat;
use crate::well::Well;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The canonical well collection for one plate: exactly `rows x cols` wells,
/// one per valid coordinate, kept in row-major grid order. Created once at
/// initialization and thereafter only ever replaced wholesale through the
/// history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    wells: Vec<Well>,
}

impl Plate {
    /// A fresh plate with one default well per coordinate of `format`.
    pub fn new(format: &PlateFormat) -> Self {
        Self {
            wells: format.well_ids().map(Well::empty).collect(),
        }
    }

    /// Builds a plate from an externally supplied well array (reloaded
    /// layout or generated candidate). Rejects wrong counts, unknown ids and
    /// duplicates, and normalizes the array into row-major grid order so a
    /// serialize/reload round trip reproduces an identical plate.
    pub fn from_wells(format: &PlateFormat, wells: Vec<Well>) -> Result<Self, String> {
        if wells.len() != format.well_count() {
            return Err(format!(
                "Layout does not match the plate format: expected {} wells, got {}",
                format.well_count(),
                wells.len()
            ));
        }
        let mut ordered: Vec<Option<Well>> = vec![None; format.well_count()];
        let mut seen: HashSet<usize> = HashSet::new();
        for well in wells {
            let index = format
                .well_index(&well.id)
                .ok_or_else(|| format!("Layout contains unknown well id '{}'", well.id))?;
            if !seen.insert(index) {
                return Err(format!("Layout contains duplicate well id '{}'", well.id));
            }
            ordered[index] = Some(well);
        }
        // Count and uniqueness together guarantee full coverage.
        let wells = ordered.into_iter().flatten().collect();
        Ok(Self { wells })
    }

    #[inline(always)]
    pub fn wells(&self) -> &[Well] {
        &self.wells
    }

    pub fn well(&self, format: &PlateFormat, id: &str) -> Option<&Well> {
        self.wells.get(format.well_index(id)?)
    }

    pub fn well_mut(&mut self, format: &PlateFormat, id: &str) -> Option<&mut Well> {
        let index = format.well_index(id)?;
        self.wells.get_mut(index)
    }

    /// Highest stored concentration on the plate, in µM.
    pub fn max_concentration(&self) -> f64 {
        self.wells
            .iter()
            .map(|w| w.concentration)
            .fold(0.0, f64::max)
    }

    pub fn assigned_count(&self) -> usize {
        self.wells.iter().filter(|w| w.is_assigned()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well::ControlType;

    #[test]
    fn test_new_plate_covers_format() {
        let format = PlateFormat::plate_96();
        let plate = Plate::new(&format);
        assert_eq!(plate.wells().len(), 96);
        assert_eq!(plate.wells()[0].id, "A1");
        assert_eq!(plate.wells()[95].id, "H12");
        assert_eq!(plate.assigned_count(), 0);
    }

    #[test]
    fn test_lookup_by_coordinate() {
        let format = PlateFormat::plate_96();
        let mut plate = Plate::new(&format);
        plate.well_mut(&format, "C7").unwrap().concentration = 12.5;
        assert_eq!(plate.well(&format, "C7").unwrap().concentration, 12.5);
        assert!(plate.well(&format, "Z1").is_none());
    }

    #[test]
    fn test_max_concentration() {
        let format = PlateFormat::plate_96();
        let mut plate = Plate::new(&format);
        assert_eq!(plate.max_concentration(), 0.0);
        plate.well_mut(&format, "A1").unwrap().concentration = 3.0;
        plate.well_mut(&format, "H12").unwrap().concentration = 100.0;
        assert_eq!(plate.max_concentration(), 100.0);
    }

    #[test]
    fn test_from_wells_normalizes_order() {
        let format = PlateFormat::plate_96();
        let mut wells: Vec<Well> = format.well_ids().map(Well::empty).collect();
        wells.reverse();
        let plate = Plate::from_wells(&format, wells).unwrap();
        assert_eq!(plate.wells()[0].id, "A1");
        assert_eq!(plate.wells()[95].id, "H12");
    }

    #[test]
    fn test_from_wells_rejects_wrong_count() {
        let format = PlateFormat::plate_96();
        let wells: Vec<Well> = format.well_ids().take(95).map(Well::empty).collect();
        let err = Plate::from_wells(&format, wells).unwrap_err();
        assert!(err.contains("expected 96 wells, got 95"));
    }

    #[test]
    fn test_from_wells_rejects_duplicates() {
        let format = PlateFormat::plate_96();
        let mut wells: Vec<Well> = format.well_ids().map(Well::empty).collect();
        wells[1] = Well::empty("A1");
        let err = Plate::from_wells(&format, wells).unwrap_err();
        assert!(err.contains("duplicate well id 'A1'"));
    }

    #[test]
    fn test_from_wells_rejects_unknown_id() {
        let format = PlateFormat::plate_96();
        let mut wells: Vec<Well> = format.well_ids().map(Well::empty).collect();
        wells[0] = Well::empty("Q42");
        let err = Plate::from_wells(&format, wells).unwrap_err();
        assert!(err.contains("unknown well id 'Q42'"));
    }

    #[test]
    fn test_serde_round_trip() {
        let format = PlateFormat::plate_96();
        let mut plate = Plate::new(&format);
        {
            let well = plate.well_mut(&format, "B2").unwrap();
            well.compound = "Rifampicin".to_string();
            well.concentration = 8.0;
            well.control_type = ControlType::Negative;
        }
        let json = serde_json::to_string(&plate).unwrap();
        let back: Plate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plate);
    }
}
