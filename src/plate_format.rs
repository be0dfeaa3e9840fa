use serde::{Deserialize, Serialize};

/// Row and column label sequences of a rectangular plate. The label order
/// defines both the grid shape and the canonical row-major iteration order.
/// A well coordinate is a row label immediately followed by a column label,
/// e.g. row "A" + column "1" -> "A1".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateFormat {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
}

impl PlateFormat {
    pub fn new(row_labels: Vec<String>, col_labels: Vec<String>) -> Self {
        Self {
            row_labels,
            col_labels,
        }
    }

    /// The canonical 8x12 = 96-well format, rows A-H and columns 1-12.
    pub fn plate_96() -> Self {
        Self {
            row_labels: ('A'..='H').map(|c| c.to_string()).collect(),
            col_labels: (1..=12).map(|n| n.to_string()).collect(),
        }
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.row_labels.len()
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.col_labels.len()
    }

    #[inline(always)]
    pub fn well_count(&self) -> usize {
        self.rows() * self.cols()
    }

    #[inline(always)]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[inline(always)]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn well_id(&self, row_index: usize, col_index: usize) -> Option<String> {
        let row = self.row_labels.get(row_index)?;
        let col = self.col_labels.get(col_index)?;
        Some(format!("{row}{col}"))
    }

    /// Decomposes a coordinate into (row index, column index), or `None` if
    /// it does not split into exactly one row label and one column label.
    pub fn parse_well_id(&self, id: &str) -> Option<(usize, usize)> {
        for (row_index, row) in self.row_labels.iter().enumerate() {
            if let Some(rest) = id.strip_prefix(row.as_str()) {
                if let Some(col_index) = self.col_labels.iter().position(|col| col == rest) {
                    return Some((row_index, col_index));
                }
            }
        }
        None
    }

    /// Position of a coordinate in row-major grid order.
    pub fn well_index(&self, id: &str) -> Option<usize> {
        let (row_index, col_index) = self.parse_well_id(id)?;
        Some(row_index * self.cols() + col_index)
    }

    /// All coordinates in row-major order (rows outer, columns inner).
    pub fn well_ids(&self) -> impl Iterator<Item = String> + '_ {
        self.row_labels
            .iter()
            .flat_map(move |row| self.col_labels.iter().map(move |col| format!("{row}{col}")))
    }

    /// Resolves the inclusive range of coordinates between `start` and `end`,
    /// stepping along the shared row or column in either direction. Returns
    /// `None` for invalid coordinates or a diagonal pair ("not a straight
    /// line"); range-based generators must reject such selections.
    pub fn well_range(&self, start: &str, end: &str) -> Option<Vec<String>> {
        let (start_row, start_col) = self.parse_well_id(start)?;
        let (end_row, end_col) = self.parse_well_id(end)?;

        if start_row == end_row {
            let row = &self.row_labels[start_row];
            return Some(step_indices(start_col, end_col)
                .map(|c| format!("{row}{}", self.col_labels[c]))
                .collect());
        }

        if start_col == end_col {
            let col = &self.col_labels[start_col];
            return Some(step_indices(start_row, end_row)
                .map(|r| format!("{}{col}", self.row_labels[r]))
                .collect());
        }

        None
    }
}

fn step_indices(from: usize, to: usize) -> Box<dyn Iterator<Item = usize>> {
    if from <= to {
        Box::new(from..=to)
    } else {
        Box::new((to..=from).rev())
    }
}
