use serde::{Deserialize, Serialize};

/// How a click updates the selection. `RangeToggle` (shift-style) and
/// `Toggle` (ctrl/cmd-style) share the same semantics and differ only in the
/// UI invocation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    Replace,
    RangeToggle,
    Toggle,
}

/// The set of currently active well coordinates. Stored in insertion order;
/// generators that need a line infer direction by sorting the two endpoints.
/// Cleared whenever the whole grid is replaced by a generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    wells: Vec<String>,
}

impl Selection {
    #[inline(always)]
    pub fn ids(&self) -> &[String] {
        &self.wells
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.wells.iter().any(|w| w == id)
    }

    pub fn select(&mut self, id: &str, mode: SelectionMode) {
        match mode {
            SelectionMode::Replace => {
                self.wells = vec![id.to_string()];
            }
            SelectionMode::RangeToggle | SelectionMode::Toggle => {
                if let Some(pos) = self.wells.iter().position(|w| w == id) {
                    self.wells.remove(pos);
                } else {
                    self.wells.push(id.to_string());
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.wells.clear();
    }
}
