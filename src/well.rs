use serde::{Deserialize, Serialize};

/// A well's designated function in the assay, independent of its compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlType {
    #[default]
    None,
    Positive,
    Negative,
    Blank,
}

impl ControlType {
    pub const ALL: [ControlType; 4] = [
        ControlType::None,
        ControlType::Positive,
        ControlType::Negative,
        ControlType::Blank,
    ];
}

/// Which role the checkerboard generator assigned a well. Stored explicitly
/// so read-side interpretation does not depend on matching free-text
/// compound names, which users may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckerboardSlot {
    DrugA,
    DrugB,
    Combination,
}

/// One addressable position in the plate grid. `concentration` is always
/// stored in micromolar; mass-unit display values are derived on read and
/// converted back on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Well {
    pub id: String,
    pub compound: String,
    pub concentration: f64,
    /// Molecular weight in g/mol; 0 = unknown / not applicable.
    pub mw: f64,
    pub strain: String,
    pub control_type: ControlType,
    /// Non-negative replicate group, 0 = ungrouped.
    pub replicate_group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<CheckerboardSlot>,
}

impl Well {
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            compound: String::new(),
            concentration: 0.0,
            mw: 0.0,
            strain: String::new(),
            control_type: ControlType::None,
            replicate_group: 0,
            slot: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.compound.is_empty()
            || self.concentration > 0.0
            || !self.strain.is_empty()
            || self.control_type != ControlType::None
            || self.replicate_group > 0
    }
}

/// A partial well update. `concentration`, when present, must already be in
/// micromolar; the engine converts display-unit input before applying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WellPatch {
    pub compound: Option<String>,
    pub concentration: Option<f64>,
    pub mw: Option<f64>,
    pub strain: Option<String>,
    pub control_type: Option<ControlType>,
    pub replicate_group: Option<u32>,
}

impl WellPatch {
    pub fn apply(&self, well: &mut Well) {
        if let Some(compound) = &self.compound {
            well.compound = compound.clone();
            // The compound name no longer matches what the generator wrote,
            // so any checkerboard slot assignment is stale.
            well.slot = None;
        }
        if let Some(concentration) = self.concentration {
            well.concentration = concentration;
        }
        if let Some(mw) = self.mw {
            well.mw = mw;
        }
        if let Some(strain) = &self.strain {
            well.strain = strain.clone();
        }
        if let Some(control_type) = self.control_type {
            well.control_type = control_type;
        }
        if let Some(replicate_group) = self.replicate_group {
            well.replicate_group = replicate_group;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
