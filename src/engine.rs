use crate::checkerboard::{self, CheckerboardConfig, CheckerboardRequest};
use crate::dilution::{self, DilutionRequest};
use crate::history::PlateHistory;
use crate::plate::Plate;
use crate::plate_format::PlateFormat;
use crate::selection::{Selection, SelectionMode};
use crate::units::{self, ConcentrationUnit};
use crate::well::{Well, WellPatch};
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

pub type WellId = String;
pub type OpId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Unsupported,
    Io,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for EngineError {}

fn invalid_input(message: impl Into<String>) -> EngineError {
    EngineError {
        code: ErrorCode::InvalidInput,
        message: message.into(),
    }
}

/// Session state of one plate design: the versioned grid, the live
/// selection, and the config of the most recent checkerboard, if any.
/// The display unit is deliberately NOT part of this state; every operation
/// that parses or formats a concentration carries its unit explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub format: PlateFormat,
    pub history: PlateHistory,
    pub selection: Selection,
    pub checkerboard: Option<CheckerboardConfig>,
}

impl Default for ProjectState {
    fn default() -> Self {
        let format = PlateFormat::plate_96();
        let history = PlateHistory::new(Plate::new(&format));
        Self {
            format,
            history,
            selection: Selection::default(),
            checkerboard: None,
        }
    }
}

/// A (well id, patch) pair for batch edits with distinct per-well patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellUpdate {
    pub id: WellId,
    pub patch: WellPatch,
}

/// All grid and selection mutations, serializable for the CLI and external
/// callers. Concentration fields inside patches and requests are in the
/// operation's stated unit and converted to µM before anything is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    EditWell {
        id: WellId,
        patch: WellPatch,
        #[serde(default)]
        unit: ConcentrationUnit,
    },
    EditWells {
        ids: Vec<WellId>,
        patch: WellPatch,
        #[serde(default)]
        unit: ConcentrationUnit,
    },
    BatchEdit {
        updates: Vec<WellUpdate>,
        #[serde(default)]
        unit: ConcentrationUnit,
    },
    GenerateDilution {
        request: DilutionRequest,
    },
    GenerateCheckerboard {
        request: CheckerboardRequest,
    },
    ReplaceLayout {
        wells: Vec<Well>,
    },
    Undo,
    Redo,
    Select {
        id: WellId,
        mode: SelectionMode,
    },
    ClearSelection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpResult {
    pub op_id: OpId,
    pub changed_wells: Vec<WellId>,
    pub warnings: Vec<String>,
    pub messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub op: Operation,
    pub result: OpResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub supported_operations: Vec<String>,
    pub deterministic_operation_log: bool,
}

/// The one mutation surface for the whole model. Every edit derives a full
/// new plate from the current snapshot and commits it to the history store,
/// so undo/redo stay trivially correct and a failed operation never leaves
/// a partial grid behind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlateEngine {
    state: ProjectState,
    journal: Vec<OperationRecord>,
    op_counter: u64,
}

impl PlateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_plate(plate: Plate) -> Self {
        let mut engine = Self::default();
        engine.state.history = PlateHistory::new(plate);
        engine
    }

    /// Builds an engine from an externally supplied well array, validated
    /// against the canonical 96-well format.
    pub fn from_layout(wells: Vec<Well>) -> Result<Self, EngineError> {
        let format = PlateFormat::plate_96();
        let plate = Plate::from_wells(&format, wells).map_err(invalid_input)?;
        Ok(Self::from_plate(plate))
    }

    #[inline(always)]
    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    /// The currently visible plate (the history snapshot at the cursor).
    #[inline(always)]
    pub fn plate(&self) -> &Plate {
        self.state.history.current()
    }

    #[inline(always)]
    pub fn format(&self) -> &PlateFormat {
        &self.state.format
    }

    #[inline(always)]
    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    #[inline(always)]
    pub fn checkerboard(&self) -> Option<&CheckerboardConfig> {
        self.state.checkerboard.as_ref()
    }

    pub fn operation_log(&self) -> &[OperationRecord] {
        &self.journal
    }

    pub fn capabilities() -> Capabilities {
        Capabilities {
            protocol_version: "v1".to_string(),
            supported_operations: vec![
                "EditWell".to_string(),
                "EditWells".to_string(),
                "BatchEdit".to_string(),
                "GenerateDilution".to_string(),
                "GenerateCheckerboard".to_string(),
                "ReplaceLayout".to_string(),
                "Undo".to_string(),
                "Redo".to_string(),
                "Select".to_string(),
                "ClearSelection".to_string(),
            ],
            deterministic_operation_log: true,
        }
    }

    fn next_op_id(&mut self) -> OpId {
        self.op_counter += 1;
        format!("op-{}", self.op_counter)
    }

    pub fn apply(&mut self, op: Operation) -> Result<OpResult, EngineError> {
        let result = self.apply_internal(&op)?;
        self.journal.push(OperationRecord {
            op,
            result: result.clone(),
        });
        Ok(result)
    }

    pub fn apply_workflow(&mut self, workflow: Workflow) -> Result<Vec<OpResult>, EngineError> {
        let mut results = Vec::with_capacity(workflow.operations.len());
        for op in workflow.operations {
            results.push(self.apply(op)?);
        }
        Ok(results)
    }

    fn apply_internal(&mut self, op: &Operation) -> Result<OpResult, EngineError> {
        let mut result = OpResult {
            op_id: self.next_op_id(),
            ..OpResult::default()
        };

        match op {
            Operation::EditWell { id, patch, unit } => {
                let changed = self.commit_patches(&[(id.clone(), patch.clone())], *unit)?;
                result.messages.push(format!("Updated well {id}"));
                result.changed_wells = changed;
            }
            Operation::EditWells { ids, patch, unit } => {
                let updates: Vec<(WellId, WellPatch)> =
                    ids.iter().map(|id| (id.clone(), patch.clone())).collect();
                let changed = self.commit_patches(&updates, *unit)?;
                result
                    .messages
                    .push(format!("Updated {} wells", changed.len()));
                result.changed_wells = changed;
            }
            Operation::BatchEdit { updates, unit } => {
                let updates: Vec<(WellId, WellPatch)> = updates
                    .iter()
                    .map(|u| (u.id.clone(), u.patch.clone()))
                    .collect();
                let changed = self.commit_patches(&updates, *unit)?;
                result
                    .messages
                    .push(format!("Updated {} wells", changed.len()));
                result.changed_wells = changed;
            }
            Operation::GenerateDilution { request } => {
                let next = dilution::generate_dilution(&self.state.format, self.plate(), request)
                    .map_err(invalid_input)?;
                let line = self
                    .state
                    .format
                    .well_range(&request.start, &request.end)
                    .unwrap_or_default();
                self.state.history.commit(next);
                result.messages.push(format!(
                    "Applied {} dilution steps from {} to {}",
                    line.len(),
                    request.start,
                    request.end
                ));
                result.changed_wells = line;
            }
            Operation::GenerateCheckerboard { request } => {
                let (plate, config) =
                    checkerboard::generate_checkerboard(&self.state.format, request)
                        .map_err(invalid_input)?;
                self.state.history.commit(plate);
                self.state.checkerboard = Some(config);
                self.state.selection.clear();
                result.protocol = Some(checkerboard::generate_protocol(request));
                result.messages.push(format!(
                    "Generated checkerboard layout for {} x {}",
                    request.drug_a, request.drug_b
                ));
                result.changed_wells = self.state.format.well_ids().collect();
            }
            Operation::ReplaceLayout { wells } => {
                let plate =
                    Plate::from_wells(&self.state.format, wells.clone()).map_err(invalid_input)?;
                self.state.history.commit(plate);
                self.state.selection.clear();
                self.state.checkerboard = None;
                result
                    .messages
                    .push(format!("Replaced layout ({} wells)", wells.len()));
                result.changed_wells = self.state.format.well_ids().collect();
            }
            Operation::Undo => {
                if self.state.history.undo() {
                    result.messages.push("Undid last change".to_string());
                } else {
                    result.warnings.push("Nothing to undo".to_string());
                }
            }
            Operation::Redo => {
                if self.state.history.redo() {
                    result.messages.push("Redid change".to_string());
                } else {
                    result.warnings.push("Nothing to redo".to_string());
                }
            }
            Operation::Select { id, mode } => {
                if self.state.format.well_index(id).is_none() {
                    return Err(EngineError {
                        code: ErrorCode::NotFound,
                        message: format!("Well '{id}' not found on the plate"),
                    });
                }
                self.state.selection.select(id, *mode);
                result
                    .messages
                    .push(format!("{} wells selected", self.state.selection.len()));
            }
            Operation::ClearSelection => {
                self.state.selection.clear();
                result.messages.push("Selection cleared".to_string());
            }
        }

        Ok(result)
    }

    /// Applies patches to a derived copy of the current plate and commits it
    /// as one history entry. Any failure (unknown well, missing molecular
    /// weight) aborts before the commit, leaving the grid untouched.
    fn commit_patches(
        &mut self,
        updates: &[(WellId, WellPatch)],
        unit: ConcentrationUnit,
    ) -> Result<Vec<WellId>, EngineError> {
        let mut next = self.plate().clone();
        let mut changed = Vec::with_capacity(updates.len());
        for (id, patch) in updates {
            let well = next.well_mut(&self.state.format, id).ok_or(EngineError {
                code: ErrorCode::NotFound,
                message: format!("Well '{id}' not found on the plate"),
            })?;
            let canonical = canonical_patch(patch, unit, well.mw)?;
            canonical.apply(well);
            changed.push(id.clone());
        }
        self.state.history.commit(next);
        Ok(changed)
    }
}

/// Rewrites a patch's concentration into µM. Mass-unit values need a usable
/// molecular weight (the patch's own, else the well's existing one); without
/// one the operation is refused rather than silently storing a wrong value.
/// Non-positive entered concentrations store as 0.
fn canonical_patch(
    patch: &WellPatch,
    unit: ConcentrationUnit,
    existing_mw: f64,
) -> Result<WellPatch, EngineError> {
    let mut canonical = patch.clone();
    if let Some(conc) = patch.concentration {
        canonical.concentration = Some(if conc <= 0.0 {
            0.0
        } else {
            match unit {
                ConcentrationUnit::Molar => conc,
                ConcentrationUnit::Mass => {
                    let mw = patch.mw.filter(|m| *m > 0.0).unwrap_or(existing_mw);
                    if mw <= 0.0 {
                        return Err(invalid_input(
                            "Molecular weight required to save a concentration in mass units",
                        ));
                    }
                    units::mass_to_molar(conc, mw)
                }
            }
        });
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dilution::DilutionScale;
    use crate::well::{CheckerboardSlot, ControlType};

    fn edit(id: &str, conc: f64) -> Operation {
        Operation::EditWell {
            id: id.to_string(),
            patch: WellPatch {
                concentration: Some(conc),
                ..Default::default()
            },
            unit: ConcentrationUnit::Molar,
        }
    }

    #[test]
    fn test_edit_well_commits_one_entry() {
        let mut engine = PlateEngine::new();
        let result = engine.apply(edit("A1", 10.0)).unwrap();
        assert_eq!(result.changed_wells, vec!["A1"]);
        assert_eq!(
            engine.plate().well(engine.format(), "A1").unwrap().concentration,
            10.0
        );
        assert!(engine.state().history.can_undo());
        assert_eq!(engine.state().history.len(), 2);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut engine = PlateEngine::new();
        engine.apply(edit("A1", 10.0)).unwrap();
        let visible = engine.plate().clone();
        engine.apply(Operation::Undo).unwrap();
        engine.apply(Operation::Redo).unwrap();
        assert_eq!(*engine.plate(), visible);
    }

    #[test]
    fn test_redo_after_commit_is_noop() {
        let mut engine = PlateEngine::new();
        engine.apply(edit("A1", 1.0)).unwrap();
        engine.apply(Operation::Undo).unwrap();
        engine.apply(edit("A1", 2.0)).unwrap();
        let result = engine.apply(Operation::Redo).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("Nothing to redo")));
        assert_eq!(
            engine.plate().well(engine.format(), "A1").unwrap().concentration,
            2.0
        );
    }

    #[test]
    fn test_mass_patch_converts_to_micromolar() {
        let mut engine = PlateEngine::new();
        engine
            .apply(Operation::EditWell {
                id: "B2".to_string(),
                patch: WellPatch {
                    concentration: Some(18.0157),
                    mw: Some(180.157),
                    ..Default::default()
                },
                unit: ConcentrationUnit::Mass,
            })
            .unwrap();
        let well = engine.plate().well(engine.format(), "B2").unwrap();
        assert!((well.concentration - 100.0).abs() < 1e-9);
        assert_eq!(well.mw, 180.157);
    }

    #[test]
    fn test_mass_patch_uses_existing_mw() {
        let mut engine = PlateEngine::new();
        engine
            .apply(Operation::EditWell {
                id: "B2".to_string(),
                patch: WellPatch {
                    mw: Some(180.157),
                    ..Default::default()
                },
                unit: ConcentrationUnit::Molar,
            })
            .unwrap();
        engine
            .apply(Operation::EditWell {
                id: "B2".to_string(),
                patch: WellPatch {
                    concentration: Some(18.0157),
                    ..Default::default()
                },
                unit: ConcentrationUnit::Mass,
            })
            .unwrap();
        let well = engine.plate().well(engine.format(), "B2").unwrap();
        assert!((well.concentration - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_mass_patch_without_mw_is_refused_without_commit() {
        let mut engine = PlateEngine::new();
        let before = engine.state().history.len();
        let err = engine
            .apply(Operation::EditWell {
                id: "B2".to_string(),
                patch: WellPatch {
                    concentration: Some(5.0),
                    ..Default::default()
                },
                unit: ConcentrationUnit::Mass,
            })
            .unwrap_err();
        assert!(err.message.contains("Molecular weight required"));
        assert_eq!(engine.state().history.len(), before);
        assert_eq!(
            engine.plate().well(engine.format(), "B2").unwrap().concentration,
            0.0
        );
    }

    #[test]
    fn test_negative_concentration_stores_zero() {
        let mut engine = PlateEngine::new();
        engine.apply(edit("A1", -3.0)).unwrap();
        assert_eq!(
            engine.plate().well(engine.format(), "A1").unwrap().concentration,
            0.0
        );
    }

    #[test]
    fn test_edit_unknown_well() {
        let mut engine = PlateEngine::new();
        let err = engine.apply(edit("Z9", 1.0)).unwrap_err();
        assert!(matches!(err.code, ErrorCode::NotFound));
    }

    #[test]
    fn test_edit_wells_is_one_history_entry() {
        let mut engine = PlateEngine::new();
        engine
            .apply(Operation::EditWells {
                ids: vec!["A1".to_string(), "A2".to_string(), "A3".to_string()],
                patch: WellPatch {
                    strain: Some("E. coli".to_string()),
                    ..Default::default()
                },
                unit: ConcentrationUnit::Molar,
            })
            .unwrap();
        assert_eq!(engine.state().history.len(), 2);
        engine.apply(Operation::Undo).unwrap();
        assert_eq!(engine.plate().well(engine.format(), "A2").unwrap().strain, "");
    }

    #[test]
    fn test_dilution_operation() {
        let mut engine = PlateEngine::new();
        let result = engine
            .apply(Operation::GenerateDilution {
                request: DilutionRequest {
                    start: "A1".to_string(),
                    end: "A5".to_string(),
                    compound: "Drug".to_string(),
                    mw: 0.0,
                    scale: DilutionScale::Linear,
                    start_conc: 0.0,
                    end_conc: Some(100.0),
                    factor: None,
                    unit: ConcentrationUnit::Molar,
                },
            })
            .unwrap();
        assert_eq!(result.changed_wells.len(), 5);
        let concs: Vec<f64> = ["A1", "A2", "A3", "A4", "A5"]
            .iter()
            .map(|id| engine.plate().well(engine.format(), id).unwrap().concentration)
            .collect();
        assert_eq!(concs, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(engine.state().history.len(), 2);
    }

    #[test]
    fn test_checkerboard_operation() {
        let mut engine = PlateEngine::new();
        engine
            .apply(Operation::Select {
                id: "A1".to_string(),
                mode: SelectionMode::Replace,
            })
            .unwrap();
        let result = engine
            .apply(Operation::GenerateCheckerboard {
                request: CheckerboardRequest {
                    drug_a: "A".to_string(),
                    conc_a: 100.0,
                    unit_a: ConcentrationUnit::Molar,
                    mw_a: 0.0,
                    drug_b: "B".to_string(),
                    conc_b: 50.0,
                    unit_b: ConcentrationUnit::Molar,
                    mw_b: 0.0,
                    factor: 2.0,
                    color_a: "#0000ff".to_string(),
                    color_b: "#ff0000".to_string(),
                },
            })
            .unwrap();
        assert!(result.protocol.is_some());
        assert!(engine.selection().is_empty());
        assert!(engine.checkerboard().is_some());
        let h1 = engine.plate().well(engine.format(), "H1").unwrap();
        assert_eq!(h1.control_type, ControlType::Positive);
        let g12 = engine.plate().well(engine.format(), "G12").unwrap();
        assert_eq!(g12.slot, Some(CheckerboardSlot::Combination));
        assert_eq!(g12.concentration, 1.5625);
    }

    #[test]
    fn test_replace_layout_validates_and_clears_selection() {
        let mut engine = PlateEngine::new();
        engine
            .apply(Operation::Select {
                id: "C3".to_string(),
                mode: SelectionMode::Replace,
            })
            .unwrap();
        let wells: Vec<Well> = engine.format().well_ids().map(Well::empty).collect();
        engine.apply(Operation::ReplaceLayout { wells }).unwrap();
        assert!(engine.selection().is_empty());

        // A short array is rejected and the grid stays put.
        let before = engine.plate().clone();
        let short: Vec<Well> = engine.format().well_ids().take(10).map(Well::empty).collect();
        let err = engine
            .apply(Operation::ReplaceLayout { wells: short })
            .unwrap_err();
        assert!(matches!(err.code, ErrorCode::InvalidInput));
        assert_eq!(*engine.plate(), before);
    }

    #[test]
    fn test_selection_modes() {
        let mut engine = PlateEngine::new();
        engine
            .apply(Operation::Select {
                id: "A1".to_string(),
                mode: SelectionMode::Toggle,
            })
            .unwrap();
        engine
            .apply(Operation::Select {
                id: "A2".to_string(),
                mode: SelectionMode::Toggle,
            })
            .unwrap();
        assert_eq!(engine.selection().ids(), ["A1", "A2"]);
        engine
            .apply(Operation::Select {
                id: "B1".to_string(),
                mode: SelectionMode::Replace,
            })
            .unwrap();
        assert_eq!(engine.selection().ids(), ["B1"]);
        let err = engine
            .apply(Operation::Select {
                id: "Z1".to_string(),
                mode: SelectionMode::Replace,
            })
            .unwrap_err();
        assert!(matches!(err.code, ErrorCode::NotFound));
    }

    #[test]
    fn test_workflow_applies_in_order() {
        let mut engine = PlateEngine::new();
        let results = engine
            .apply_workflow(Workflow {
                operations: vec![edit("A1", 1.0), edit("A1", 2.0), Operation::Undo],
            })
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(
            engine.plate().well(engine.format(), "A1").unwrap().concentration,
            1.0
        );
        assert_eq!(engine.operation_log().len(), 3);
    }

    #[test]
    fn test_journal_records_op_ids() {
        let mut engine = PlateEngine::new();
        engine.apply(edit("A1", 1.0)).unwrap();
        engine.apply(Operation::Undo).unwrap();
        let log = engine.operation_log();
        assert_eq!(log[0].result.op_id, "op-1");
        assert_eq!(log[1].result.op_id, "op-2");
    }
}
