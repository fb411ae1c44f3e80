//! Project schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    pub well: WellDef,
    #[serde(default)]
    pub muds: Vec<MudDef>,
    pub initial: InitialStateDef,
    #[serde(default)]
    pub operations: Vec<OperationDef>,
    #[serde(default)]
    pub models: ModelsDef,
    #[serde(default)]
    pub presets: Vec<PresetDef>,
}

impl Project {
    pub fn mud(&self, id: &str) -> Option<&MudDef> {
        self.muds.iter().find(|m| m.id == id)
    }

    pub fn preset(&self, name: &str) -> Option<&PresetDef> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Store the current operation list as a named preset, replacing any
    /// preset with the same name.
    pub fn save_preset(&mut self, name: &str) -> &PresetDef {
        let preset = PresetDef {
            name: name.to_string(),
            description: None,
            operations: self.operations.clone(),
        };
        match self.presets.iter().position(|p| p.name == name) {
            Some(idx) => {
                self.presets[idx] = preset;
                &self.presets[idx]
            }
            None => {
                self.presets.push(preset);
                &self.presets[self.presets.len() - 1]
            }
        }
    }

    /// Append a preset's operations with fresh ids. Returns how many were added.
    pub fn apply_preset(&mut self, name: &str) -> Option<usize> {
        let preset = self.preset(name)?.clone();
        let count = preset.operations.len();
        self.operations.extend(preset.instantiate());
        Some(count)
    }
}

/// Hole, pipe and survey data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellDef {
    pub hole: Vec<HoleSectionDef>,
    pub pipe: Vec<PipeSectionDef>,
    /// Empty means vertical.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub survey: Vec<SurveyStationDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoleSectionDef {
    pub name: String,
    pub top_md: f64,
    pub bottom_md: f64,
    pub diameter_m: f64,
    #[serde(default)]
    pub cased: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipeSectionDef {
    pub name: String,
    pub top_md: f64,
    pub bottom_md: f64,
    pub od_m: f64,
    pub id_m: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SurveyStationDef {
    pub md: f64,
    pub tvd: f64,
}

/// Mud catalog entry. Operations refer to muds by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MudDef {
    pub id: String,
    pub name: String,
    pub density_kg_m3: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Wellbore content before the first operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitialStateDef {
    pub bit_md: f64,
    /// Mud filling every region unless overridden below.
    pub mud_id: String,
    #[serde(default)]
    pub float: FloatStateDef,
    /// Explicit string column, top to bottom.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub string_layers: Vec<LayerDef>,
    /// Explicit annulus column, top to bottom.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annulus_layers: Vec<LayerDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerDef {
    pub mud_id: String,
    pub top_md: f64,
    pub bottom_md: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FloatStateDef {
    #[default]
    NotInstalled,
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperationKindDef {
    TripOut,
    TripIn,
    Circulate,
    ReamOut,
    ReamIn,
}

impl OperationKindDef {
    pub fn moves_pipe(self) -> bool {
        self != OperationKindDef::Circulate
    }

    pub fn is_ream(self) -> bool {
        matches!(self, OperationKindDef::ReamOut | OperationKindDef::ReamIn)
    }
}

fn new_operation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_eccentricity() -> f64 {
    1.0
}

/// One configured operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationDef {
    #[serde(default = "new_operation_id")]
    pub id: String,
    pub label: String,
    pub kind: OperationKindDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_md: Option<f64>,
    /// Final bit depth; for circulation the bit depth it is held at.
    pub end_md: f64,
    #[serde(default)]
    pub step_size_m: f64,
    /// Defaults to the base mud density.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_esd_kg_m3: Option<f64>,
    /// Defaults to the bit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_md: Option<f64>,
    #[serde(default)]
    pub trip_speed_mps: f64,
    #[serde(default = "default_eccentricity")]
    pub eccentricity_factor: f64,
    pub muds: MudRolesDef,
    #[serde(default)]
    pub backfill: BackfillDef,
    #[serde(default)]
    pub float: FloatDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pump: Option<PumpDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queue: Vec<QueueEntryDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_volume_m3: Option<f64>,
    #[serde(default)]
    pub calibration: CalibrationDef,
}

impl OperationDef {
    /// Operation with a single mud and default settings.
    pub fn new(
        label: &str,
        kind: OperationKindDef,
        end_md: f64,
        step_size_m: f64,
        mud_id: &str,
    ) -> Self {
        Self {
            id: new_operation_id(),
            label: label.to_string(),
            kind,
            start_md: None,
            end_md,
            step_size_m,
            target_esd_kg_m3: None,
            control_md: None,
            trip_speed_mps: 0.0,
            eccentricity_factor: default_eccentricity(),
            muds: MudRolesDef {
                base: mud_id.to_string(),
                backfill: None,
                fill: None,
                ream: None,
            },
            backfill: BackfillDef::default(),
            float: FloatDef::default(),
            pump: None,
            queue: Vec::new(),
            required_volume_m3: None,
            calibration: CalibrationDef::default(),
        }
    }

    /// Every mud id this operation refers to, with the role it plays.
    pub fn mud_references(&self) -> Vec<(&'static str, &str)> {
        let mut refs = vec![("base", self.muds.base.as_str())];
        if let Some(id) = &self.muds.backfill {
            refs.push(("backfill", id));
        }
        if let Some(id) = &self.muds.fill {
            refs.push(("fill", id));
        }
        if let Some(id) = &self.muds.ream {
            refs.push(("ream", id));
        }
        for entry in &self.queue {
            refs.push(("queue", &entry.mud_id));
        }
        refs
    }
}

/// Mud ids per role; unset roles use `base`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MudRolesDef {
    pub base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backfill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ream: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BackfillDef {
    #[serde(default)]
    pub switch_to_active_after_displacement: bool,
    #[serde(default)]
    pub displacement_threshold_m3: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FloatDef {
    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub crack_pressure_pa: f64,
    #[serde(default)]
    pub floated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpDef {
    pub min_rate_m3ps: f64,
    pub max_rate_m3ps: f64,
    pub step_volume_m3: f64,
    #[serde(default)]
    pub ream_rate_m3ps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntryDef {
    pub mud_id: String,
    pub volume_m3: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CalibrationDef {
    #[serde(default)]
    pub use_observed_pit_gain: bool,
    #[serde(default)]
    pub observed_initial_pit_gain_m3: f64,
}

/// Pressure model selection with user coefficients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelsDef {
    #[serde(default)]
    pub swab_surge: SwabSurgeModelDef,
    #[serde(default)]
    pub apl: AplModelDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum SwabSurgeModelDef {
    #[default]
    Disabled,
    Proportional {
        coefficient_pa_s_per_m: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum AplModelDef {
    #[default]
    Disabled,
    Linear {
        coefficient_pa_s_per_m3: f64,
        #[serde(default)]
        per_metre_of_hole: bool,
    },
    Tabulated {
        points: Vec<AplPointDef>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AplPointDef {
    pub rate_m3ps: f64,
    pub loss_pa: f64,
}

/// A named, reusable operation list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub operations: Vec<OperationDef>,
}

impl PresetDef {
    /// Copies of the operations with fresh ids.
    pub fn instantiate(&self) -> Vec<OperationDef> {
        self.operations
            .iter()
            .cloned()
            .map(|mut op| {
                op.id = new_operation_id();
                op
            })
            .collect()
    }
}

/// Stand-alone preset file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetFile {
    pub version: u32,
    #[serde(default)]
    pub presets: Vec<PresetDef>,
}
