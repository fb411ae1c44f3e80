//! Runtime compilation of project definitions into engine inputs.
//!
//! Geometry, models and the initial wellbore are compiled once per project.
//! Operations are compiled right before they run, so mud catalog edits made
//! after an operation was configured are picked up by its next run.

use std::sync::Arc;

use wf_geometry::{HoleSection, PipeSection, Survey, SurveyStation, WellGeometry};
use wf_layers::{FloatState, Fluid, FluidLayer, LayerStack, Region, WellboreState};
use wf_project::schema::{
    AplModelDef, FloatStateDef, LayerDef, ModelsDef, MudDef, OperationDef, OperationKindDef,
    Project, SwabSurgeModelDef, WellDef,
};
use wf_sim::{
    BackfillPolicy, Calibration, FloatConfig, LinearApl, ModelSet, MudSelection, OperationKind,
    OperationPlan, ProportionalSwabSurge, PumpEntry, PumpQueue, PumpRateConfig, SimError,
    SimResult, TabulatedApl,
};

use crate::error::AppResult;

/// Everything an operation runs against apart from its own config.
#[derive(Debug, Clone)]
pub struct WellRuntime {
    pub geometry: Arc<WellGeometry>,
    pub models: ModelSet,
    pub initial: WellboreState,
}

pub fn compile_project(project: &Project) -> AppResult<WellRuntime> {
    let geometry = compile_well(&project.well)?;
    let initial = compile_initial_state(project, &geometry)?;
    Ok(WellRuntime {
        geometry: Arc::new(geometry),
        models: compile_models(&project.models),
        initial,
    })
}

pub fn compile_well(well: &WellDef) -> AppResult<WellGeometry> {
    let hole = well
        .hole
        .iter()
        .map(|h| HoleSection {
            name: h.name.clone(),
            top_md: h.top_md,
            bottom_md: h.bottom_md,
            diameter_m: h.diameter_m,
            cased: h.cased,
        })
        .collect();
    let pipe = well
        .pipe
        .iter()
        .map(|p| PipeSection {
            name: p.name.clone(),
            top_md: p.top_md,
            bottom_md: p.bottom_md,
            od_m: p.od_m,
            id_m: p.id_m,
        })
        .collect();
    let survey = if well.survey.is_empty() {
        Survey::vertical()
    } else {
        Survey::new(
            well.survey
                .iter()
                .map(|s| SurveyStation {
                    md: s.md,
                    tvd: s.tvd,
                })
                .collect(),
        )?
    };
    Ok(WellGeometry::new(hole, pipe, survey)?)
}

pub fn compile_models(models: &ModelsDef) -> ModelSet {
    let mut set = ModelSet::default();
    match &models.swab_surge {
        SwabSurgeModelDef::Disabled => {}
        SwabSurgeModelDef::Proportional {
            coefficient_pa_s_per_m,
        } => {
            set.swab_surge = Arc::new(ProportionalSwabSurge {
                coefficient_pa_s_per_m: *coefficient_pa_s_per_m,
            });
        }
    }
    match &models.apl {
        AplModelDef::Disabled => {}
        AplModelDef::Linear {
            coefficient_pa_s_per_m3,
            per_metre_of_hole,
        } => {
            set.apl = Arc::new(LinearApl {
                coefficient_pa_s_per_m3: *coefficient_pa_s_per_m3,
                per_metre_of_hole: *per_metre_of_hole,
            });
        }
        AplModelDef::Tabulated { points } => {
            set.apl = Arc::new(TabulatedApl {
                points: points.iter().map(|p| (p.rate_m3ps, p.loss_pa)).collect(),
            });
        }
    }
    set
}

/// Look up a mud by id and turn it into a layer fluid.
pub fn resolve_mud(muds: &[MudDef], id: &str, role: &'static str) -> SimResult<Fluid> {
    let mud = muds
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| SimError::UnresolvedMud {
            id: id.to_string(),
            role,
        })?;
    let mut fluid = Fluid::new(mud.density_kg_m3).with_label(mud.name.clone());
    fluid.color = mud.color.clone();
    Ok(fluid)
}

fn resolve_optional(
    muds: &[MudDef],
    id: Option<&String>,
    role: &'static str,
) -> SimResult<Option<Fluid>> {
    id.map(|id| resolve_mud(muds, id, role)).transpose()
}

pub fn compile_kind(kind: OperationKindDef) -> OperationKind {
    match kind {
        OperationKindDef::TripOut => OperationKind::TripOut,
        OperationKindDef::TripIn => OperationKind::TripIn,
        OperationKindDef::Circulate => OperationKind::Circulate,
        OperationKindDef::ReamOut => OperationKind::ReamOut,
        OperationKindDef::ReamIn => OperationKind::ReamIn,
    }
}

/// Resolve an operation's mud references against the current catalog.
pub fn compile_operation(op: &OperationDef, muds: &[MudDef]) -> SimResult<OperationPlan> {
    let base = resolve_mud(muds, &op.muds.base, "base")?;
    let selection = MudSelection {
        backfill: resolve_optional(muds, op.muds.backfill.as_ref(), "backfill")?,
        fill: resolve_optional(muds, op.muds.fill.as_ref(), "fill")?,
        ream: resolve_optional(muds, op.muds.ream.as_ref(), "ream")?,
        base,
    };

    let mut queue = PumpQueue::default();
    for entry in &op.queue {
        queue.entries.push(PumpEntry {
            fluid: resolve_mud(muds, &entry.mud_id, "queue")?,
            volume_m3: entry.volume_m3,
        });
    }

    let pump = match &op.pump {
        Some(p) => PumpRateConfig {
            min_rate_m3ps: p.min_rate_m3ps,
            max_rate_m3ps: p.max_rate_m3ps,
            step_volume_m3: p.step_volume_m3,
            ream_rate_m3ps: p.ream_rate_m3ps,
        },
        None => PumpRateConfig::default(),
    };

    Ok(OperationPlan {
        label: op.label.clone(),
        kind: compile_kind(op.kind),
        start_md: op.start_md,
        end_md: op.end_md,
        step_size_m: op.step_size_m,
        target_esd_kg_m3: op
            .target_esd_kg_m3
            .unwrap_or(selection.base.density_kg_m3),
        control_md: op.control_md,
        trip_speed_mps: op.trip_speed_mps,
        eccentricity_factor: op.eccentricity_factor,
        muds: selection,
        backfill: BackfillPolicy {
            switch_to_active_after_displacement: op.backfill.switch_to_active_after_displacement,
            displacement_threshold_m3: op.backfill.displacement_threshold_m3,
        },
        float: FloatConfig {
            installed: op.float.installed,
            crack_pressure_pa: op.float.crack_pressure_pa,
            floated: op.float.floated,
        },
        pump,
        queue,
        required_volume_m3: op.required_volume_m3,
        calibration: Calibration {
            use_observed_pit_gain: op.calibration.use_observed_pit_gain,
            observed_initial_pit_gain_m3: op.calibration.observed_initial_pit_gain_m3,
        },
    })
}

fn compile_column(muds: &[MudDef], region: Region, layers: &[LayerDef]) -> AppResult<LayerStack> {
    let layers = layers
        .iter()
        .map(|l| {
            Ok(FluidLayer::new(
                l.top_md,
                l.bottom_md,
                resolve_mud(muds, &l.mud_id, "initial column")?,
            ))
        })
        .collect::<SimResult<Vec<_>>>()?;
    Ok(LayerStack::from_layers(region, layers)?)
}

/// Initial wellbore: one mud everywhere, with optional explicit string and
/// annulus columns.
pub fn compile_initial_state(
    project: &Project,
    geometry: &WellGeometry,
) -> AppResult<WellboreState> {
    let initial = &project.initial;
    let mud = resolve_mud(&project.muds, &initial.mud_id, "initial")?;
    let mut state = WellboreState::uniform(geometry, initial.bit_md, mud);
    if !initial.string_layers.is_empty() {
        state.string = compile_column(&project.muds, Region::String, &initial.string_layers)?;
    }
    if !initial.annulus_layers.is_empty() {
        state.annulus = compile_column(&project.muds, Region::Annulus, &initial.annulus_layers)?;
    }
    state.float_state = match initial.float {
        FloatStateDef::NotInstalled => FloatState::NotInstalled,
        FloatStateDef::Closed => FloatState::Closed,
        FloatStateDef::Open => FloatState::Open,
    };
    state.esd_at_control_kg_m3 = state.static_esd_at(state.control_md, geometry);
    state.check_invariants()?;
    Ok(state)
}
