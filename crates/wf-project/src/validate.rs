//! Project validation logic.

use crate::schema::{InitialStateDef, LayerDef, MudDef, OperationDef, Project, WellDef};
use std::collections::HashSet;
use wf_core::MD_EPS;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(field, value, "must be positive"));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(invalid(field, value, "must be non-negative"));
    }
    Ok(())
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_well(&project.well)?;

    let mud_ids = validate_muds(&project.muds)?;
    validate_initial(&project.initial, &mud_ids)?;
    validate_operations(&project.operations, &mud_ids, "operations")?;

    let mut preset_names = HashSet::new();
    for preset in &project.presets {
        if !preset_names.insert(&preset.name) {
            return Err(ValidationError::DuplicateId {
                id: preset.name.clone(),
                context: "presets".to_string(),
            });
        }
        validate_operations(
            &preset.operations,
            &mud_ids,
            &format!("preset '{}'", preset.name),
        )?;
    }

    Ok(())
}

fn validate_well(well: &WellDef) -> Result<(), ValidationError> {
    if well.hole.is_empty() {
        return Err(invalid("well.hole", "[]", "at least one hole section is required"));
    }
    if well.pipe.is_empty() {
        return Err(invalid("well.pipe", "[]", "at least one pipe section is required"));
    }

    let mut expected_top = 0.0;
    for section in &well.hole {
        let field = format!("well.hole '{}'", section.name);
        if (section.top_md - expected_top).abs() > MD_EPS {
            return Err(invalid(
                format!("{field}.top_md"),
                section.top_md,
                "hole sections must be contiguous from surface",
            ));
        }
        if !(section.bottom_md > section.top_md) {
            return Err(invalid(
                format!("{field}.bottom_md"),
                section.bottom_md,
                "must be below top_md",
            ));
        }
        require_positive(&format!("{field}.diameter_m"), section.diameter_m)?;
        expected_top = section.bottom_md;
    }

    let mut expected_top = 0.0;
    for section in &well.pipe {
        let field = format!("well.pipe '{}'", section.name);
        if (section.top_md - expected_top).abs() > MD_EPS {
            return Err(invalid(
                format!("{field}.top_md"),
                section.top_md,
                "pipe sections must be contiguous from surface",
            ));
        }
        if !(section.bottom_md > section.top_md) {
            return Err(invalid(
                format!("{field}.bottom_md"),
                section.bottom_md,
                "must be below top_md",
            ));
        }
        require_positive(&format!("{field}.id_m"), section.id_m)?;
        if !(section.od_m > section.id_m) {
            return Err(invalid(
                format!("{field}.od_m"),
                section.od_m,
                "must exceed id_m",
            ));
        }
        expected_top = section.bottom_md;
    }

    let mut last_md = f64::NEG_INFINITY;
    for station in &well.survey {
        if !(station.md > last_md) {
            return Err(invalid(
                "well.survey.md",
                station.md,
                "stations must be strictly increasing",
            ));
        }
        if !(station.tvd.is_finite() && station.tvd <= station.md + MD_EPS) {
            return Err(invalid(
                "well.survey.tvd",
                station.tvd,
                "must be finite and not exceed MD",
            ));
        }
        last_md = station.md;
    }
    Ok(())
}

fn validate_muds(muds: &[MudDef]) -> Result<HashSet<&str>, ValidationError> {
    let mut ids = HashSet::new();
    for mud in muds {
        if !ids.insert(mud.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: mud.id.clone(),
                context: "muds".to_string(),
            });
        }
        require_positive(&format!("mud '{}'.density_kg_m3", mud.id), mud.density_kg_m3)?;
    }
    Ok(ids)
}

fn require_mud(mud_ids: &HashSet<&str>, id: &str, context: String) -> Result<(), ValidationError> {
    if !mud_ids.contains(id) {
        return Err(ValidationError::MissingReference {
            id: id.to_string(),
            context,
        });
    }
    Ok(())
}

fn validate_initial(
    initial: &InitialStateDef,
    mud_ids: &HashSet<&str>,
) -> Result<(), ValidationError> {
    require_positive("initial.bit_md", initial.bit_md)?;
    require_mud(mud_ids, &initial.mud_id, "initial mud".to_string())?;
    validate_column(&initial.string_layers, initial.bit_md, mud_ids, "initial.string_layers")?;
    validate_column(&initial.annulus_layers, initial.bit_md, mud_ids, "initial.annulus_layers")?;
    Ok(())
}

/// An explicit column must tile `[0, bit_md]` top to bottom.
fn validate_column(
    layers: &[LayerDef],
    bit_md: f64,
    mud_ids: &HashSet<&str>,
    field: &str,
) -> Result<(), ValidationError> {
    if layers.is_empty() {
        return Ok(());
    }
    let mut expected_top = 0.0;
    for layer in layers {
        require_mud(mud_ids, &layer.mud_id, format!("{field} mud"))?;
        if (layer.top_md - expected_top).abs() > MD_EPS {
            return Err(invalid(
                format!("{field}.top_md"),
                layer.top_md,
                "layers must be contiguous from surface",
            ));
        }
        if !(layer.bottom_md > layer.top_md) {
            return Err(invalid(
                format!("{field}.bottom_md"),
                layer.bottom_md,
                "must be below top_md",
            ));
        }
        expected_top = layer.bottom_md;
    }
    if (expected_top - bit_md).abs() > MD_EPS {
        return Err(invalid(
            format!("{field}.bottom_md"),
            expected_top,
            "column must end at the bit",
        ));
    }
    Ok(())
}

fn validate_operations(
    operations: &[OperationDef],
    mud_ids: &HashSet<&str>,
    context: &str,
) -> Result<(), ValidationError> {
    let mut ids = HashSet::new();
    for op in operations {
        if !ids.insert(&op.id) {
            return Err(ValidationError::DuplicateId {
                id: op.id.clone(),
                context: context.to_string(),
            });
        }
        validate_operation(op, mud_ids, context)?;
    }
    Ok(())
}

fn validate_operation(
    op: &OperationDef,
    mud_ids: &HashSet<&str>,
    context: &str,
) -> Result<(), ValidationError> {
    for (role, id) in op.mud_references() {
        require_mud(
            mud_ids,
            id,
            format!("{context} operation '{}' {role} mud", op.label),
        )?;
    }

    let field = |name: &str| format!("operation '{}'.{name}", op.label);
    if !op.end_md.is_finite() {
        return Err(invalid(field("end_md"), op.end_md, "must be finite"));
    }
    if let Some(start) = op.start_md {
        require_non_negative(&field("start_md"), start)?;
    }
    if op.kind.moves_pipe() {
        require_positive(&field("step_size_m"), op.step_size_m)?;
    }
    if let Some(target) = op.target_esd_kg_m3 {
        require_positive(&field("target_esd_kg_m3"), target)?;
    }
    if let Some(control) = op.control_md {
        require_positive(&field("control_md"), control)?;
    }
    require_non_negative(&field("trip_speed_mps"), op.trip_speed_mps)?;
    require_positive(&field("eccentricity_factor"), op.eccentricity_factor)?;
    require_non_negative(
        &field("backfill.displacement_threshold_m3"),
        op.backfill.displacement_threshold_m3,
    )?;
    require_non_negative(&field("float.crack_pressure_pa"), op.float.crack_pressure_pa)?;

    if let Some(pump) = &op.pump {
        require_positive(&field("pump.min_rate_m3ps"), pump.min_rate_m3ps)?;
        if !(pump.max_rate_m3ps >= pump.min_rate_m3ps) {
            return Err(invalid(
                field("pump.max_rate_m3ps"),
                pump.max_rate_m3ps,
                "must not be below min_rate_m3ps",
            ));
        }
        require_positive(&field("pump.step_volume_m3"), pump.step_volume_m3)?;
        require_non_negative(&field("pump.ream_rate_m3ps"), pump.ream_rate_m3ps)?;
    }
    for entry in &op.queue {
        require_non_negative(&field("queue.volume_m3"), entry.volume_m3)?;
    }
    if let Some(required) = op.required_volume_m3 {
        require_non_negative(&field("required_volume_m3"), required)?;
    }
    if op.kind.is_ream() && !(op.trip_speed_mps > 0.0) {
        return Err(invalid(
            field("trip_speed_mps"),
            op.trip_speed_mps,
            "reaming needs a trip speed",
        ));
    }
    Ok(())
}
