//! Surface back pressure needed to hold a target ESD at the control depth.

use tracing::debug;
use wf_core::{equivalent_density_kg_m3, hydrostatic_pa};
use wf_geometry::GeometryProvider;
use wf_layers::WellboreState;

use crate::error::{SimError, SimResult};

/// Back pressure below this is rounding noise (Pa).
const SABP_FLOOR_PA: f64 = 1e-6;

/// Result of the back-pressure solve at one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackPressure {
    pub control_md: f64,
    pub control_tvd: f64,
    /// ESD of the fluid column alone.
    pub static_esd_kg_m3: f64,
    pub sabp_pa: f64,
    /// ESD with `sabp_pa` applied at surface.
    pub effective_esd_kg_m3: f64,
}

/// Solve `(P_hydro(control) + SABP) / (g · TVD(control)) = target` for SABP.
///
/// The relation is linear in SABP. A column already heavier than the target
/// needs no back pressure, so the result is clamped at zero.
pub fn solve_back_pressure(
    state: &WellboreState,
    control_md: f64,
    target_esd_kg_m3: f64,
    geometry: &dyn GeometryProvider,
) -> SimResult<BackPressure> {
    let control_tvd = geometry.tvd(control_md);
    let hydro = state.annulus_pressure_at(control_md, geometry);
    if control_tvd <= 0.0 {
        return Ok(BackPressure {
            control_md,
            control_tvd,
            static_esd_kg_m3: 0.0,
            sabp_pa: 0.0,
            effective_esd_kg_m3: 0.0,
        });
    }

    let required = hydrostatic_pa(target_esd_kg_m3, control_tvd) - hydro;
    if !required.is_finite() {
        return Err(SimError::NonConvergentBackPressureSolve { control_md });
    }
    let sabp_pa = if required < -SABP_FLOOR_PA {
        debug!(control_md, required, "column exceeds target ESD; back pressure clamped to zero");
        0.0
    } else if required < SABP_FLOOR_PA {
        0.0
    } else {
        required
    };

    Ok(BackPressure {
        control_md,
        control_tvd,
        static_esd_kg_m3: equivalent_density_kg_m3(hydro, control_tvd),
        sabp_pa,
        effective_esd_kg_m3: equivalent_density_kg_m3(hydro + sabp_pa, control_tvd),
    })
}

/// Write the solve into the state's reporting fields.
pub(crate) fn apply_back_pressure(state: &mut WellboreState, bp: &BackPressure, dynamic_pa: f64) {
    state.control_md = bp.control_md;
    state.control_tvd = bp.control_tvd;
    state.esd_at_control_kg_m3 = bp.static_esd_kg_m3;
    state.sabp_pa = bp.sabp_pa;
    state.dynamic_sabp_pa = dynamic_pa;
}
