//! Pumping: mud in at the top of the string, returns out of the annulus.

use wf_core::bisect;
use wf_geometry::GeometryProvider;
use wf_layers::{Fluid, WellboreState, total_volume};

use crate::error::SimResult;
use crate::models::{AnnularPressureLossModel, AplContext};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PumpOutcome {
    pub pumped_m3: f64,
    /// Volume crossing the bit into the annulus.
    pub through_bit_m3: f64,
    pub returns_m3: f64,
}

/// Pump `volume_m3` of `fluid` around the full circuit.
///
/// Mud first fills any drained section of the string; only the rest pushes
/// string content out of the bit and annulus content out at surface.
pub fn circulate_volume(
    state: &WellboreState,
    fluid: &Fluid,
    volume_m3: f64,
    geometry: &dyn GeometryProvider,
) -> SimResult<(WellboreState, PumpOutcome)> {
    let (string, through_bit) = state.string.pour_in(fluid.clone(), volume_m3, geometry)?;
    let crossed = total_volume(&through_bit);
    // Bit exit order matches annulus arrival order.
    let (annulus, returns) = state.annulus.insert_at_bottom(through_bit, geometry)?;

    let mut next = state.clone();
    next.string = string;
    next.annulus = annulus;
    Ok((
        next,
        PumpOutcome {
            pumped_m3: volume_m3,
            through_bit_m3: crossed,
            returns_m3: total_volume(&returns),
        },
    ))
}

/// Highest rate in `[min, max]` whose loss does not exceed `sabp_pa`.
///
/// Keeping APL at or below the static back pressure keeps the choke from
/// going negative. When even the minimum rate exceeds it, the minimum is used.
pub fn select_pump_rate(
    min_rate_m3ps: f64,
    max_rate_m3ps: f64,
    sabp_pa: f64,
    model: &dyn AnnularPressureLossModel,
    ctx: &AplContext,
) -> SimResult<(f64, f64)> {
    let loss = |r: f64| model.loss_pa(r, ctx);
    if loss(max_rate_m3ps) <= sabp_pa {
        return Ok((max_rate_m3ps, loss(max_rate_m3ps)));
    }
    if loss(min_rate_m3ps) >= sabp_pa {
        return Ok((min_rate_m3ps, loss(min_rate_m3ps)));
    }
    let rate = bisect(
        |r| loss(r) - sabp_pa,
        min_rate_m3ps,
        max_rate_m3ps,
        1e-9,
        200,
        "pump rate for annular loss",
    )?;
    // Stay on the feasible side of the root.
    let rate = if loss(rate) > sabp_pa {
        (rate - 1e-9).max(min_rate_m3ps)
    } else {
        rate
    };
    Ok((rate, loss(rate)))
}
