//! Float valve and U-tube equalization between string and annulus.
//!
//! The differential across the bit is the string column minus the annulus
//! column plus the applied back pressure. A closed float opens once the
//! differential exceeds the crack pressure and closes again when it falls to
//! zero. While open, string fluid drains out of the bit and up the annulus
//! (air takes its place at the top of the string) until the columns balance.
//! Without a float the columns also balance the other way, with annulus fluid
//! entering a partially empty string while the trip tank keeps the annulus full.

use tracing::debug;
use wf_core::{VOLUME_EPS, bisect};
use wf_geometry::GeometryProvider;
use wf_layers::{FloatState, Fluid, LayerError, Region, WellboreState, total_volume};

use crate::error::SimResult;
use crate::plan::FloatConfig;

/// Differential below which the float counts as balanced (Pa).
const BALANCE_TOL_PA: f64 = 1.0;
const TRANSFER_TOL_M3: f64 = 1e-9;
const TRANSFER_MAX_ITER: usize = 200;

/// Volumes moved by one equalization.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UTubeOutcome {
    /// Drained out of the string (positive) or drawn into it (negative).
    pub transfer_m3: f64,
    /// Volume gained in the pits; negative when the trip tank tops up the annulus.
    pub pit_gain_m3: f64,
}

/// String over annulus pressure at the bit (Pa).
pub fn float_differential_pa(state: &WellboreState, geometry: &dyn GeometryProvider) -> f64 {
    state.string_pressure_at_bit(geometry)
        - (state.sabp_pa + state.annulus_pressure_at(state.bit_md, geometry))
}

/// Float state to carry into an operation.
pub fn initial_float_state(incoming: FloatState, config: &FloatConfig) -> FloatState {
    match (config.installed, incoming) {
        (false, _) => FloatState::NotInstalled,
        (true, FloatState::NotInstalled) => FloatState::Closed,
        (true, s) => s,
    }
}

/// Advance the float state machine and equalize the columns.
pub fn update_float(
    state: &WellboreState,
    config: &FloatConfig,
    geometry: &dyn GeometryProvider,
) -> SimResult<(WellboreState, UTubeOutcome)> {
    if state.bit_md <= 0.0 {
        return Ok((state.clone(), UTubeOutcome::default()));
    }
    let dp = float_differential_pa(state, geometry);
    match state.float_state {
        FloatState::NotInstalled => {
            if dp > BALANCE_TOL_PA {
                drain_to_balance(state, geometry)
            } else if dp < -BALANCE_TOL_PA {
                draw_to_balance(state, geometry)
            } else {
                Ok((state.clone(), UTubeOutcome::default()))
            }
        }
        FloatState::Closed => {
            if dp > config.crack_pressure_pa.max(BALANCE_TOL_PA) {
                debug!(bit_md = state.bit_md, dp, "float cracked open");
                let mut opened = state.clone();
                opened.float_state = FloatState::Open;
                drain_to_balance(&opened, geometry)
            } else {
                Ok((state.clone(), UTubeOutcome::default()))
            }
        }
        FloatState::Open => {
            if dp > BALANCE_TOL_PA {
                drain_to_balance(state, geometry)
            } else {
                let mut closed = state.clone();
                closed.float_state = FloatState::Closed;
                Ok((closed, UTubeOutcome::default()))
            }
        }
    }
}

/// Move `volume_m3` of string fluid out of the bit and up the annulus.
fn drain(
    state: &WellboreState,
    volume_m3: f64,
    geometry: &dyn GeometryProvider,
) -> Result<(WellboreState, f64), LayerError> {
    let (string, removed) = state.string.remove_from_bottom(volume_m3, geometry)?;
    let (string, _) = string.fill_void_above(Fluid::air(), 0.0, geometry);
    let (annulus, returns) = state.annulus.insert_at_bottom(removed, geometry)?;
    let mut next = state.clone();
    next.string = string;
    next.annulus = annulus;
    Ok((next, total_volume(&returns)))
}

/// Let `volume_m3` of annulus fluid into the bottom of the string.
fn draw(
    state: &WellboreState,
    volume_m3: f64,
    geometry: &dyn GeometryProvider,
) -> Result<WellboreState, LayerError> {
    let top_up = state
        .annulus
        .layers()
        .first()
        .map(|l| l.fluid.clone())
        .unwrap_or_else(Fluid::air);
    let (annulus, expelled) = state.annulus.insert_at_top(top_up, volume_m3, geometry)?;
    // Bottom of the annulus enters the bit first and ends up highest in the string.
    let arrivals: Vec<_> = expelled.into_iter().rev().collect();
    let (string, _vented) = state.string.insert_at_bottom(arrivals, geometry)?;
    let mut next = state.clone();
    next.string = string;
    next.annulus = annulus;
    Ok(next)
}

fn drain_to_balance(
    state: &WellboreState,
    geometry: &dyn GeometryProvider,
) -> SimResult<(WellboreState, UTubeOutcome)> {
    let liquid = state.string.volume(geometry) - state.string.void_volume(geometry);
    if liquid <= VOLUME_EPS || state.annulus.is_empty() {
        return Ok((state.clone(), UTubeOutcome::default()));
    }

    let residual = |v: f64| -> f64 {
        match drain(state, v, geometry) {
            Ok((s, _)) => float_differential_pa(&s, geometry),
            Err(_) => f64::NAN,
        }
    };
    let volume = if residual(liquid) >= 0.0 {
        liquid
    } else {
        bisect(
            residual,
            0.0,
            liquid,
            TRANSFER_TOL_M3,
            TRANSFER_MAX_ITER,
            "u-tube drain volume",
        )?
    };

    let (next, returns) = drain(state, volume, geometry)?;
    debug!(volume, returns, "u-tube drained string");
    Ok((
        next,
        UTubeOutcome {
            transfer_m3: volume,
            pit_gain_m3: returns,
        },
    ))
}

fn draw_to_balance(
    state: &WellboreState,
    geometry: &dyn GeometryProvider,
) -> SimResult<(WellboreState, UTubeOutcome)> {
    let void = state.string.void_volume(geometry);
    if void <= VOLUME_EPS || state.annulus.is_empty() {
        return Ok((state.clone(), UTubeOutcome::default()));
    }
    let capacity = Region::Annulus.capacity(geometry, 0.0, state.bit_md);
    let limit = void.min(capacity);

    let residual = |v: f64| -> f64 {
        match draw(state, v, geometry) {
            Ok(s) => float_differential_pa(&s, geometry),
            Err(_) => f64::NAN,
        }
    };
    let volume = if residual(limit) <= 0.0 {
        limit
    } else {
        bisect(
            residual,
            0.0,
            limit,
            TRANSFER_TOL_M3,
            TRANSFER_MAX_ITER,
            "u-tube fill volume",
        )?
    };

    let next = draw(state, volume, geometry)?;
    debug!(volume, "u-tube filled string from annulus");
    Ok((
        next,
        UTubeOutcome {
            transfer_m3: -volume,
            pit_gain_m3: -volume,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_geometry::WellGeometry;
    use wf_layers::{FluidLayer, LayerStack};

    fn well() -> WellGeometry {
        WellGeometry::uniform_vertical(2000.0, 0.2159, 0.127, 0.1086).unwrap()
    }

    fn slugged(g: &WellGeometry, float_state: FloatState) -> WellboreState {
        let mud = Fluid::new(1200.0);
        let slug = Fluid::new(1500.0);
        let string = LayerStack::from_layers(
            Region::String,
            vec![
                FluidLayer::new(0.0, 200.0, slug),
                FluidLayer::new(200.0, 2000.0, mud.clone()),
            ],
        )
        .unwrap();
        let mut s = WellboreState::uniform(g, 2000.0, mud);
        s.string = string;
        s.float_state = float_state;
        s
    }

    #[test]
    fn open_float_drains_heavy_slug() {
        let g = well();
        let s = slugged(&g, FloatState::NotInstalled);
        assert!(float_differential_pa(&s, &g) > 0.0);
        let (after, out) = update_float(&s, &FloatConfig::default(), &g).unwrap();
        assert!(out.transfer_m3 > 0.0);
        assert!((out.pit_gain_m3 - out.transfer_m3).abs() < 1e-6);
        assert!(float_differential_pa(&after, &g).abs() < 1.0);
        assert!(after.string.layers()[0].fluid.is_air());
        after.check_invariants().unwrap();
    }

    #[test]
    fn closed_float_holds_below_crack() {
        let g = well();
        let s = slugged(&g, FloatState::Closed);
        let dp = float_differential_pa(&s, &g);
        let cfg = FloatConfig {
            installed: true,
            crack_pressure_pa: dp * 2.0,
            floated: false,
        };
        let (after, out) = update_float(&s, &cfg, &g).unwrap();
        assert_eq!(after.float_state, FloatState::Closed);
        assert_eq!(out.transfer_m3, 0.0);

        let cfg = FloatConfig {
            crack_pressure_pa: dp * 0.5,
            ..cfg
        };
        let (after, out) = update_float(&s, &cfg, &g).unwrap();
        assert_eq!(after.float_state, FloatState::Open);
        assert!(out.transfer_m3 > 0.0);

        let (settled, _) = update_float(&after, &cfg, &g).unwrap();
        assert_eq!(settled.float_state, FloatState::Closed);
    }

    #[test]
    fn no_float_refills_empty_string() {
        let g = well();
        let mud = Fluid::new(1200.0);
        let mut s = WellboreState::uniform(&g, 2000.0, mud.clone());
        let (drained, _) = s.string.remove_from_bottom(1.0, &g).unwrap();
        s.string = drained.fill_void_above(Fluid::air(), 0.0, &g).0;
        let (after, out) = update_float(&s, &FloatConfig::default(), &g).unwrap();
        assert!((out.transfer_m3 + 1.0).abs() < 1e-4);
        assert!(after.string.void_volume(&g) < 1e-4);
        after.check_invariants().unwrap();
    }

    #[test]
    fn initial_state_follows_config() {
        let cfg = FloatConfig {
            installed: true,
            ..Default::default()
        };
        assert_eq!(initial_float_state(FloatState::NotInstalled, &cfg), FloatState::Closed);
        assert_eq!(initial_float_state(FloatState::Open, &cfg), FloatState::Open);
        assert_eq!(
            initial_float_state(FloatState::Closed, &FloatConfig::default()),
            FloatState::NotInstalled
        );
    }
}
