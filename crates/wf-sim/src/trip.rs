//! Fluid movement for one tripping increment.
//!
//! Pipe geometry is indexed by the MD it occupies, so moving the bit from
//! `b0` to `b1` only changes which MD intervals are pipe, annulus, or pocket.

use tracing::warn;
use wf_core::{MD_EPS, VOLUME_EPS};
use wf_geometry::GeometryProvider;
use wf_layers::{
    FloatState, Fluid, LayerStack, Parcel, Region, WellboreState, blend_by_depth, total_volume,
};

use crate::error::SimResult;
use crate::plan::{BackfillPolicy, MudSelection};

/// Volumes moved while pulling one increment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PullOutcome {
    pub backfill_m3: f64,
    /// Left the well inside the pipe (float closed).
    pub pulled_wet_m3: f64,
}

/// Volumes moved while running one increment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunInOutcome {
    /// Closed-end displacement of the new pipe below the old bit.
    pub displacement_m3: f64,
    pub fill_m3: f64,
    pub returns_m3: f64,
}

/// Mud to backfill next, splitting the volume at the switch threshold.
fn backfill_parcels(
    volume_m3: f64,
    cumulative_before: f64,
    policy: &BackfillPolicy,
    muds: &MudSelection,
) -> Vec<(Fluid, f64)> {
    if !policy.switch_to_active_after_displacement {
        return vec![(muds.backfill().clone(), volume_m3)];
    }
    let base_left = (policy.displacement_threshold_m3 - cumulative_before).max(0.0);
    let base = volume_m3.min(base_left);
    let mut out = Vec::with_capacity(2);
    if base > VOLUME_EPS {
        out.push((muds.base.clone(), base));
    }
    if volume_m3 - base > VOLUME_EPS {
        out.push((muds.backfill().clone(), volume_m3 - base));
    }
    out
}

/// Pull the bit from `state.bit_md` up to `new_bit_md`.
///
/// With the float open (or absent) the bore content below the new bit stays
/// behind and falls into the pocket along with the annulus; the vacated
/// volume is the steel. With the float closed the pipe is pulled wet: its
/// content rises with it and the vacated volume is the full closed-end
/// displacement. Backfill tops up the annulus at surface and the annulus
/// column slides down past the bit to fill the pocket.
pub fn pull_out(
    state: &WellboreState,
    new_bit_md: f64,
    muds: &MudSelection,
    policy: &BackfillPolicy,
    cumulative_backfill_m3: f64,
    geometry: &dyn GeometryProvider,
) -> SimResult<(WellboreState, PullOutcome)> {
    let b0 = state.bit_md;
    let b1 = new_bit_md.min(b0);
    let open_ended = state.float_state != FloatState::Closed;

    let (ann_upper, ann_cut) = state.annulus.split_at(b1);
    let (string, bore_cut, pulled_wet) = if open_ended {
        let (upper, cut) = state.string.split_at(b1);
        (upper, cut, 0.0)
    } else {
        let (moved, overflow) = state.string.move_with_pipe(b1, 0.0, geometry)?;
        let (moved, _) = moved.fill_void_above(Fluid::air(), 0.0, geometry);
        (moved, LayerStack::empty(Region::String, b1), total_volume(&overflow))
    };

    let fallen = blend_by_depth(&ann_cut, &bore_cut, geometry);
    let vacated = Region::Pocket.capacity(geometry, b1, b0) - total_volume(&fallen);
    let backfill = vacated.max(0.0);

    let mut annulus = ann_upper;
    let mut slid: Vec<Parcel> = Vec::new();
    for (fluid, volume) in backfill_parcels(backfill, cumulative_backfill_m3, policy, muds) {
        let (next, expelled) = annulus.insert_at_top(fluid, volume, geometry)?;
        annulus = next;
        slid.extend(expelled);
    }

    // Exit order is deepest first; the last to leave sits on top.
    let mut pocket_parcels: Vec<Parcel> = slid.into_iter().rev().collect();
    pocket_parcels.extend(fallen);
    pocket_parcels.extend(state.pocket.parcels(geometry));
    let (pocket, spill) = LayerStack::layout_down(
        Region::Pocket,
        b1,
        state.td_md,
        pocket_parcels,
        geometry,
    )?;
    let spilled = total_volume(&spill);
    if spilled > 1e-6 {
        warn!(spilled, b1, "pocket overflow after pulling pipe");
    }

    let mut next = state.clone();
    next.bit_md = b1;
    next.bit_tvd = geometry.tvd(b1);
    next.string = string;
    next.annulus = annulus;
    next.pocket = pocket;
    Ok((
        next,
        PullOutcome {
            backfill_m3: backfill,
            pulled_wet_m3: pulled_wet,
        },
    ))
}

/// Run the bit from `state.bit_md` down to `new_bit_md`.
///
/// The string content travels with the pipe. Unless the pipe is floated in,
/// the string is then filled to surface with fill mud, which settles onto
/// the liquid already inside. The pocket content over the increment is swept
/// into the bottom of the annulus and the annulus overflow leaves at surface
/// as displacement returns.
pub fn run_in(
    state: &WellboreState,
    new_bit_md: f64,
    fill: Option<&Fluid>,
    geometry: &dyn GeometryProvider,
) -> SimResult<(WellboreState, RunInOutcome)> {
    let b0 = state.bit_md;
    let b1 = new_bit_md.max(b0);

    let (string, overflow) = state.string.move_with_pipe(b1, 0.0, geometry)?;
    if total_volume(&overflow) > 1e-6 {
        warn!(b1, "string content exceeded capacity after running pipe");
    }
    let (string, _) = string.fill_void_above(Fluid::air(), 0.0, geometry);
    let (string, fill_m3) = match fill {
        Some(fluid) => {
            let void = string.void_volume(geometry);
            let (filled, _) = string.pour_in(fluid.clone(), void, geometry)?;
            (filled, void)
        }
        None => (string, 0.0),
    };

    let (swept, pocket) = state.pocket.split_at(b1);
    let mut parcels = state.annulus.parcels(geometry);
    parcels.extend(swept.parcels(geometry));
    let (annulus, returns) =
        LayerStack::layout_up(Region::Annulus, 0.0, b1, parcels, geometry)?;

    let pocket = if state.td_md - b1 <= MD_EPS {
        LayerStack::empty(Region::Pocket, state.td_md)
    } else {
        pocket
    };

    let mut next = state.clone();
    next.bit_md = b1;
    next.bit_tvd = geometry.tvd(b1);
    next.string = string;
    next.annulus = annulus;
    next.pocket = pocket;
    Ok((
        next,
        RunInOutcome {
            displacement_m3: geometry.volume_of_string_od(b0, b1),
            fill_m3,
            returns_m3: total_volume(&returns),
        },
    ))
}
