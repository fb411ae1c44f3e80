//! Layer stacks: contiguous fluid segments within one region.
//!
//! Fluids are incompressible, so every operation is expressed in volumes and
//! then laid back out along MD through the region capacity. Layout walks the
//! parcels in order, inverting the capacity function by bisection for each
//! boundary, and clamps the final boundary to the exact span so rounding never
//! opens a gap or an overlap.

use serde::{Deserialize, Serialize};
use wf_core::{MD_EPS, VOLUME_EPS, bisect, hydrostatic_pa, equivalent_density_kg_m3};
use wf_geometry::GeometryProvider;

use crate::error::{LayerError, LayerResult};
use crate::fluid::{Fluid, Parcel, merge_parcels, total_volume};
use crate::region::Region;

const BOUNDARY_TOL_M: f64 = 1e-10;
const BOUNDARY_MAX_ITER: usize = 200;

/// Relative volume slack accepted when clamping the last boundary.
fn volume_tol(capacity: f64) -> f64 {
    1e-7 * capacity.max(1.0)
}

/// One fluid segment `[top_md, bottom_md]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidLayer {
    pub top_md: f64,
    pub bottom_md: f64,
    pub fluid: Fluid,
}

impl FluidLayer {
    pub fn new(top_md: f64, bottom_md: f64, fluid: Fluid) -> Self {
        Self {
            top_md,
            bottom_md,
            fluid,
        }
    }

    pub fn thickness(&self) -> f64 {
        self.bottom_md - self.top_md
    }
}

/// Ordered, contiguous layers covering `[top_md, bottom_md]` of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    region: Region,
    top_md: f64,
    bottom_md: f64,
    layers: Vec<FluidLayer>,
}

impl LayerStack {
    /// Zero-span stack located at `md`.
    pub fn empty(region: Region, md: f64) -> Self {
        Self {
            region,
            top_md: md,
            bottom_md: md,
            layers: Vec::new(),
        }
    }

    /// Single fluid over `[top_md, bottom_md]`.
    pub fn filled(region: Region, top_md: f64, bottom_md: f64, fluid: Fluid) -> Self {
        if bottom_md - top_md <= MD_EPS {
            return Self::empty(region, bottom_md);
        }
        Self {
            region,
            top_md,
            bottom_md,
            layers: vec![FluidLayer::new(top_md, bottom_md, fluid)],
        }
    }

    /// Build from explicit layers; they must already be sorted and contiguous.
    pub fn from_layers(region: Region, layers: Vec<FluidLayer>) -> LayerResult<Self> {
        let (top_md, bottom_md) = match (layers.first(), layers.last()) {
            (Some(first), Some(last)) => (first.top_md, last.bottom_md),
            _ => {
                return Err(LayerError::Invariant {
                    region,
                    what: "no layers given".to_string(),
                });
            }
        };
        let stack = Self {
            region,
            top_md,
            bottom_md,
            layers,
        };
        stack.check_invariants()?;
        Ok(stack.coalesced())
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn top_md(&self) -> f64 {
        self.top_md
    }

    pub fn bottom_md(&self) -> f64 {
        self.bottom_md
    }

    pub fn span(&self) -> f64 {
        self.bottom_md - self.top_md
    }

    pub fn layers(&self) -> &[FluidLayer] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Fluid occupying `md`, if the stack covers it.
    pub fn fluid_at(&self, md: f64) -> Option<&Fluid> {
        self.layers
            .iter()
            .find(|l| md >= l.top_md - MD_EPS && md <= l.bottom_md + MD_EPS)
            .map(|l| &l.fluid)
    }

    /// Total fluid volume held (m³).
    pub fn volume(&self, geometry: &dyn GeometryProvider) -> f64 {
        self.region.capacity(geometry, self.top_md, self.bottom_md)
    }

    /// Layers as volume parcels, top first.
    pub fn parcels(&self, geometry: &dyn GeometryProvider) -> Vec<Parcel> {
        self.layers
            .iter()
            .map(|l| {
                Parcel::new(
                    l.fluid.clone(),
                    self.region.capacity(geometry, l.top_md, l.bottom_md),
                )
            })
            .collect()
    }

    /// Volume of the leading air layers (drained pipe at the top).
    pub fn void_volume(&self, geometry: &dyn GeometryProvider) -> f64 {
        self.layers
            .iter()
            .take_while(|l| l.fluid.is_air())
            .map(|l| self.region.capacity(geometry, l.top_md, l.bottom_md))
            .sum()
    }

    // ---------------------------------------------------------------------
    // Layout
    // ---------------------------------------------------------------------

    /// Lay parcels (top first) downward from `top_md`; returns the stack and
    /// whatever did not fit, in the order it leaves the bottom.
    pub fn layout_down(
        region: Region,
        top_md: f64,
        bottom_md: f64,
        parcels: Vec<Parcel>,
        geometry: &dyn GeometryProvider,
    ) -> LayerResult<(Self, Vec<Parcel>)> {
        let capacity = region.capacity(geometry, top_md, bottom_md);
        let tol = volume_tol(capacity);
        let mut layers: Vec<FluidLayer> = Vec::new();
        let mut overflow = Vec::new();
        let mut cursor = top_md;

        for parcel in parcels {
            if parcel.volume_m3 <= VOLUME_EPS {
                continue;
            }
            if bottom_md - cursor <= MD_EPS {
                overflow.push(parcel);
                continue;
            }
            let room = region.capacity(geometry, cursor, bottom_md);
            if parcel.volume_m3 >= room - tol {
                let excess = parcel.volume_m3 - room;
                layers.push(FluidLayer::new(cursor, bottom_md, parcel.fluid.clone()));
                if excess > VOLUME_EPS {
                    overflow.push(Parcel::new(parcel.fluid, excess));
                }
                cursor = bottom_md;
            } else {
                let end = md_below(region, geometry, cursor, parcel.volume_m3, bottom_md)?;
                if end - cursor > MD_EPS {
                    layers.push(FluidLayer::new(cursor, end, parcel.fluid));
                    cursor = end;
                }
            }
        }

        // Deepest content leaves first.
        overflow.reverse();

        if bottom_md - cursor > MD_EPS {
            let deficit = region.capacity(geometry, cursor, bottom_md);
            match layers.last_mut() {
                Some(last) if deficit <= tol => last.bottom_md = bottom_md,
                _ => {
                    return Err(LayerError::Underfilled {
                        region,
                        deficit_m3: deficit,
                    });
                }
            }
        }

        let stack = if layers.is_empty() {
            Self::empty(region, bottom_md)
        } else {
            Self {
                region,
                top_md,
                bottom_md,
                layers,
            }
            .coalesced()
        };
        Ok((stack, overflow))
    }

    /// Lay parcels (given top first) upward from `bottom_md`; returns the
    /// stack and the overflow out of the top, in exit order.
    pub fn layout_up(
        region: Region,
        top_md: f64,
        bottom_md: f64,
        parcels: Vec<Parcel>,
        geometry: &dyn GeometryProvider,
    ) -> LayerResult<(Self, Vec<Parcel>)> {
        layout_up_inner(region, top_md, bottom_md, parcels, geometry, false)
    }

    // ---------------------------------------------------------------------
    // Mutations (each returns a new stack)
    // ---------------------------------------------------------------------

    /// Add `volume_m3` of `fluid` at the top, pushing the column down.
    ///
    /// Returns the new stack and the parcels expelled out of the bottom; their
    /// total equals the inserted volume.
    pub fn insert_at_top(
        &self,
        fluid: Fluid,
        volume_m3: f64,
        geometry: &dyn GeometryProvider,
    ) -> LayerResult<(Self, Vec<Parcel>)> {
        if volume_m3 <= VOLUME_EPS {
            return Ok((self.clone(), Vec::new()));
        }
        let mut parcels = vec![Parcel::new(fluid, volume_m3)];
        parcels.extend(self.parcels(geometry));
        Self::layout_down(self.region, self.top_md, self.bottom_md, parcels, geometry)
    }

    /// Add parcels at the bottom in arrival order, pushing the column up.
    ///
    /// Returns the new stack and the parcels expelled out of the top.
    pub fn insert_at_bottom(
        &self,
        arrivals: Vec<Parcel>,
        geometry: &dyn GeometryProvider,
    ) -> LayerResult<(Self, Vec<Parcel>)> {
        if total_volume(&arrivals) <= VOLUME_EPS {
            return Ok((self.clone(), Vec::new()));
        }
        let mut parcels = self.parcels(geometry);
        parcels.extend(arrivals);
        Self::layout_up(self.region, self.top_md, self.bottom_md, parcels, geometry)
    }

    /// Remove `volume_m3` from the bottom; the fluid level drops.
    ///
    /// Returns the new stack (occupying a shorter range) and the removed
    /// parcels in exit order.
    pub fn remove_from_bottom(
        &self,
        volume_m3: f64,
        geometry: &dyn GeometryProvider,
    ) -> LayerResult<(Self, Vec<Parcel>)> {
        if volume_m3 <= VOLUME_EPS {
            return Ok((self.clone(), Vec::new()));
        }
        let available = self.volume(geometry);
        if volume_m3 > available + volume_tol(available) {
            return Err(LayerError::InsufficientVolume {
                region: self.region,
                available_m3: available,
                requested_m3: volume_m3,
            });
        }

        let mut parcels = self.parcels(geometry);
        let mut removed = Vec::new();
        let mut remaining = volume_m3;
        while remaining > VOLUME_EPS {
            let Some(mut last) = parcels.pop() else { break };
            if last.volume_m3 <= remaining {
                remaining -= last.volume_m3;
                removed.push(last);
            } else {
                removed.push(Parcel::new(last.fluid.clone(), remaining));
                last.volume_m3 -= remaining;
                remaining = 0.0;
                parcels.push(last);
            }
        }

        let (stack, _) = layout_up_inner(
            self.region,
            self.top_md,
            self.bottom_md,
            parcels,
            geometry,
            true,
        )?;
        Ok((stack, removed))
    }

    /// Re-anchor the column at a new bottom MD, as when the pipe carries its
    /// contents. The column keeps its volumes; anything above `region_top`
    /// leaves the region (returned in exit order) and any shortfall leaves a
    /// void at the top.
    pub fn move_with_pipe(
        &self,
        new_bottom_md: f64,
        region_top: f64,
        geometry: &dyn GeometryProvider,
    ) -> LayerResult<(Self, Vec<Parcel>)> {
        layout_up_inner(
            self.region,
            region_top,
            new_bottom_md,
            self.parcels(geometry),
            geometry,
            true,
        )
    }

    /// Extend the stack upward to `region_top` with `fluid`.
    ///
    /// Returns the new stack and the volume added.
    pub fn fill_void_above(
        &self,
        fluid: Fluid,
        region_top: f64,
        geometry: &dyn GeometryProvider,
    ) -> (Self, f64) {
        if self.top_md - region_top <= MD_EPS {
            return (self.clone(), 0.0);
        }
        let added = self.region.capacity(geometry, region_top, self.top_md);
        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        layers.push(FluidLayer::new(region_top, self.top_md, fluid));
        layers.extend(self.layers.iter().cloned());
        let bottom_md = if self.layers.is_empty() {
            self.top_md
        } else {
            self.bottom_md
        };
        let stack = Self {
            region: self.region,
            top_md: region_top,
            bottom_md,
            layers,
        }
        .coalesced();
        (stack, added)
    }

    /// Pour liquid in at the top of a column whose upper part may be drained.
    ///
    /// Liquid first takes the place of air (no displacement out the bottom);
    /// the remainder pushes the column like [`LayerStack::insert_at_top`].
    pub fn pour_in(
        &self,
        fluid: Fluid,
        volume_m3: f64,
        geometry: &dyn GeometryProvider,
    ) -> LayerResult<(Self, Vec<Parcel>)> {
        let void = self.void_volume(geometry);
        let into_void = volume_m3.min(void);
        if into_void <= VOLUME_EPS {
            return self.insert_at_top(fluid, volume_m3, geometry);
        }

        let mut parcels = Vec::new();
        if void - into_void > VOLUME_EPS {
            parcels.push(Parcel::new(Fluid::air(), void - into_void));
        }
        parcels.push(Parcel::new(fluid.clone(), into_void));
        parcels.extend(
            self.parcels(geometry)
                .into_iter()
                .skip_while(|p| p.fluid.is_air()),
        );
        let (settled, _) =
            Self::layout_down(self.region, self.top_md, self.bottom_md, parcels, geometry)?;

        settled.insert_at_top(fluid, volume_m3 - into_void, geometry)
    }

    /// Split at `md`: returns the part above and the part below.
    pub fn split_at(&self, md: f64) -> (Self, Self) {
        let md = md.clamp(self.top_md, self.bottom_md);
        let mut upper = Vec::new();
        let mut lower = Vec::new();
        for l in &self.layers {
            if l.bottom_md <= md + MD_EPS {
                upper.push(l.clone());
            } else if l.top_md >= md - MD_EPS {
                lower.push(l.clone());
            } else {
                upper.push(FluidLayer::new(l.top_md, md, l.fluid.clone()));
                lower.push(FluidLayer::new(md, l.bottom_md, l.fluid.clone()));
            }
        }
        let make = |layers: Vec<FluidLayer>, top: f64, bottom: f64| {
            if layers.is_empty() || bottom - top <= MD_EPS {
                Self::empty(self.region, if layers.is_empty() { md } else { bottom })
            } else {
                let mut s = Self {
                    region: self.region,
                    top_md: top,
                    bottom_md: bottom,
                    layers,
                };
                s.clamp_ends();
                s
            }
        };
        (
            make(upper, self.top_md, md),
            make(lower, md, self.bottom_md),
        )
    }

    // ---------------------------------------------------------------------
    // Hydrostatics
    // ---------------------------------------------------------------------

    /// Hydrostatic pressure of the layers between `from_md` and `to_md` (Pa).
    ///
    /// Each layer contributes `ρ · g · ΔTVD` over its overlap with the query
    /// range; partially covered layers contribute only the overlapping part.
    pub fn hydrostatic_pressure(
        &self,
        from_md: f64,
        to_md: f64,
        geometry: &dyn GeometryProvider,
    ) -> f64 {
        let (lo, hi) = (from_md.min(to_md), from_md.max(to_md));
        self.layers
            .iter()
            .filter_map(|l| {
                let a = l.top_md.max(lo);
                let b = l.bottom_md.min(hi);
                (b > a).then(|| {
                    hydrostatic_pa(l.fluid.density_kg_m3, geometry.tvd(b) - geometry.tvd(a))
                })
            })
            .sum()
    }

    /// Uniform density giving the same pressure at `at_md` as this column
    /// measured from surface (kg/m³).
    pub fn equivalent_static_density(&self, at_md: f64, geometry: &dyn GeometryProvider) -> f64 {
        let tvd = geometry.tvd(at_md);
        if tvd <= 0.0 {
            return self.fluid_at(0.0).map(|f| f.density_kg_m3).unwrap_or(0.0);
        }
        equivalent_density_kg_m3(self.hydrostatic_pressure(0.0, at_md, geometry), tvd)
    }

    // ---------------------------------------------------------------------
    // Invariants
    // ---------------------------------------------------------------------

    /// Sorted, non-overlapping, contiguous, and spanning exactly the stack range.
    pub fn check_invariants(&self) -> LayerResult<()> {
        let fail = |what: String| {
            Err(LayerError::Invariant {
                region: self.region,
                what,
            })
        };
        if self.layers.is_empty() {
            if self.span() > MD_EPS {
                return fail(format!(
                    "no layers but span {}..{}",
                    self.top_md, self.bottom_md
                ));
            }
            return Ok(());
        }
        let tol = 1e-6;
        if (self.layers[0].top_md - self.top_md).abs() > tol {
            return fail(format!(
                "first layer starts at {} not {}",
                self.layers[0].top_md, self.top_md
            ));
        }
        for l in &self.layers {
            if !(l.bottom_md > l.top_md) {
                return fail(format!("layer {}..{} has no thickness", l.top_md, l.bottom_md));
            }
        }
        for pair in self.layers.windows(2) {
            if (pair[1].top_md - pair[0].bottom_md).abs() > tol {
                return fail(format!(
                    "gap or overlap between {} and {}",
                    pair[0].bottom_md, pair[1].top_md
                ));
            }
        }
        if let Some(last) = self.layers.last()
            && (last.bottom_md - self.bottom_md).abs() > tol
        {
            return fail(format!(
                "last layer ends at {} not {}",
                last.bottom_md, self.bottom_md
            ));
        }
        Ok(())
    }

    fn clamp_ends(&mut self) {
        if let Some(first) = self.layers.first_mut() {
            first.top_md = self.top_md;
        }
        if let Some(last) = self.layers.last_mut() {
            last.bottom_md = self.bottom_md;
        }
    }

    /// Merge neighbouring layers holding the same fluid.
    fn coalesced(mut self) -> Self {
        let mut merged: Vec<FluidLayer> = Vec::with_capacity(self.layers.len());
        for l in self.layers.drain(..) {
            match merged.last_mut() {
                Some(prev) if prev.fluid == l.fluid => prev.bottom_md = l.bottom_md,
                _ => merged.push(l),
            }
        }
        self.layers = merged;
        self.clamp_ends();
        self
    }
}

/// Mix two stacks over their common MD range into parcels, top first.
///
/// Used when content of two regions (annulus and string bore) drops below a
/// rising bit into the pocket together.
pub fn blend_by_depth(
    a: &LayerStack,
    b: &LayerStack,
    geometry: &dyn GeometryProvider,
) -> Vec<Parcel> {
    if b.is_empty() {
        return a.parcels(geometry);
    }
    if a.is_empty() {
        return b.parcels(geometry);
    }

    let mut cuts: Vec<f64> = a
        .layers
        .iter()
        .chain(b.layers.iter())
        .flat_map(|l| [l.top_md, l.bottom_md])
        .collect();
    cuts.sort_by(f64::total_cmp);
    cuts.dedup_by(|x, y| (*x - *y).abs() <= MD_EPS);

    let mut parcels = Vec::new();
    for pair in cuts.windows(2) {
        let (x0, x1) = (pair[0], pair[1]);
        let mid = 0.5 * (x0 + x1);
        let va = if mid > a.top_md && mid < a.bottom_md {
            a.region.capacity(geometry, x0, x1)
        } else {
            0.0
        };
        let vb = if mid > b.top_md && mid < b.bottom_md {
            b.region.capacity(geometry, x0, x1)
        } else {
            0.0
        };
        let fluid = match (a.fluid_at(mid), b.fluid_at(mid)) {
            (Some(fa), Some(fb)) if va > 0.0 && vb > 0.0 => fa.blend(va, fb, vb),
            (Some(fa), _) if va > 0.0 => fa.clone(),
            (_, Some(fb)) if vb > 0.0 => fb.clone(),
            _ => continue,
        };
        parcels.push(Parcel::new(fluid, va + vb));
    }
    merge_parcels(parcels)
}

fn md_below(
    region: Region,
    geometry: &dyn GeometryProvider,
    from: f64,
    volume: f64,
    limit: f64,
) -> LayerResult<f64> {
    Ok(bisect(
        |x| region.capacity(geometry, from, x) - volume,
        from,
        limit,
        BOUNDARY_TOL_M,
        BOUNDARY_MAX_ITER,
        "layer boundary below",
    )?)
}

fn md_above(
    region: Region,
    geometry: &dyn GeometryProvider,
    to: f64,
    volume: f64,
    limit: f64,
) -> LayerResult<f64> {
    Ok(bisect(
        |x| region.capacity(geometry, x, to) - volume,
        limit,
        to,
        BOUNDARY_TOL_M,
        BOUNDARY_MAX_ITER,
        "layer boundary above",
    )?)
}

/// Bottom-anchored layout. With `open_top` a shortfall leaves the stack
/// occupying a shorter range instead of failing.
fn layout_up_inner(
    region: Region,
    top_md: f64,
    bottom_md: f64,
    parcels: Vec<Parcel>,
    geometry: &dyn GeometryProvider,
    open_top: bool,
) -> LayerResult<(LayerStack, Vec<Parcel>)> {
    let capacity = region.capacity(geometry, top_md, bottom_md);
    let tol = volume_tol(capacity);
    let mut layers: Vec<FluidLayer> = Vec::new();
    let mut overflow = Vec::new();
    let mut cursor = bottom_md;

    for parcel in parcels.into_iter().rev() {
        if parcel.volume_m3 <= VOLUME_EPS {
            continue;
        }
        if cursor - top_md <= MD_EPS {
            overflow.push(parcel);
            continue;
        }
        let room = region.capacity(geometry, top_md, cursor);
        if parcel.volume_m3 >= room - tol {
            let excess = parcel.volume_m3 - room;
            layers.push(FluidLayer::new(top_md, cursor, parcel.fluid.clone()));
            if excess > VOLUME_EPS {
                overflow.push(Parcel::new(parcel.fluid, excess));
            }
            cursor = top_md;
        } else {
            let start = md_above(region, geometry, cursor, parcel.volume_m3, top_md)?;
            if cursor - start > MD_EPS {
                layers.push(FluidLayer::new(start, cursor, parcel.fluid));
                cursor = start;
            }
        }
    }
    overflow.reverse();
    layers.reverse();

    let mut occupied_top = top_md;
    if cursor - top_md > MD_EPS {
        let deficit = region.capacity(geometry, top_md, cursor);
        if open_top {
            occupied_top = cursor;
        } else {
            match layers.first_mut() {
                Some(first) if deficit <= tol => first.top_md = top_md,
                _ => {
                    return Err(LayerError::Underfilled {
                        region,
                        deficit_m3: deficit,
                    });
                }
            }
        }
    }

    let stack = if layers.is_empty() {
        LayerStack::empty(region, bottom_md)
    } else {
        LayerStack {
            region,
            top_md: occupied_top,
            bottom_md,
            layers,
        }
        .coalesced()
    };
    Ok((stack, overflow))
}
