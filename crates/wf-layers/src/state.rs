//! Wellbore snapshot: three layer stacks plus the quantities recorded per step.

use std::fmt;

use serde::{Deserialize, Serialize};
use wf_core::{MD_EPS, equivalent_density_kg_m3};
use wf_geometry::GeometryProvider;

use crate::error::{LayerError, LayerResult};
use crate::fluid::Fluid;
use crate::region::Region;
use crate::stack::LayerStack;

/// Float valve state at the bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FloatState {
    /// No float sub; string and annulus communicate freely.
    #[default]
    NotInstalled,
    Closed,
    Open,
}

impl FloatState {
    pub fn is_installed(self) -> bool {
        self != FloatState::NotInstalled
    }
}

impl fmt::Display for FloatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatState::NotInstalled => write!(f, "not installed"),
            FloatState::Closed => write!(f, "closed"),
            FloatState::Open => write!(f, "open"),
        }
    }
}

/// Full state of the wellbore after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellboreState {
    pub bit_md: f64,
    pub bit_tvd: f64,
    pub td_md: f64,
    /// Depth at which bottom-hole pressure is controlled.
    pub control_md: f64,
    pub control_tvd: f64,
    /// Static equivalent density of the annulus column at the control depth.
    pub esd_at_control_kg_m3: f64,
    /// Static surface back pressure.
    pub sabp_pa: f64,
    /// Back pressure once swab/surge and friction are applied.
    pub dynamic_sabp_pa: f64,
    pub float_state: FloatState,
    pub string: LayerStack,
    pub annulus: LayerStack,
    pub pocket: LayerStack,
}

impl WellboreState {
    /// Well full of one fluid with the bit at `bit_md`.
    pub fn uniform(geometry: &dyn GeometryProvider, bit_md: f64, fluid: Fluid) -> Self {
        let td = geometry.total_depth();
        Self::from_stacks(
            geometry,
            bit_md,
            LayerStack::filled(Region::String, 0.0, bit_md, fluid.clone()),
            LayerStack::filled(Region::Annulus, 0.0, bit_md, fluid.clone()),
            LayerStack::filled(Region::Pocket, bit_md, td, fluid),
        )
    }

    /// Assemble a state; control depth defaults to the bit.
    pub fn from_stacks(
        geometry: &dyn GeometryProvider,
        bit_md: f64,
        string: LayerStack,
        annulus: LayerStack,
        pocket: LayerStack,
    ) -> Self {
        let mut state = Self {
            bit_md,
            bit_tvd: geometry.tvd(bit_md),
            td_md: geometry.total_depth(),
            control_md: bit_md,
            control_tvd: geometry.tvd(bit_md),
            esd_at_control_kg_m3: 0.0,
            sabp_pa: 0.0,
            dynamic_sabp_pa: 0.0,
            float_state: FloatState::NotInstalled,
            string,
            annulus,
            pocket,
        };
        state.esd_at_control_kg_m3 = state.static_esd_at(bit_md, geometry);
        state
    }

    /// Hydrostatic pressure of the open-to-surface column at `md` (Pa),
    /// following the annulus down to the bit and the pocket below it.
    pub fn annulus_pressure_at(&self, md: f64, geometry: &dyn GeometryProvider) -> f64 {
        let upper = self
            .annulus
            .hydrostatic_pressure(0.0, md.min(self.bit_md), geometry);
        if md > self.bit_md + MD_EPS {
            upper + self.pocket.hydrostatic_pressure(self.bit_md, md, geometry)
        } else {
            upper
        }
    }

    /// Hydrostatic pressure of the string column at the bit (Pa).
    pub fn string_pressure_at_bit(&self, geometry: &dyn GeometryProvider) -> f64 {
        self.string.hydrostatic_pressure(0.0, self.bit_md, geometry)
    }

    /// Static equivalent density of the annulus/pocket column at `md`.
    pub fn static_esd_at(&self, md: f64, geometry: &dyn GeometryProvider) -> f64 {
        let tvd = geometry.tvd(md);
        if tvd <= 0.0 {
            return 0.0;
        }
        equivalent_density_kg_m3(self.annulus_pressure_at(md, geometry), tvd)
    }

    /// Fluid volume held in all three regions (m³).
    pub fn total_fluid_volume(&self, geometry: &dyn GeometryProvider) -> f64 {
        self.string.volume(geometry) + self.annulus.volume(geometry) + self.pocket.volume(geometry)
    }

    /// Each stack well formed, and together they tile the wellbore.
    pub fn check_invariants(&self) -> LayerResult<()> {
        self.string.check_invariants()?;
        self.annulus.check_invariants()?;
        self.pocket.check_invariants()?;

        let tol = 1e-6;
        let region_fail = |region: Region, what: String| Err(LayerError::Invariant { region, what });
        if !self.annulus.is_empty()
            && ((self.annulus.top_md()).abs() > tol
                || (self.annulus.bottom_md() - self.bit_md).abs() > tol)
        {
            return region_fail(
                Region::Annulus,
                format!(
                    "spans {}..{} with bit at {}",
                    self.annulus.top_md(),
                    self.annulus.bottom_md(),
                    self.bit_md
                ),
            );
        }
        if !self.string.is_empty() && (self.string.bottom_md() - self.bit_md).abs() > tol {
            return region_fail(
                Region::String,
                format!("ends at {} with bit at {}", self.string.bottom_md(), self.bit_md),
            );
        }
        if !self.pocket.is_empty()
            && ((self.pocket.top_md() - self.bit_md).abs() > tol
                || (self.pocket.bottom_md() - self.td_md).abs() > tol)
        {
            return region_fail(
                Region::Pocket,
                format!(
                    "spans {}..{} with bit at {} and TD {}",
                    self.pocket.top_md(),
                    self.pocket.bottom_md(),
                    self.bit_md,
                    self.td_md
                ),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::hydrostatic_pa;
    use wf_geometry::WellGeometry;

    fn well() -> WellGeometry {
        WellGeometry::uniform_vertical(2500.0, 0.2159, 0.127, 0.1086).unwrap()
    }

    #[test]
    fn uniform_state_is_consistent() {
        let g = well();
        let s = WellboreState::uniform(&g, 2000.0, Fluid::new(1200.0));
        s.check_invariants().unwrap();
        assert!((s.esd_at_control_kg_m3 - 1200.0).abs() < 1e-9);
        assert!((s.annulus_pressure_at(2500.0, &g) - hydrostatic_pa(1200.0, 2500.0)).abs() < 1e-6);
        assert!((s.string_pressure_at_bit(&g) - hydrostatic_pa(1200.0, 2000.0)).abs() < 1e-6);
    }

    #[test]
    fn state_serializes() {
        let g = well();
        let s = WellboreState::uniform(&g, 1500.0, Fluid::new(1100.0).with_label("base"));
        let json = serde_json::to_string(&s).unwrap();
        let back: WellboreState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn float_state_text() {
        assert_eq!(FloatState::Closed.to_string(), "closed");
        assert_eq!(FloatState::NotInstalled.to_string(), "not installed");
        assert!(!FloatState::NotInstalled.is_installed());
    }
}
