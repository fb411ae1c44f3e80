//! Resolved operation configuration consumed by the step engine.
//!
//! Mud references are already resolved to [`Fluid`] values here; catalog
//! lookups happen when a project is compiled, so catalog edits show up on the
//! next run.

use std::fmt;

use serde::{Deserialize, Serialize};
use wf_core::MD_EPS;
use wf_geometry::GeometryProvider;
use wf_layers::Fluid;

use crate::error::{SimError, SimResult};

/// Upper bound on records per operation.
pub const MAX_INCREMENTS: f64 = 1.0e7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    TripOut,
    TripIn,
    Circulate,
    ReamOut,
    ReamIn,
}

impl OperationKind {
    /// Bit moves towards surface.
    pub fn is_outward(self) -> bool {
        matches!(self, OperationKind::TripOut | OperationKind::ReamOut)
    }

    pub fn moves_pipe(self) -> bool {
        self != OperationKind::Circulate
    }

    pub fn is_ream(self) -> bool {
        matches!(self, OperationKind::ReamOut | OperationKind::ReamIn)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperationKind::TripOut => "trip out",
            OperationKind::TripIn => "trip in",
            OperationKind::Circulate => "circulate",
            OperationKind::ReamOut => "ream out",
            OperationKind::ReamIn => "ream in",
        };
        f.write_str(text)
    }
}

/// Muds an operation draws from. Unset roles fall back to `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MudSelection {
    pub base: Fluid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backfill: Option<Fluid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fluid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ream: Option<Fluid>,
}

impl MudSelection {
    pub fn uniform(fluid: Fluid) -> Self {
        Self {
            base: fluid,
            backfill: None,
            fill: None,
            ream: None,
        }
    }

    pub fn backfill(&self) -> &Fluid {
        self.backfill.as_ref().unwrap_or(&self.base)
    }

    pub fn fill(&self) -> &Fluid {
        self.fill.as_ref().unwrap_or(&self.base)
    }

    pub fn ream(&self) -> &Fluid {
        self.ream.as_ref().unwrap_or(&self.base)
    }
}

/// Which mud backfills the annulus during a trip out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackfillPolicy {
    /// Fill with base mud until `displacement_threshold_m3` has gone in, then
    /// switch to the backfill mud.
    #[serde(default)]
    pub switch_to_active_after_displacement: bool,
    #[serde(default)]
    pub displacement_threshold_m3: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatConfig {
    #[serde(default)]
    pub installed: bool,
    /// Differential (string over annulus) needed to open a closed float.
    #[serde(default)]
    pub crack_pressure_pa: f64,
    /// Run pipe in empty instead of filling it from surface.
    #[serde(default)]
    pub floated: bool,
}

/// Pump limits for circulation and reaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpRateConfig {
    pub min_rate_m3ps: f64,
    pub max_rate_m3ps: f64,
    /// Largest volume pumped between two records.
    pub step_volume_m3: f64,
    /// Rate held while reaming.
    #[serde(default)]
    pub ream_rate_m3ps: f64,
}

impl Default for PumpRateConfig {
    fn default() -> Self {
        Self {
            min_rate_m3ps: 0.01,
            max_rate_m3ps: 0.04,
            step_volume_m3: 1.0,
            ream_rate_m3ps: 0.0,
        }
    }
}

impl PumpRateConfig {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.min_rate_m3ps > 0.0) {
            return Err(SimError::InvalidArg {
                what: "minimum pump rate must be positive",
            });
        }
        if !(self.max_rate_m3ps >= self.min_rate_m3ps) {
            return Err(SimError::InvalidArg {
                what: "maximum pump rate must not be below the minimum",
            });
        }
        if !(self.step_volume_m3 > 0.0) {
            return Err(SimError::InvalidArg {
                what: "pump step volume must be positive",
            });
        }
        if !(self.ream_rate_m3ps >= 0.0 && self.ream_rate_m3ps.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "ream pump rate must be a non-negative number",
            });
        }
        Ok(())
    }
}

/// One fluid to pump, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpEntry {
    pub fluid: Fluid,
    pub volume_m3: f64,
}

/// Ordered pump schedule, consumed front to back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PumpQueue {
    pub entries: Vec<PumpEntry>,
}

impl PumpQueue {
    pub fn new(entries: Vec<PumpEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, fluid: Fluid, volume_m3: f64) {
        self.entries.push(PumpEntry { fluid, volume_m3 });
    }

    pub fn total_volume(&self) -> f64 {
        self.entries.iter().map(|e| e.volume_m3.max(0.0)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_volume() <= 0.0
    }

    /// Every volume must be finite and non-negative, and the queue must fit
    /// in a bounded number of `step_volume_m3` increments.
    pub fn validate(&self, step_volume_m3: f64) -> SimResult<()> {
        if self
            .entries
            .iter()
            .any(|e| !(e.volume_m3.is_finite() && e.volume_m3 >= 0.0))
        {
            return Err(SimError::InvalidArg {
                what: "pump queue volumes must be finite and non-negative",
            });
        }
        let increments: f64 = self
            .entries
            .iter()
            .map(|e| (e.volume_m3 / step_volume_m3).ceil())
            .sum();
        if !(increments <= MAX_INCREMENTS) {
            return Err(SimError::InvalidArg {
                what: "pump step volume too small for the queue",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(default)]
    pub use_observed_pit_gain: bool,
    #[serde(default)]
    pub observed_initial_pit_gain_m3: f64,
}

/// A fully resolved operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationPlan {
    pub label: String,
    pub kind: OperationKind,
    /// Expected bit depth at the start; `None` takes the incoming state.
    #[serde(default)]
    pub start_md: Option<f64>,
    pub end_md: f64,
    pub step_size_m: f64,
    pub target_esd_kg_m3: f64,
    /// Depth where the target ESD is held; `None` follows the bit.
    #[serde(default)]
    pub control_md: Option<f64>,
    #[serde(default)]
    pub trip_speed_mps: f64,
    #[serde(default = "default_eccentricity")]
    pub eccentricity_factor: f64,
    pub muds: MudSelection,
    #[serde(default)]
    pub backfill: BackfillPolicy,
    #[serde(default)]
    pub float: FloatConfig,
    #[serde(default)]
    pub pump: PumpRateConfig,
    #[serde(default)]
    pub queue: PumpQueue,
    #[serde(default)]
    pub required_volume_m3: Option<f64>,
    #[serde(default)]
    pub calibration: Calibration,
}

fn default_eccentricity() -> f64 {
    1.0
}

impl OperationPlan {
    /// Minimal plan of the given kind with one mud everywhere.
    pub fn new(kind: OperationKind, end_md: f64, step_size_m: f64, mud: Fluid) -> Self {
        Self {
            label: kind.to_string(),
            kind,
            start_md: None,
            end_md,
            step_size_m,
            target_esd_kg_m3: mud.density_kg_m3,
            control_md: None,
            trip_speed_mps: 0.0,
            eccentricity_factor: default_eccentricity(),
            muds: MudSelection::uniform(mud),
            backfill: BackfillPolicy::default(),
            float: FloatConfig::default(),
            pump: PumpRateConfig::default(),
            queue: PumpQueue::default(),
            required_volume_m3: None,
            calibration: Calibration::default(),
        }
    }

    /// Check the MD range against the incoming bit and the geometry.
    pub fn validate_range(&self, bit_md: f64, geometry: &dyn GeometryProvider) -> SimResult<f64> {
        let start = self.start_md.unwrap_or(bit_md);
        if (start - bit_md).abs() > 1e-6 {
            return Err(SimError::InvalidRange {
                reason: format!("start MD {start} does not match incoming bit MD {bit_md}"),
            });
        }
        if geometry.total_depth() <= 0.0 || geometry.string_reach() <= 0.0 {
            return Err(SimError::MissingGeometry {
                what: "no hole or string sections cover the well".to_string(),
            });
        }
        if let Some(control) = self.control_md
            && !(control > 0.0 && control <= geometry.total_depth() + MD_EPS)
        {
            return Err(SimError::InvalidRange {
                reason: format!("control MD {control} outside the hole"),
            });
        }
        if !self.target_esd_kg_m3.is_finite() || self.target_esd_kg_m3 < 0.0 {
            return Err(SimError::InvalidArg {
                what: "target ESD must be a non-negative number",
            });
        }
        if !self.kind.moves_pipe() {
            return Ok(start);
        }

        if !(self.step_size_m > 0.0 && self.step_size_m.is_finite()) {
            return Err(SimError::InvalidRange {
                reason: format!("step size {} must be positive", self.step_size_m),
            });
        }
        if !(self.end_md > 0.0) {
            return Err(SimError::InvalidRange {
                reason: format!("end MD {} must be below surface", self.end_md),
            });
        }
        if self.kind.is_outward() {
            if self.end_md >= start {
                return Err(SimError::InvalidRange {
                    reason: format!(
                        "{} must end above its start ({} >= {})",
                        self.kind, self.end_md, start
                    ),
                });
            }
        } else {
            if self.end_md <= start {
                return Err(SimError::InvalidRange {
                    reason: format!(
                        "{} must end below its start ({} <= {})",
                        self.kind, self.end_md, start
                    ),
                });
            }
            if !geometry.covers(self.end_md) {
                return Err(SimError::MissingGeometry {
                    what: format!(
                        "geometry ends at {} m (string reach {} m), operation needs {} m",
                        geometry.total_depth(),
                        geometry.string_reach(),
                        self.end_md
                    ),
                });
            }
        }
        let deepest = start.max(self.end_md);
        let steps = (self.end_md - start).abs() / self.step_size_m;
        if deepest + self.step_size_m == deepest || !(steps <= MAX_INCREMENTS) {
            return Err(SimError::InvalidRange {
                reason: format!(
                    "step size {} m cannot cover {} m to {} m",
                    self.step_size_m, start, self.end_md
                ),
            });
        }
        if self.kind.is_ream() && !(self.trip_speed_mps > 0.0) {
            return Err(SimError::InvalidArg {
                what: "reaming needs a positive trip speed",
            });
        }
        Ok(start)
    }

    /// Bit positions after each increment, the last clamped to `end_md`.
    pub fn positions(&self, start: f64) -> Vec<f64> {
        let mut out = Vec::new();
        let dir = if self.end_md < start { -1.0 } else { 1.0 };
        let mut md = start;
        loop {
            let next = md + dir * self.step_size_m;
            if next == md {
                out.push(self.end_md);
                break;
            }
            let past_end = if dir < 0.0 {
                next <= self.end_md + MD_EPS
            } else {
                next >= self.end_md - MD_EPS
            };
            if past_end {
                out.push(self.end_md);
                break;
            }
            out.push(next);
            md = next;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_geometry::WellGeometry;

    fn well() -> WellGeometry {
        WellGeometry::uniform_vertical(2000.0, 0.2159, 0.127, 0.1086).unwrap()
    }

    #[test]
    fn positions_clamp_last_step() {
        let plan = OperationPlan::new(OperationKind::TripOut, 1500.0, 50.0, Fluid::new(1200.0));
        let pos = plan.positions(2000.0);
        assert_eq!(pos.len(), 10);
        assert_eq!(*pos.last().unwrap(), 1500.0);

        let plan = OperationPlan::new(OperationKind::TripIn, 1730.0, 100.0, Fluid::new(1200.0));
        let pos = plan.positions(1500.0);
        assert_eq!(pos, vec![1600.0, 1700.0, 1730.0]);
    }

    #[test]
    fn trip_out_must_go_up() {
        let g = well();
        let plan = OperationPlan::new(OperationKind::TripOut, 1900.0, 50.0, Fluid::new(1200.0));
        let err = plan.validate_range(1500.0, &g).unwrap_err();
        assert!(matches!(err, SimError::InvalidRange { .. }));
    }

    #[test]
    fn end_at_surface_rejected() {
        let g = well();
        let plan = OperationPlan::new(OperationKind::TripOut, 0.0, 50.0, Fluid::new(1200.0));
        assert!(matches!(
            plan.validate_range(1000.0, &g),
            Err(SimError::InvalidRange { .. })
        ));
    }

    #[test]
    fn trip_in_past_td_is_missing_geometry() {
        let g = well();
        let plan = OperationPlan::new(OperationKind::TripIn, 2100.0, 50.0, Fluid::new(1200.0));
        assert!(matches!(
            plan.validate_range(1500.0, &g),
            Err(SimError::MissingGeometry { .. })
        ));
    }

    #[test]
    fn mismatched_start_rejected() {
        let g = well();
        let mut plan = OperationPlan::new(OperationKind::TripIn, 1900.0, 50.0, Fluid::new(1200.0));
        plan.start_md = Some(1000.0);
        assert!(matches!(
            plan.validate_range(1500.0, &g),
            Err(SimError::InvalidRange { .. })
        ));
    }

    #[test]
    fn ream_needs_trip_speed() {
        let g = well();
        let plan = OperationPlan::new(OperationKind::ReamOut, 1500.0, 50.0, Fluid::new(1200.0));
        assert!(matches!(
            plan.validate_range(1800.0, &g),
            Err(SimError::InvalidArg { .. })
        ));
    }

    #[test]
    fn step_below_float_resolution_rejected() {
        let g = well();
        let plan = OperationPlan::new(OperationKind::TripOut, 1500.0, 1e-13, Fluid::new(1200.0));
        assert!(matches!(
            plan.validate_range(2000.0, &g),
            Err(SimError::InvalidRange { .. })
        ));

        let plan = OperationPlan::new(OperationKind::TripIn, 2000.0, 1e-5, Fluid::new(1200.0));
        assert!(matches!(
            plan.validate_range(10.0, &g),
            Err(SimError::InvalidRange { .. })
        ));
    }

    #[test]
    fn positions_stop_when_step_vanishes() {
        let plan = OperationPlan::new(OperationKind::TripOut, 1500.0, 1e-13, Fluid::new(1200.0));
        assert_eq!(plan.positions(2000.0), vec![1500.0]);
    }

    #[test]
    fn queue_rejects_unbounded_volumes() {
        let mut q = PumpQueue::default();
        q.push(Fluid::new(1300.0), f64::INFINITY);
        assert!(q.validate(1.0).is_err());

        let mut q = PumpQueue::default();
        q.push(Fluid::new(1300.0), -1.0);
        assert!(q.validate(1.0).is_err());

        let mut q = PumpQueue::default();
        q.push(Fluid::new(1300.0), 5.0);
        assert!(q.validate(1.0).is_ok());
        assert!(q.validate(1e-12).is_err());
    }

    #[test]
    fn queue_totals_ignore_negative() {
        let mut q = PumpQueue::default();
        q.push(Fluid::new(1300.0), 5.0);
        q.push(Fluid::new(1100.0), -1.0);
        assert_eq!(q.total_volume(), 5.0);
    }
}
