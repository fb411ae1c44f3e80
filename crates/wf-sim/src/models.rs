//! Pluggable pressure models for pipe movement and circulation.
//!
//! The correlations behind swab/surge and annular pressure loss depend on
//! rheology and clearance data the engine does not own, so both are traits.
//! The bundled implementations take user-supplied coefficients; their
//! defaults are zero, which disables the term.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Inputs available to a swab/surge correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwabSurgeContext {
    pub trip_speed_mps: f64,
    pub eccentricity_factor: f64,
    pub bit_md: f64,
    pub bit_tvd: f64,
    /// Annular capacity per metre just above the bit (m³/m).
    pub annular_capacity_m3_per_m: f64,
    /// Whether fluid is pumped while the pipe moves.
    pub pumping: bool,
}

/// Transient pressure from pipe movement (always reported positive).
pub trait SwabSurgeModel: Send + Sync {
    fn pressure_pa(&self, ctx: &SwabSurgeContext) -> f64;
}

/// `coefficient × trip speed × eccentricity factor`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProportionalSwabSurge {
    /// Pa per (m/s) of trip speed.
    pub coefficient_pa_s_per_m: f64,
}

impl SwabSurgeModel for ProportionalSwabSurge {
    fn pressure_pa(&self, ctx: &SwabSurgeContext) -> f64 {
        if ctx.trip_speed_mps <= 0.0 {
            return 0.0;
        }
        (self.coefficient_pa_s_per_m * ctx.trip_speed_mps * ctx.eccentricity_factor).max(0.0)
    }
}

/// Inputs available to an annular pressure loss correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AplContext {
    pub bit_md: f64,
    pub bit_tvd: f64,
}

/// Frictional pressure loss in the annulus as a function of pump rate.
///
/// Implementations must be non-decreasing in rate; the rate search relies on it.
pub trait AnnularPressureLossModel: Send + Sync {
    fn loss_pa(&self, rate_m3ps: f64, ctx: &AplContext) -> f64;
}

/// `coefficient × rate`, optionally scaled by bit depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearApl {
    pub coefficient_pa_s_per_m3: f64,
    #[serde(default)]
    pub per_metre_of_hole: bool,
}

impl AnnularPressureLossModel for LinearApl {
    fn loss_pa(&self, rate_m3ps: f64, ctx: &AplContext) -> f64 {
        let scale = if self.per_metre_of_hole { ctx.bit_md } else { 1.0 };
        (self.coefficient_pa_s_per_m3 * rate_m3ps.max(0.0) * scale).max(0.0)
    }
}

/// Piecewise-linear loss table, held flat outside the measured range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabulatedApl {
    /// `(rate m³/s, loss Pa)` pairs sorted by rate.
    pub points: Vec<(f64, f64)>,
}

impl AnnularPressureLossModel for TabulatedApl {
    fn loss_pa(&self, rate_m3ps: f64, _ctx: &AplContext) -> f64 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        if rate_m3ps <= first.0 {
            return first.1;
        }
        for pair in self.points.windows(2) {
            let ((r0, p0), (r1, p1)) = (pair[0], pair[1]);
            if rate_m3ps <= r1 {
                if r1 <= r0 {
                    return p1;
                }
                return p0 + (p1 - p0) * (rate_m3ps - r0) / (r1 - r0);
            }
        }
        self.points.last().map(|p| p.1).unwrap_or(0.0)
    }
}

/// Models in effect for a run.
#[derive(Clone)]
pub struct ModelSet {
    pub swab_surge: Arc<dyn SwabSurgeModel>,
    pub apl: Arc<dyn AnnularPressureLossModel>,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            swab_surge: Arc::new(ProportionalSwabSurge::default()),
            apl: Arc::new(LinearApl::default()),
        }
    }
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSet").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swab_ctx(speed: f64) -> SwabSurgeContext {
        SwabSurgeContext {
            trip_speed_mps: speed,
            eccentricity_factor: 1.5,
            bit_md: 1000.0,
            bit_tvd: 1000.0,
            annular_capacity_m3_per_m: 0.02,
            pumping: false,
        }
    }

    #[test]
    fn zero_speed_disables_swab() {
        let m = ProportionalSwabSurge {
            coefficient_pa_s_per_m: 1.0e5,
        };
        assert_eq!(m.pressure_pa(&swab_ctx(0.0)), 0.0);
        assert!((m.pressure_pa(&swab_ctx(0.5)) - 75_000.0).abs() < 1e-9);
    }

    #[test]
    fn default_models_are_inert() {
        let models = ModelSet::default();
        assert_eq!(models.swab_surge.pressure_pa(&swab_ctx(1.0)), 0.0);
        let ctx = AplContext {
            bit_md: 1000.0,
            bit_tvd: 1000.0,
        };
        assert_eq!(models.apl.loss_pa(0.05, &ctx), 0.0);
    }

    #[test]
    fn table_interpolates_and_holds_ends() {
        let t = TabulatedApl {
            points: vec![(0.01, 100.0), (0.03, 500.0)],
        };
        let ctx = AplContext {
            bit_md: 0.0,
            bit_tvd: 0.0,
        };
        assert_eq!(t.loss_pa(0.0, &ctx), 100.0);
        assert!((t.loss_pa(0.02, &ctx) - 300.0).abs() < 1e-9);
        assert_eq!(t.loss_pa(1.0, &ctx), 500.0);
    }
}
