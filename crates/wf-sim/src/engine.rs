//! Operation runner: drives one operation from its incoming state to its
//! output state, emitting a record per increment.

use std::time::Instant;

use tracing::{debug, info, warn};
use wf_core::VOLUME_EPS;
use wf_geometry::GeometryProvider;
use wf_layers::{FloatState, WellboreState};

use crate::backpressure::{BackPressure, apply_back_pressure, solve_back_pressure};
use crate::circulate::{circulate_volume, select_pump_rate};
use crate::error::{SimError, SimResult};
use crate::float::{initial_float_state, update_float};
use crate::models::{AplContext, ModelSet, SwabSurgeContext};
use crate::plan::{OperationKind, OperationPlan};
use crate::progress::{CancelToken, StepProgress};
use crate::record::{CirculationStep, ReamStep, StepRecord, TripInStep, TripOutStep};
use crate::trip::{pull_out, run_in};

/// What an operation runs against.
#[derive(Clone, Copy)]
pub struct SimContext<'a> {
    pub geometry: &'a dyn GeometryProvider,
    pub models: &'a ModelSet,
}

/// Records and output state of a completed operation.
#[derive(Debug, Clone)]
pub struct OperationRun {
    pub records: Vec<StepRecord>,
    pub output: WellboreState,
    pub elapsed_wall_s: f64,
}

/// A failed operation with the records it committed before failing.
#[derive(Debug, Clone)]
pub struct OperationFailure {
    pub error: SimError,
    pub partial: Vec<StepRecord>,
}

/// Running totals over one operation.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    backfill_m3: f64,
    pulled_wet_m3: f64,
    fill_m3: f64,
    displacement_returns_m3: f64,
    pumped_m3: f64,
    circulation_returns_m3: f64,
    pit_gain_m3: f64,
    pump_time_s: f64,
}

struct Runner<'a, 'p> {
    plan: &'a OperationPlan,
    ctx: SimContext<'a>,
    progress: Option<&'p mut dyn FnMut(StepProgress)>,
    cancel: Option<&'a CancelToken>,
    totals: Totals,
    pit_gain_offset_m3: f64,
    total_steps: usize,
}

/// Run one operation starting from `input`.
///
/// Steps are committed one at a time; on failure every committed record is
/// returned with the error. Cancellation is honoured between steps.
pub fn run_operation(
    plan: &OperationPlan,
    input: &WellboreState,
    ctx: SimContext<'_>,
    progress: Option<&mut dyn FnMut(StepProgress)>,
    cancel: Option<&CancelToken>,
) -> Result<OperationRun, OperationFailure> {
    let started = Instant::now();
    let mut runner = Runner {
        plan,
        ctx,
        progress,
        cancel,
        totals: Totals::default(),
        pit_gain_offset_m3: 0.0,
        total_steps: 0,
    };
    let mut records = Vec::new();
    match runner.run(input, &mut records) {
        Ok(output) => {
            info!(
                label = %plan.label,
                steps = records.len(),
                bit_md = output.bit_md,
                "operation complete"
            );
            Ok(OperationRun {
                records,
                output,
                elapsed_wall_s: started.elapsed().as_secs_f64(),
            })
        }
        Err(error) => {
            warn!(label = %plan.label, %error, kept = records.len(), "operation failed");
            Err(OperationFailure {
                error,
                partial: records,
            })
        }
    }
}

impl Runner<'_, '_> {
    fn geometry(&self) -> &dyn GeometryProvider {
        self.ctx.geometry
    }

    fn run(
        &mut self,
        input: &WellboreState,
        records: &mut Vec<StepRecord>,
    ) -> SimResult<WellboreState> {
        let plan = self.plan;
        let start = plan.validate_range(input.bit_md, self.geometry())?;
        if !self.geometry().covers(start) {
            return Err(SimError::MissingGeometry {
                what: format!("no geometry at incoming bit MD {start}"),
            });
        }
        if plan.kind == OperationKind::Circulate || plan.kind.is_ream() {
            plan.pump.validate()?;
        }
        if plan.kind == OperationKind::Circulate {
            plan.queue.validate(plan.pump.step_volume_m3)?;
        }
        info!(
            label = %plan.label,
            kind = %plan.kind,
            start,
            end = plan.end_md,
            "running operation"
        );

        let positions = if plan.kind.moves_pipe() {
            plan.positions(start)
        } else {
            Vec::new()
        };
        self.total_steps = if plan.kind.moves_pipe() {
            positions.len()
        } else {
            plan.queue
                .entries
                .iter()
                .map(|e| (e.volume_m3.max(0.0) / plan.pump.step_volume_m3).ceil() as usize)
                .sum()
        };

        let state = self.initial_record(input, records)?;
        match plan.kind {
            OperationKind::Circulate => self.circulate(state, records),
            _ => self.trip(state, &positions, records),
        }
    }

    fn control_md(&self, state: &WellboreState) -> f64 {
        self.plan.control_md.unwrap_or(state.bit_md)
    }

    fn check_cancel(&self) -> SimResult<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(SimError::Cancelled),
            _ => Ok(()),
        }
    }

    fn pit_gain(&self) -> f64 {
        self.totals.pit_gain_m3 + self.pit_gain_offset_m3
    }

    fn solve(&self, state: &WellboreState) -> SimResult<BackPressure> {
        solve_back_pressure(
            state,
            self.control_md(state),
            self.plan.target_esd_kg_m3,
            self.geometry(),
        )
    }

    fn emit(&mut self, step: usize, bit_md: f64) {
        let total = self.total_steps;
        let label = self.plan.label.clone();
        if let Some(cb) = self.progress.as_deref_mut() {
            cb(StepProgress {
                step,
                total_steps: total,
                bit_md,
                fraction_complete: if total == 0 {
                    1.0
                } else {
                    step as f64 / total as f64
                },
                message: format!("{label}: step {step}/{total} at {bit_md:.1} m"),
            });
        }
    }

    /// Step 0: balance the U-tube at the starting position and calibrate.
    fn initial_record(
        &mut self,
        input: &WellboreState,
        records: &mut Vec<StepRecord>,
    ) -> SimResult<WellboreState> {
        let plan = self.plan;
        let mut state = input.clone();
        state.td_md = self.geometry().total_depth();
        state.bit_tvd = self.geometry().tvd(state.bit_md);
        state.float_state = initial_float_state(state.float_state, &plan.float);
        state.check_invariants()?;

        let (mut state, utube) = update_float(&state, &plan.float, self.geometry())?;
        self.totals.pit_gain_m3 = utube.pit_gain_m3;
        if plan.calibration.use_observed_pit_gain {
            self.pit_gain_offset_m3 = plan.calibration.observed_initial_pit_gain_m3 - utube.pit_gain_m3;
            debug!(
                modeled = utube.pit_gain_m3,
                offset = self.pit_gain_offset_m3,
                "pit gain calibrated"
            );
        }

        let bp = self.solve(&state)?;
        apply_back_pressure(&mut state, &bp, bp.sabp_pa);
        records.push(self.record(0, &state, &bp, 0.0, 0.0, 0.0, None));
        self.emit(0, state.bit_md);
        Ok(state)
    }

    fn trip(
        &mut self,
        mut state: WellboreState,
        positions: &[f64],
        records: &mut Vec<StepRecord>,
    ) -> SimResult<WellboreState> {
        let plan = self.plan;
        let outward = plan.kind.is_outward();
        let ream = plan.kind.is_ream();
        let muds = &plan.muds;

        for (i, &md) in positions.iter().enumerate() {
            self.check_cancel()?;
            let step = i + 1;
            let step_len = (md - state.bit_md).abs();
            let pumping = ream && plan.pump.ream_rate_m3ps > 0.0;
            if pumping && plan.float.installed {
                state.float_state = FloatState::Open;
            }

            let (mut next, step_volume) = if outward {
                let (next, out) = pull_out(
                    &state,
                    md,
                    muds,
                    &plan.backfill,
                    self.totals.backfill_m3,
                    self.geometry(),
                )?;
                self.totals.backfill_m3 += out.backfill_m3;
                self.totals.pulled_wet_m3 += out.pulled_wet_m3;
                self.totals.pit_gain_m3 -= out.backfill_m3;
                (next, out.backfill_m3)
            } else {
                let fill = (!plan.float.floated).then(|| muds.fill());
                let (next, out) = run_in(&state, md, fill, self.geometry())?;
                self.totals.fill_m3 += out.fill_m3;
                self.totals.displacement_returns_m3 += out.returns_m3;
                self.totals.pit_gain_m3 += out.returns_m3 - out.fill_m3;
                (next, out.displacement_m3)
            };

            let mut pump_rate = 0.0;
            if pumping {
                pump_rate = plan.pump.ream_rate_m3ps;
                let volume = pump_rate * step_len / plan.trip_speed_mps;
                let (pumped, out) = circulate_volume(&next, muds.ream(), volume, self.geometry())?;
                next = pumped;
                self.totals.pumped_m3 += volume;
                self.totals.circulation_returns_m3 += out.returns_m3;
                self.totals.pit_gain_m3 += out.returns_m3 - volume;
                self.totals.pump_time_s += step_len / plan.trip_speed_mps;
            } else {
                let (settled, utube) = update_float(&next, &plan.float, self.geometry())?;
                next = settled;
                self.totals.pit_gain_m3 += utube.pit_gain_m3;
            }

            let bp = self.solve(&next)?;
            let swab_surge = if plan.trip_speed_mps > 0.0 {
                self.ctx.models.swab_surge.pressure_pa(&SwabSurgeContext {
                    trip_speed_mps: plan.trip_speed_mps,
                    eccentricity_factor: plan.eccentricity_factor,
                    bit_md: next.bit_md,
                    bit_tvd: next.bit_tvd,
                    annular_capacity_m3_per_m: annular_capacity_per_m(
                        self.geometry(),
                        next.bit_md,
                    ),
                    pumping,
                })
            } else {
                0.0
            };
            let apl = if pumping {
                self.ctx.models.apl.loss_pa(
                    pump_rate,
                    &AplContext {
                        bit_md: next.bit_md,
                        bit_tvd: next.bit_tvd,
                    },
                )
            } else {
                0.0
            };
            let dynamic = if outward {
                bp.sabp_pa + swab_surge - apl
            } else {
                bp.sabp_pa - swab_surge - apl
            }
            .max(0.0);
            apply_back_pressure(&mut next, &bp, dynamic);
            next.check_invariants()?;

            debug!(
                step,
                bit_md = next.bit_md,
                sabp = next.sabp_pa,
                esd = next.esd_at_control_kg_m3,
                float = %next.float_state,
                "trip step"
            );
            let record = if ream {
                self.record(step, &next, &bp, swab_surge, pump_rate, apl, None)
            } else {
                self.record(step, &next, &bp, swab_surge, 0.0, 0.0, Some(step_volume))
            };
            records.push(record);
            self.emit(step, next.bit_md);
            state = next;
        }
        Ok(state)
    }

    fn circulate(
        &mut self,
        mut state: WellboreState,
        records: &mut Vec<StepRecord>,
    ) -> SimResult<WellboreState> {
        let plan = self.plan;
        let mut step = 0;
        for (queue_index, entry) in plan.queue.entries.iter().enumerate() {
            let mut remaining = entry.volume_m3.max(0.0);
            while remaining > VOLUME_EPS {
                self.check_cancel()?;
                step += 1;
                let volume = remaining.min(plan.pump.step_volume_m3);
                remaining -= volume;

                let (mut next, out) =
                    circulate_volume(&state, &entry.fluid, volume, self.geometry())?;
                if plan.float.installed {
                    next.float_state = FloatState::Open;
                }
                self.totals.pumped_m3 += volume;
                self.totals.circulation_returns_m3 += out.returns_m3;
                self.totals.pit_gain_m3 += out.returns_m3 - volume;

                let bp = self.solve(&next)?;
                let apl_ctx = AplContext {
                    bit_md: next.bit_md,
                    bit_tvd: next.bit_tvd,
                };
                let (rate, apl) = select_pump_rate(
                    plan.pump.min_rate_m3ps,
                    plan.pump.max_rate_m3ps,
                    bp.sabp_pa,
                    self.ctx.models.apl.as_ref(),
                    &apl_ctx,
                )?;
                self.totals.pump_time_s += volume / rate;
                apply_back_pressure(&mut next, &bp, (bp.sabp_pa - apl).max(0.0));
                next.check_invariants()?;

                debug!(
                    step,
                    queue_index,
                    pumped = self.totals.pumped_m3,
                    rate,
                    sabp = next.sabp_pa,
                    "circulation step"
                );
                records.push(StepRecord::Circulation(CirculationStep {
                    step,
                    queue_index,
                    pumped_m3: volume,
                    cumulative_pumped_m3: self.totals.pumped_m3,
                    cumulative_returns_m3: self.totals.circulation_returns_m3,
                    pump_rate_m3ps: rate,
                    apl_pa: apl,
                    elapsed_s: self.totals.pump_time_s,
                    effective_esd_kg_m3: bp.effective_esd_kg_m3,
                    cumulative_pit_gain_m3: self.pit_gain(),
                    state: next.clone(),
                }));
                self.emit(step, next.bit_md);
                state = next;
            }
        }

        if let Some(required) = plan.required_volume_m3
            && self.totals.pumped_m3 + 1e-9 < required
        {
            return Err(SimError::QueueExhaustedEarly {
                pumped_m3: self.totals.pumped_m3,
                required_m3: required,
            });
        }
        Ok(state)
    }

    /// Build the record matching the operation kind.
    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        step: usize,
        state: &WellboreState,
        bp: &BackPressure,
        swab_surge_pa: f64,
        pump_rate_m3ps: f64,
        apl_pa: f64,
        step_volume_m3: Option<f64>,
    ) -> StepRecord {
        let t = &self.totals;
        let state = state.clone();
        match self.plan.kind {
            OperationKind::TripOut => StepRecord::TripOut(TripOutStep {
                step,
                backfill_m3: step_volume_m3.unwrap_or(0.0),
                cumulative_backfill_m3: t.backfill_m3,
                cumulative_pulled_wet_m3: t.pulled_wet_m3,
                swab_pa: swab_surge_pa,
                effective_esd_kg_m3: bp.effective_esd_kg_m3,
                cumulative_pit_gain_m3: self.pit_gain(),
                state,
            }),
            OperationKind::TripIn => StepRecord::TripIn(TripInStep {
                step,
                displacement_m3: step_volume_m3.unwrap_or(0.0),
                cumulative_fill_m3: t.fill_m3,
                cumulative_displacement_returns_m3: t.displacement_returns_m3,
                surge_pa: swab_surge_pa,
                effective_esd_kg_m3: bp.effective_esd_kg_m3,
                cumulative_pit_gain_m3: self.pit_gain(),
                state,
            }),
            OperationKind::Circulate => StepRecord::Circulation(CirculationStep {
                step,
                queue_index: 0,
                pumped_m3: 0.0,
                cumulative_pumped_m3: t.pumped_m3,
                cumulative_returns_m3: t.circulation_returns_m3,
                pump_rate_m3ps,
                apl_pa,
                elapsed_s: t.pump_time_s,
                effective_esd_kg_m3: bp.effective_esd_kg_m3,
                cumulative_pit_gain_m3: self.pit_gain(),
                state,
            }),
            OperationKind::ReamOut | OperationKind::ReamIn => StepRecord::Ream(ReamStep {
                step,
                outward: self.plan.kind.is_outward(),
                cumulative_backfill_m3: t.backfill_m3,
                cumulative_fill_m3: t.fill_m3,
                cumulative_pumped_m3: t.pumped_m3,
                cumulative_returns_m3: t.circulation_returns_m3 + t.displacement_returns_m3,
                pump_rate_m3ps,
                apl_pa,
                swab_surge_pa,
                effective_esd_kg_m3: bp.effective_esd_kg_m3,
                cumulative_pit_gain_m3: self.pit_gain(),
                state,
            }),
        }
    }
}

/// Annulus volume per metre over the metre above the bit, or the shorter
/// interval up to surface when the bit is shallower than that.
fn annular_capacity_per_m(geometry: &dyn GeometryProvider, bit_md: f64) -> f64 {
    let top = (bit_md - 1.0).max(0.0);
    let len = bit_md - top;
    if len > 0.0 {
        geometry.annular_volume(top, bit_md) / len
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_geometry::WellGeometry;

    #[test]
    fn shallow_bit_capacity_matches_deep_capacity() {
        let g = WellGeometry::uniform_vertical(2000.0, 0.2159, 0.127, 0.1086).unwrap();
        let deep = annular_capacity_per_m(&g, 1500.0);
        let shallow = annular_capacity_per_m(&g, 0.5);
        assert!(deep > 0.0);
        assert!((shallow - deep).abs() < 1e-9);
        assert_eq!(annular_capacity_per_m(&g, 0.0), 0.0);
    }
}
