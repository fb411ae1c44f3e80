//! Query helpers over a loaded timeline.

use wf_results::{Series, Timeline};

use crate::error::{AppError, AppResult};

/// Summary of a report's timeline.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub record_count: usize,
    pub operation_count: usize,
    pub failed_operations: usize,
    pub bit_md_range: (f64, f64),
    pub max_sabp_pa: f64,
    pub final_pit_gain_m3: f64,
}

pub fn get_report_summary(timeline: &Timeline) -> AppResult<ReportSummary> {
    if timeline.is_empty() {
        return Err(AppError::InvalidInput("No records in report".to_string()));
    }

    let mut bit_min = f64::INFINITY;
    let mut bit_max = f64::NEG_INFINITY;
    let mut max_sabp = 0.0_f64;
    for point in timeline.points() {
        bit_min = bit_min.min(point.record.bit_md());
        bit_max = bit_max.max(point.record.bit_md());
        max_sabp = max_sabp.max(point.record.sabp_pa());
    }
    let final_pit_gain = timeline
        .points()
        .last()
        .map(|p| p.record.cumulative_pit_gain_m3())
        .unwrap_or(0.0);

    Ok(ReportSummary {
        record_count: timeline.len(),
        operation_count: timeline.segments().len(),
        failed_operations: timeline
            .segments()
            .iter()
            .filter(|s| s.error.is_some())
            .count(),
        bit_md_range: (bit_min, bit_max),
        max_sabp_pa: max_sabp,
        final_pit_gain_m3: final_pit_gain,
    })
}

/// Extract `(global index, value)` pairs for a named series.
pub fn extract_series(timeline: &Timeline, name: &str) -> AppResult<Vec<(usize, f64)>> {
    let series: Series = name
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Unknown series: {}", name)))?;
    Ok(timeline.series(series))
}
