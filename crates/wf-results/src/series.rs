//! Chartable series over the timeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wf_core::display::{kg_m3_to_ppg, m3_to_bbl, pa_to_psi};
use wf_sim::StepRecord;

use crate::ResultsError;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Series {
    BitMd,
    BitTvd,
    EsdAtControl,
    EffectiveEsd,
    Sabp,
    DynamicSabp,
    PitGain,
    PumpRate,
    Apl,
}

impl Series {
    pub const ALL: [Series; 9] = [
        Series::BitMd,
        Series::BitTvd,
        Series::EsdAtControl,
        Series::EffectiveEsd,
        Series::Sabp,
        Series::DynamicSabp,
        Series::PitGain,
        Series::PumpRate,
        Series::Apl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Series::BitMd => "bit_md",
            Series::BitTvd => "bit_tvd",
            Series::EsdAtControl => "esd",
            Series::EffectiveEsd => "effective_esd",
            Series::Sabp => "sabp",
            Series::DynamicSabp => "dynamic_sabp",
            Series::PitGain => "pit_gain",
            Series::PumpRate => "pump_rate",
            Series::Apl => "apl",
        }
    }

    /// CSV column header with unit.
    pub fn header(self) -> &'static str {
        match self {
            Series::BitMd => "bit_md_m",
            Series::BitTvd => "bit_tvd_m",
            Series::EsdAtControl => "esd_kg_m3",
            Series::EffectiveEsd => "effective_esd_kg_m3",
            Series::Sabp => "sabp_pa",
            Series::DynamicSabp => "dynamic_sabp_pa",
            Series::PitGain => "pit_gain_m3",
            Series::PumpRate => "pump_rate_m3ps",
            Series::Apl => "apl_pa",
        }
    }

    pub fn value(self, record: &StepRecord) -> f64 {
        match self {
            Series::BitMd => record.bit_md(),
            Series::BitTvd => record.state().bit_tvd,
            Series::EsdAtControl => record.esd_at_control_kg_m3(),
            Series::EffectiveEsd => record.effective_esd_kg_m3(),
            Series::Sabp => record.sabp_pa(),
            Series::DynamicSabp => record.dynamic_sabp_pa(),
            Series::PitGain => record.cumulative_pit_gain_m3(),
            Series::PumpRate => record.pump_rate_m3ps(),
            Series::Apl => record.apl_pa(),
        }
    }
}

/// Units for exported and printed values. Depths stay in metres either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Si,
    Oilfield,
}

impl Series {
    pub fn header_in(self, units: UnitSystem) -> &'static str {
        match units {
            UnitSystem::Si => self.header(),
            UnitSystem::Oilfield => match self {
                Series::BitMd | Series::BitTvd => self.header(),
                Series::EsdAtControl => "esd_ppg",
                Series::EffectiveEsd => "effective_esd_ppg",
                Series::Sabp => "sabp_psi",
                Series::DynamicSabp => "dynamic_sabp_psi",
                Series::PitGain => "pit_gain_bbl",
                Series::PumpRate => "pump_rate_bpm",
                Series::Apl => "apl_psi",
            },
        }
    }

    pub fn value_in(self, record: &StepRecord, units: UnitSystem) -> f64 {
        let v = self.value(record);
        match units {
            UnitSystem::Si => v,
            UnitSystem::Oilfield => match self {
                Series::BitMd | Series::BitTvd => v,
                Series::EsdAtControl | Series::EffectiveEsd => kg_m3_to_ppg(v),
                Series::Sabp | Series::DynamicSabp | Series::Apl => pa_to_psi(v),
                Series::PitGain => m3_to_bbl(v),
                Series::PumpRate => m3_to_bbl(v) * 60.0,
            },
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Series {
    type Err = ResultsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Series::ALL
            .into_iter()
            .find(|series| series.name() == key || series.header() == key)
            .ok_or_else(|| ResultsError::UnknownSeries {
                name: s.to_string(),
            })
    }
}

impl Timeline {
    /// `(global index, value)` pairs for one series.
    pub fn series(&self, series: Series) -> Vec<(usize, f64)> {
        self.points()
            .map(|p| (p.index, series.value(p.record)))
            .collect()
    }
}

/// CSV with one row per record: index, operation, step, then the requested series.
pub fn series_csv(timeline: &Timeline, columns: &[Series]) -> String {
    series_csv_in(timeline, columns, UnitSystem::Si)
}

pub fn series_csv_in(timeline: &Timeline, columns: &[Series], units: UnitSystem) -> String {
    let mut csv = String::from("index,operation,step");
    for column in columns {
        csv.push(',');
        csv.push_str(column.header_in(units));
    }
    csv.push('\n');

    for point in timeline.points() {
        csv.push_str(&format!("{},{},{}", point.index, point.operation, point.local));
        for column in columns {
            csv.push_str(&format!(",{}", column.value_in(point.record, units)));
        }
        csv.push('\n');
    }
    csv
}
