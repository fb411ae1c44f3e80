//! Directional survey and MD→TVD interpolation.

use crate::error::{GeometryError, GeometryResult};
use wf_core::MD_EPS;

/// One survey station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyStation {
    pub md: f64,
    pub tvd: f64,
}

/// Ordered survey with linear interpolation between stations.
///
/// An empty survey describes a vertical well (`tvd == md`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Survey {
    stations: Vec<SurveyStation>,
}

impl Survey {
    pub fn vertical() -> Self {
        Self::default()
    }

    /// Build a survey, prepending a surface station when missing.
    pub fn new(mut stations: Vec<SurveyStation>) -> GeometryResult<Self> {
        if stations.is_empty() {
            return Ok(Self::vertical());
        }
        if stations[0].md > MD_EPS {
            stations.insert(0, SurveyStation { md: 0.0, tvd: 0.0 });
        }

        for pair in stations.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let d_md = b.md - a.md;
            let d_tvd = b.tvd - a.tvd;
            if d_md <= 0.0 {
                return Err(GeometryError::NonMonotonic {
                    what: format!("survey MD {} follows {}", b.md, a.md),
                });
            }
            if d_tvd < -MD_EPS {
                return Err(GeometryError::NonMonotonic {
                    what: format!("survey TVD decreases between MD {} and {}", a.md, b.md),
                });
            }
            if d_tvd > d_md + MD_EPS {
                return Err(GeometryError::NonMonotonic {
                    what: format!("survey TVD gain exceeds MD between {} and {}", a.md, b.md),
                });
            }
        }

        Ok(Self { stations })
    }

    pub fn stations(&self) -> &[SurveyStation] {
        &self.stations
    }

    pub fn is_vertical(&self) -> bool {
        self.stations.is_empty()
    }

    /// Deepest surveyed MD, or `None` for a vertical well.
    pub fn last_md(&self) -> Option<f64> {
        self.stations.last().map(|s| s.md)
    }

    pub fn tvd(&self, md: f64) -> f64 {
        if self.stations.is_empty() {
            return md;
        }
        let idx = self.stations.partition_point(|s| s.md < md);
        if idx == 0 {
            return self.stations[0].tvd;
        }
        if idx >= self.stations.len() {
            // Past the last station: hold the last inclination.
            let n = self.stations.len();
            if n < 2 {
                return self.stations[n - 1].tvd + (md - self.stations[n - 1].md);
            }
            let (a, b) = (self.stations[n - 2], self.stations[n - 1]);
            let slope = (b.tvd - a.tvd) / (b.md - a.md);
            return b.tvd + slope * (md - b.md);
        }
        let (a, b) = (self.stations[idx - 1], self.stations[idx]);
        let frac = (md - a.md) / (b.md - a.md);
        a.tvd + frac * (b.tvd - a.tvd)
    }
}
