//! Sectioned well geometry: hole sections, pipe sections and a survey.

use std::f64::consts::PI;

use crate::error::{GeometryError, GeometryResult};
use crate::provider::GeometryProvider;
use crate::survey::Survey;
use wf_core::MD_EPS;

/// Hole interval (casing ID or open hole diameter).
#[derive(Debug, Clone, PartialEq)]
pub struct HoleSection {
    pub name: String,
    pub top_md: f64,
    pub bottom_md: f64,
    /// Inner diameter of casing, or bit size for open hole (m)
    pub diameter_m: f64,
    pub cased: bool,
}

/// Pipe interval, indexed by the MD it occupies when run to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeSection {
    pub name: String,
    pub top_md: f64,
    pub bottom_md: f64,
    pub od_m: f64,
    pub id_m: f64,
}

fn circle_area(d: f64) -> f64 {
    0.25 * PI * d * d
}

fn overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

/// Well geometry built from contiguous sections.
#[derive(Debug, Clone)]
pub struct WellGeometry {
    hole: Vec<HoleSection>,
    pipe: Vec<PipeSection>,
    survey: Survey,
}

impl WellGeometry {
    /// Validate and assemble a geometry.
    ///
    /// Hole and pipe sections must each start at surface and be contiguous;
    /// pipe OD must be larger than ID and smaller than the hole wherever both
    /// are defined; a non-vertical survey must reach total depth.
    pub fn new(
        mut hole: Vec<HoleSection>,
        mut pipe: Vec<PipeSection>,
        survey: Survey,
    ) -> GeometryResult<Self> {
        if hole.is_empty() {
            return Err(GeometryError::MissingGeometry {
                what: "no hole/annulus sections defined",
            });
        }
        if pipe.is_empty() {
            return Err(GeometryError::MissingGeometry {
                what: "no drill string sections defined",
            });
        }

        hole.sort_by(|a, b| a.top_md.total_cmp(&b.top_md));
        pipe.sort_by(|a, b| a.top_md.total_cmp(&b.top_md));

        check_contiguous(
            hole.iter().map(|s| (s.name.as_str(), s.top_md, s.bottom_md)),
        )?;
        check_contiguous(
            pipe.iter().map(|s| (s.name.as_str(), s.top_md, s.bottom_md)),
        )?;

        for s in &hole {
            if !(s.diameter_m > 0.0) {
                return Err(GeometryError::InvalidSection {
                    name: s.name.clone(),
                    reason: "hole diameter must be positive".to_string(),
                });
            }
        }
        for p in &pipe {
            if !(p.id_m > 0.0 && p.od_m > p.id_m) {
                return Err(GeometryError::InvalidSection {
                    name: p.name.clone(),
                    reason: format!("pipe OD {} must exceed a positive ID {}", p.od_m, p.id_m),
                });
            }
            for h in &hole {
                if overlap(p.top_md, p.bottom_md, h.top_md, h.bottom_md) > 0.0
                    && p.od_m >= h.diameter_m
                {
                    return Err(GeometryError::InvalidSection {
                        name: p.name.clone(),
                        reason: format!("pipe OD {} does not fit hole '{}'", p.od_m, h.name),
                    });
                }
            }
        }

        let td = hole.last().map(|s| s.bottom_md).unwrap_or(0.0);
        if let Some(last) = survey.last_md()
            && last + MD_EPS < td
        {
            return Err(GeometryError::OutOfRange {
                md: td,
                limit: last,
            });
        }

        Ok(Self { hole, pipe, survey })
    }

    /// Vertical well with one hole size and one pipe size from surface to `td`.
    pub fn uniform_vertical(td: f64, hole_d: f64, od: f64, id: f64) -> GeometryResult<Self> {
        Self::new(
            vec![HoleSection {
                name: "hole".to_string(),
                top_md: 0.0,
                bottom_md: td,
                diameter_m: hole_d,
                cased: false,
            }],
            vec![PipeSection {
                name: "pipe".to_string(),
                top_md: 0.0,
                bottom_md: td,
                od_m: od,
                id_m: id,
            }],
            Survey::vertical(),
        )
    }

    pub fn hole_sections(&self) -> &[HoleSection] {
        &self.hole
    }

    pub fn pipe_sections(&self) -> &[PipeSection] {
        &self.pipe
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    fn pipe_integral(&self, md_a: f64, md_b: f64, area: impl Fn(&PipeSection) -> f64) -> f64 {
        let (lo, hi) = (md_a.min(md_b), md_a.max(md_b));
        self.pipe
            .iter()
            .map(|s| overlap(lo, hi, s.top_md, s.bottom_md) * area(s))
            .sum()
    }
}

fn check_contiguous<'a>(
    sections: impl Iterator<Item = (&'a str, f64, f64)>,
) -> GeometryResult<()> {
    let mut expected_top = 0.0;
    for (name, top, bottom) in sections {
        if !(bottom > top) {
            return Err(GeometryError::InvalidSection {
                name: name.to_string(),
                reason: format!("bottom MD {bottom} must exceed top MD {top}"),
            });
        }
        if (top - expected_top).abs() > MD_EPS {
            return Err(GeometryError::InvalidSection {
                name: name.to_string(),
                reason: format!("starts at {top} but previous section ends at {expected_top}"),
            });
        }
        expected_top = bottom;
    }
    Ok(())
}

impl GeometryProvider for WellGeometry {
    fn volume_of_string_od(&self, md_a: f64, md_b: f64) -> f64 {
        self.pipe_integral(md_a, md_b, |s| circle_area(s.od_m))
    }

    fn volume_in_string(&self, md_a: f64, md_b: f64) -> f64 {
        self.pipe_integral(md_a, md_b, |s| circle_area(s.id_m))
    }

    fn volume_of_hole(&self, md_a: f64, md_b: f64) -> f64 {
        let (lo, hi) = (md_a.min(md_b), md_a.max(md_b));
        self.hole
            .iter()
            .map(|s| overlap(lo, hi, s.top_md, s.bottom_md) * circle_area(s.diameter_m))
            .sum()
    }

    fn tvd(&self, md: f64) -> f64 {
        self.survey.tvd(md)
    }

    fn total_depth(&self) -> f64 {
        self.hole.last().map(|s| s.bottom_md).unwrap_or(0.0)
    }

    fn string_reach(&self) -> f64 {
        self.pipe.last().map(|s| s.bottom_md).unwrap_or(0.0)
    }
}
