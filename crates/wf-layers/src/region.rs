use std::fmt;

use serde::{Deserialize, Serialize};
use wf_geometry::GeometryProvider;

/// Wellbore region holding a layer stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Inside the drill string bore, surface to bit.
    String,
    /// Between pipe and hole, surface to bit.
    Annulus,
    /// Open hole below the bit, bit to total depth.
    Pocket,
}

impl Region {
    /// Fluid capacity of this region over `[md_a, md_b]` (m³).
    pub fn capacity(self, geometry: &dyn GeometryProvider, md_a: f64, md_b: f64) -> f64 {
        match self {
            Region::String => geometry.volume_in_string(md_a, md_b),
            Region::Annulus => geometry.annular_volume(md_a, md_b),
            Region::Pocket => geometry.volume_of_hole(md_a, md_b),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::String => write!(f, "string"),
            Region::Annulus => write!(f, "annulus"),
            Region::Pocket => write!(f, "pocket"),
        }
    }
}
