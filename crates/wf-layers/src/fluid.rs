//! Fluids and volume parcels.

use serde::{Deserialize, Serialize};
use wf_core::constants::AIR_DENSITY_KG_M3;

const AIR_LABEL: &str = "air";

/// A fluid occupying a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fluid {
    pub density_kg_m3: f64,
    /// Display color, e.g. `#8B5A2B`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Mud name, or `air` for drained pipe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Fluid {
    pub fn new(density_kg_m3: f64) -> Self {
        Self {
            density_kg_m3,
            color: None,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Empty pipe.
    pub fn air() -> Self {
        Self::new(AIR_DENSITY_KG_M3).with_label(AIR_LABEL)
    }

    /// Densities at or below air density are treated as void.
    pub fn is_air(&self) -> bool {
        self.density_kg_m3 <= AIR_DENSITY_KG_M3 * (1.0 + 1e-9)
    }

    /// Volume-weighted mix of two fluids; label and color follow the larger share.
    pub fn blend(&self, volume: f64, other: &Fluid, other_volume: f64) -> Fluid {
        if self == other {
            return self.clone();
        }
        let total = volume + other_volume;
        if total <= 0.0 {
            return self.clone();
        }
        let density = (self.density_kg_m3 * volume + other.density_kg_m3 * other_volume) / total;
        let dominant = if volume >= other_volume { self } else { other };
        Fluid {
            density_kg_m3: density,
            color: dominant.color.clone(),
            label: dominant.label.clone(),
        }
    }
}

/// A volume of one fluid in transit between regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub fluid: Fluid,
    pub volume_m3: f64,
}

impl Parcel {
    pub fn new(fluid: Fluid, volume_m3: f64) -> Self {
        Self { fluid, volume_m3 }
    }
}

pub fn total_volume(parcels: &[Parcel]) -> f64 {
    parcels.iter().map(|p| p.volume_m3).sum()
}

/// Merge neighbouring parcels of the same fluid.
pub(crate) fn merge_parcels(parcels: Vec<Parcel>) -> Vec<Parcel> {
    let mut merged: Vec<Parcel> = Vec::with_capacity(parcels.len());
    for p in parcels {
        match merged.last_mut() {
            Some(last) if last.fluid == p.fluid => last.volume_m3 += p.volume_m3,
            _ => merged.push(p),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_weights_density() {
        let a = Fluid::new(1000.0).with_label("water");
        let b = Fluid::new(1600.0).with_label("slug");
        let mix = a.blend(3.0, &b, 1.0);
        assert!((mix.density_kg_m3 - 1150.0).abs() < 1e-12);
        assert_eq!(mix.label.as_deref(), Some("water"));
    }

    #[test]
    fn air_is_void() {
        assert!(Fluid::air().is_air());
        assert!(!Fluid::new(1030.0).is_air());
    }

    #[test]
    fn merge_joins_equal_neighbours() {
        let a = Fluid::new(1200.0);
        let merged = merge_parcels(vec![
            Parcel::new(a.clone(), 1.0),
            Parcel::new(a.clone(), 2.0),
            Parcel::new(Fluid::new(1300.0), 1.0),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].volume_m3, 3.0);
    }
}
