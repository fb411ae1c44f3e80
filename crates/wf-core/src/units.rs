// wf-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, Length as UomLength, MassDensity as UomMassDensity,
    Pressure as UomPressure, Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type Accel = UomAcceleration;
pub type Length = UomLength;
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;
pub type Volume = UomVolume;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

/// Hydrostatic head of a fluid column, `ρ · g · Δz`, in pascal.
#[inline]
pub fn hydrostatic_pa(density_kg_m3: f64, dtvd_m: f64) -> f64 {
    use uom::si::pressure::pascal;
    let head: Pressure = kg_per_m3(density_kg_m3) * constants::g0() * m(dtvd_m);
    head.get::<pascal>()
}

/// Density whose column of height `tvd_m` produces `pressure_pa`, in kg/m³.
#[inline]
pub fn equivalent_density_kg_m3(pressure_pa: f64, tvd_m: f64) -> f64 {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    let rho: Density = pa(pressure_pa) / (constants::g0() * m(tvd_m));
    rho.get::<kilogram_per_cubic_meter>()
}

/// Oilfield conversions for CSV export and CLI summaries.
pub mod display {
    use super::*;

    #[inline]
    pub fn pa_to_psi(v: f64) -> f64 {
        use uom::si::pressure::psi;
        pa(v).get::<psi>()
    }

    #[inline]
    pub fn kg_m3_to_ppg(v: f64) -> f64 {
        use uom::si::mass_density::pound_per_gallon;
        kg_per_m3(v).get::<pound_per_gallon>()
    }

    #[inline]
    pub fn m3_to_bbl(v: f64) -> f64 {
        use uom::si::volume::barrel;
        m3(v).get::<barrel>()
    }
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;

    /// Density used for drained (empty) pipe.
    pub const AIR_DENSITY_KG_M3: f64 = 1.2;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::meter_per_second_squared;
        Accel::new::<meter_per_second_squared>(G0_MPS2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrostatic_head_of_water_column() {
        let p = hydrostatic_pa(1000.0, 10.0);
        assert!((p - 98_066.5).abs() < 1e-6);
    }

    #[test]
    fn equivalent_density_inverts_head() {
        let p = hydrostatic_pa(1250.0, 2000.0);
        let rho = equivalent_density_kg_m3(p, 2000.0);
        assert!((rho - 1250.0).abs() < 1e-9);
    }

    #[test]
    fn display_conversions() {
        assert!((display::pa_to_psi(6_894.757) - 1.0).abs() < 1e-3);
        assert!((display::kg_m3_to_ppg(1198.26) - 10.0).abs() < 1e-2);
        assert!((display::m3_to_bbl(0.158_987_3) - 1.0).abs() < 1e-4);
    }
}
