//! Geometry provider trait consumed by the layer model and step engine.

/// Pure MD-indexed geometry queries.
///
/// All volume queries accept the interval bounds in either order and return a
/// non-negative volume in m³. Implementations must be monotonic in MD: a
/// wider interval never has less volume, and `tvd` never decreases with MD.
pub trait GeometryProvider: Send + Sync {
    /// Closed-end displacement of the pipe (outer diameter) over `[md_a, md_b]`.
    fn volume_of_string_od(&self, md_a: f64, md_b: f64) -> f64;

    /// Bore capacity of the pipe (inner diameter) over `[md_a, md_b]`.
    fn volume_in_string(&self, md_a: f64, md_b: f64) -> f64;

    /// Capacity of the hole (casing ID or open hole) over `[md_a, md_b]`.
    fn volume_of_hole(&self, md_a: f64, md_b: f64) -> f64;

    /// True vertical depth at `md`.
    fn tvd(&self, md: f64) -> f64;

    /// Deepest MD of the hole.
    fn total_depth(&self) -> f64;

    /// Deepest MD for which pipe dimensions are defined.
    fn string_reach(&self) -> f64;

    /// Steel volume of the pipe wall over `[md_a, md_b]` (OD minus ID).
    fn steel_volume(&self, md_a: f64, md_b: f64) -> f64 {
        (self.volume_of_string_od(md_a, md_b) - self.volume_in_string(md_a, md_b)).max(0.0)
    }

    /// Annular capacity around the pipe over `[md_a, md_b]`.
    fn annular_volume(&self, md_a: f64, md_b: f64) -> f64 {
        (self.volume_of_hole(md_a, md_b) - self.volume_of_string_od(md_a, md_b)).max(0.0)
    }

    /// Whether the pipe and hole geometry both cover `[0, md]`.
    fn covers(&self, md: f64) -> bool {
        md >= 0.0 && md <= self.total_depth() && md <= self.string_reach()
    }
}
