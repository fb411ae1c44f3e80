//! wf-core: stable foundation for wellflow.
//!
//! Contains:
//! - units (uom SI types, hydrostatics, oilfield display conversions)
//! - numeric (depth/volume resolution, finiteness check, bisection)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{WfError, WfResult};
pub use numeric::*;
pub use units::*;
