//! Fluid layer model for wellflow.
//!
//! A wellbore is split into three regions: inside the drill string, the
//! annulus above the bit, and the open-hole pocket below the bit. Each region
//! holds a [`LayerStack`]: contiguous, MD-sorted fluid segments whose union
//! spans the region's occupied range. Every mutation returns a new stack, so
//! a [`WellboreState`] is an immutable snapshot.

pub mod error;
pub mod fluid;
pub mod region;
pub mod stack;
pub mod state;

pub use error::{LayerError, LayerResult};
pub use fluid::{Fluid, Parcel, total_volume};
pub use region::Region;
pub use stack::{FluidLayer, LayerStack, blend_by_depth};
pub use state::{FloatState, WellboreState};
