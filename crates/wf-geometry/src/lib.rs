//! Wellbore geometry for wellflow.
//!
//! The simulation engine only sees the [`GeometryProvider`] trait: volumes of
//! the pipe outer diameter, the pipe bore and the hole over an MD interval, plus
//! the MD→TVD mapping. [`WellGeometry`] is the sectioned implementation built
//! from hole sections, pipe sections and a directional survey.

pub mod error;
pub mod provider;
pub mod sections;
pub mod survey;

pub use error::{GeometryError, GeometryResult};
pub use provider::GeometryProvider;
pub use sections::{HoleSection, PipeSection, WellGeometry};
pub use survey::{Survey, SurveyStation};
