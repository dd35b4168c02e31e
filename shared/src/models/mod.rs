//! Domain models for the Pyro Predictor platform

pub mod district;
pub mod location;

pub use district::*;
pub use location::*;
