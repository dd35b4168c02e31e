//! Shared types and pure computations for the Pyro Predictor platform
//!
//! This crate holds everything that does not touch the network: coordinates,
//! the 7-day record shapes, calendar arithmetic in the service time zone and
//! the hourly-to-daily reductions. The backend and the refresh job both build
//! on it.

pub mod aggregation;
pub mod date_window;
pub mod models;
pub mod types;
pub mod validation;

pub use aggregation::*;
pub use date_window::*;
pub use models::*;
pub use types::*;
pub use validation::*;
