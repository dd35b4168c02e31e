//! Business logic services for the Pyro Predictor backend

pub mod district_refresh;
pub mod districts;
pub mod location;

pub use district_refresh::{DistrictRefreshJob, RefreshOutcome, RefreshSummary, RoundRobin};
pub use districts::{District, DistrictCatalog};
pub use location::{LocationDataAssembler, LocationDataProvider};
