pub mod constants;
pub mod kepler;
pub mod keplerian_element;
pub mod ref_system;
pub mod search;
pub mod solar_system;
pub mod system;
pub mod tyche_errors;

pub use keplerian_element::KeplerianElements;
pub use search::{run_search, EtnoEffect, EtnoRecord, SearchParams, SearchResult, SearchWarning};
pub use system::{Body, IntegrationOutput, IntegrationWarning, Snapshot, System};
pub use tyche_errors::TycheError;
