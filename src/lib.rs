//! Viability simulator for a ride-hailing launch in a mid-size city.
//!
//! [`project`] turns a parameter set and a scenario into a 36-month series
//! of operational and financial results; [`audit_years`] rolls that series
//! up by calendar year. Everything else (reports, sweeps, exports) is built
//! on those two pure functions.

pub mod audit;
pub mod capacity;
pub mod financials;
pub mod growth;
pub mod market;
pub mod output;
pub mod params;
pub mod projection;
pub mod report;
pub mod scenarios;
pub mod sweep;

pub use audit::{audit_years, YearAudit};
pub use financials::MonthlyResult;
pub use params::{ParamError, SimulationParameters, TechFee};
pub use projection::{project, project_checked, Projection};
pub use scenarios::ScenarioTag;
