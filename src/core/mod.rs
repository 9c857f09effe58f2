mod advisory;
mod engine;
pub mod number;
mod types;

pub use advisory::{Advisory, advisories};
pub use engine::{compute, monthly_payment};
pub use types::{AssumptionSet, FieldValue, Metric, Preset, ResultSet};
