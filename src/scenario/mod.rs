//! Saved scenarios and the portfolio view computed over them.
//!
//! A [`ScenarioStore`] is a newest-first list persisted as one JSON file, the
//! local key-value store the form layer saves into. Results are never stored;
//! [`portfolio`] recomputes each row from the scenario's assumptions.

mod portfolio;
mod store;

pub use portfolio::{
    CompareSelection, ComparisonColumn, PortfolioRow, SortDirection, SortKey, compare, portfolio,
};
pub use store::{Scenario, ScenarioStore};
