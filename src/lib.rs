pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod estimate;
pub mod export;
pub mod logging;
pub mod scenario;

pub use error::{Error, Result};
