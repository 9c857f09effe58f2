use std::path::PathBuf;

use clap::Args;

pub const DEFAULT_STORE_FILE: &str = "rentmax_scenarios_v1.json";

/// Settings for the HTTP server. Flags override the environment.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    #[arg(long, env = "RENTMAX_PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long = "store",
        env = "RENTMAX_STORE",
        default_value = DEFAULT_STORE_FILE,
        help = "JSON file holding saved scenarios"
    )]
    pub store_path: PathBuf,
    #[arg(
        long,
        env = "RENTMAX_LOG",
        default_value = "info",
        help = "Log filter used when RUST_LOG is unset"
    )]
    pub log_filter: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            log_filter: "info".to_string(),
        }
    }
}
