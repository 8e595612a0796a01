//! CLI configuration via environment variables
//!
//! Tool locations and the store root live in ~/.kiln/config.toml; the
//! environment only tweaks how results are presented.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Print a JSON summary by default (KILN_JSON=1)
    pub default_json: bool,
    /// Disable colored output (KILN_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("KILN_JSON")
                .map(|v| {
                    let lower = v.to_lowercase();
                    lower == "1" || lower == "true" || lower == "json"
                })
                .unwrap_or(false),
            no_color: env::var("KILN_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
        }
    }
}
