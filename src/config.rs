//! Run-level configuration
//!
//! Layered: built-in defaults, then an optional config file, then
//! `CHANGESCOUT_*` environment overrides (double underscore for nesting,
//! e.g. `CHANGESCOUT_ORACLE__MODEL`).

use std::path::Path;

use ::config::{Config, Environment, File};
use context_store::StoreCaps;
use oracle_gateway::OracleConfig;
use route_discovery::{ScoringConfig, MAX_EXPLORATION_ROUTES};
use serde::{Deserialize, Serialize};
use step_executor::ExecutorConfig;

use crate::errors::ScoutError;

/// Everything one exploration run needs to know.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Entry url of the application build under test.
    pub base_url: String,

    /// How many top-ranked routes get a deep exploration pass.
    pub max_routes: usize,

    pub oracle: OracleConfig,
    pub caps: StoreCaps,
    pub scoring: ScoringConfig,
    pub executor: ExecutorConfig,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            max_routes: MAX_EXPLORATION_ROUTES,
            oracle: OracleConfig::default(),
            caps: StoreCaps::default(),
            scoring: ScoringConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl ExploreConfig {
    /// Load configuration with the default layering. `path` points at an
    /// explicit config file; without it, a `changescout.*` file in the
    /// working directory is picked up when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ScoutError> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("changescout").required(false)),
        };
        builder = builder.add_source(Environment::with_prefix("CHANGESCOUT").separator("__"));

        builder
            .build()
            .map_err(|err| ScoutError::config(err.to_string()))?
            .try_deserialize()
            .map_err(|err| ScoutError::config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_complete() {
        let config = ExploreConfig::default();
        assert_eq!(config.max_routes, 3);
        assert_eq!(config.caps.navigation, 20);
        assert_eq!(config.oracle.confidence_threshold, 0.6);
        assert_eq!(config.scoring.cutoff, 0.3);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "base_url = \"https://preview.app.test\"\nmax_routes = 5\n\n[oracle]\nmodel = \"scout-v2\"\n\n[executor]\ninter_step_pause_ms = 50"
        )
        .unwrap();

        let config = ExploreConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.base_url, "https://preview.app.test");
        assert_eq!(config.max_routes, 5);
        assert_eq!(config.oracle.model, "scout-v2");
        assert_eq!(config.executor.inter_step_pause_ms, 50);
        // Untouched sections keep their defaults.
        assert_eq!(config.caps.snapshots, 10);
    }
}
