use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::parameter::ParameterConfig;
use crate::error::{PbipError, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub parameters: Vec<ParameterConfig>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    /// Where generated projects go when no `--output-dir` is given.
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `pbipgen=debug`.
    pub level: Option<String>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for param in &self.parameters {
            if param.name.trim().is_empty() {
                return Err(PbipError::ConfigInvalidParameter {
                    name: param.name.clone(),
                    reason: "parameter names must not be empty".into(),
                });
            }
            if !seen.insert(param.name.as_str()) {
                return Err(PbipError::ConfigInvalidParameter {
                    name: param.name.clone(),
                    reason: "parameter is declared more than once".into(),
                });
            }
        }
        Ok(())
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}
