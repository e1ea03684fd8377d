pub mod parameter;
pub mod schema;

use std::path::Path;

use crate::error::{PbipError, Result};
use crate::fsutil;

pub use parameter::{ParameterConfig, ParameterType};
pub use schema::{Config, LoggingConfig, OutputConfig};

/// Load and validate a generation config from a YAML file.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.is_file() {
        return Err(PbipError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fsutil::read_to_string(path)?;

    let config: Config = serde_yaml::from_str(&content).map_err(|e| PbipError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}
