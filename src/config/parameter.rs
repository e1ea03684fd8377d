use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a parameter value.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    #[default]
    #[serde(alias = "text")]
    String,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "number", alias = "decimal")]
    Float,
    #[serde(alias = "bool")]
    Boolean,
}

impl ParameterType {
    /// Whether a raw CSV value can be read as this type.
    pub fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Self::String => true,
            Self::Integer => value.parse::<i64>().is_ok(),
            Self::Float => value.parse::<f64>().is_ok(),
            Self::Boolean => matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "1" | "0" | "yes" | "no"
            ),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParameterConfig {
    pub name: String,

    #[serde(rename = "type", default)]
    pub param_type: ParameterType,
}
