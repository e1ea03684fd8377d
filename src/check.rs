use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::Config;
use crate::error::{PbipError, Result};
use crate::model::{self, ModelFormat};
use crate::project::ProjectDir;
use crate::rows::RowRecord;

/// Result of validating a PBIP template folder.
#[derive(Debug)]
pub struct CheckResult {
    pub identifier: String,
    pub format: ModelFormat,
    /// Parameters found in the semantic model and their current values.
    pub parameters: BTreeMap<String, String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CheckResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a template folder.
///
/// Structural problems are collected in `errors`; only a path that does not
/// exist at all is returned as `Err`.
pub fn check_template(template_dir: &Path) -> Result<CheckResult> {
    if !template_dir.exists() {
        return Err(PbipError::TemplateNotFound {
            path: template_dir.to_path_buf(),
        });
    }

    let project = ProjectDir::from_template(template_dir).ok_or_else(|| {
        PbipError::TemplateInvalid {
            path: template_dir.to_path_buf(),
            reason: "the folder name is not valid UTF-8".into(),
        }
    })?;

    let mut result = CheckResult {
        identifier: project.identifier().to_string(),
        format: ModelFormat::Unknown,
        parameters: BTreeMap::new(),
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    if !template_dir.is_dir() {
        result
            .errors
            .push(format!("{} is not a directory", template_dir.display()));
        return Ok(result);
    }

    let descriptor = project.descriptor();
    if !descriptor.is_file() {
        result.errors.push(format!(
            "Project file not found: {}",
            file_name(&descriptor)
        ));
    }
    if !project.report_dir().is_dir() {
        result.errors.push(format!(
            "Report folder not found: {}",
            file_name(&project.report_dir())
        ));
    }

    let model_dir = project.model_dir();
    if !model_dir.is_dir() {
        result.errors.push(format!(
            "Semantic model folder not found: {}",
            file_name(&model_dir)
        ));
        return Ok(result);
    }

    result.format = model::detect(&model_dir);
    if result.format == ModelFormat::Unknown {
        result.errors.push(format!(
            "{} contains neither model.bim nor definition/model.tmdl",
            file_name(&model_dir)
        ));
        return Ok(result);
    }

    match model::list_parameters(result.format, &model_dir) {
        Ok(parameters) if parameters.is_empty() => {
            result
                .warnings
                .push("No parameters found in the semantic model".into());
        }
        Ok(parameters) => result.parameters = parameters,
        Err(e) => result.errors.push(e.to_string()),
    }

    Ok(result)
}

/// `check_template`, turning any collected error into `TemplateInvalid`.
pub fn require_valid_template(template_dir: &Path) -> Result<CheckResult> {
    let result = check_template(template_dir)?;
    if !result.is_valid() {
        return Err(PbipError::TemplateInvalid {
            path: template_dir.to_path_buf(),
            reason: result.errors.join("; "),
        });
    }
    Ok(result)
}

/// How the configured parameters line up with the data columns.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MappingCheck {
    /// Configured parameters with no column.
    pub missing: Vec<String>,
    /// Columns that are not configured parameters.
    pub extra: Vec<String>,
}

impl MappingCheck {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn into_result(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(PbipError::MissingParameters {
                names: self.missing,
            })
        }
    }
}

pub fn check_mapping(config: &Config, columns: &[String]) -> MappingCheck {
    let declared: BTreeSet<&str> = config.parameter_names().collect();
    let present: BTreeSet<&str> = columns.iter().map(String::as_str).collect();

    MappingCheck {
        missing: config
            .parameter_names()
            .filter(|name| !present.contains(name))
            .map(str::to_string)
            .collect(),
        extra: columns
            .iter()
            .filter(|column| !declared.contains(column.as_str()))
            .cloned()
            .collect(),
    }
}

/// Warnings for values that do not parse as their parameter's declared type.
pub fn check_values(config: &Config, rows: &[RowRecord]) -> Vec<String> {
    let mut warnings = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        for param in &config.parameters {
            let Some(value) = row.get(&param.name) else {
                continue;
            };
            if !param.param_type.accepts(value) {
                warnings.push(format!(
                    "Row {}: '{}' is not a valid {} for parameter '{}'",
                    i + 1,
                    value,
                    param.param_type,
                    param.name
                ));
            }
        }
    }
    warnings
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
