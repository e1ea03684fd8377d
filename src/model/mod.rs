pub mod bim;
pub mod tmdl;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PbipError, Result};
use crate::report::Reporter;
use crate::rows::RowRecord;

pub const MODEL_BIM: &str = "model.bim";
pub const DEFINITION_DIR: &str = "definition";
pub const MODEL_TMDL: &str = "model.tmdl";

/// On-disk serialization of a semantic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// Single `model.bim` JSON document.
    Bim,
    /// `definition/` directory of TMDL files.
    Tmdl,
    Unknown,
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bim => "model.bim (single file)",
            Self::Tmdl => "TMDL (multi file)",
            Self::Unknown => "unknown",
        })
    }
}

/// Priority: model.bim > definition/model.tmdl. A missing directory is `Unknown`.
pub fn detect(model_dir: &Path) -> ModelFormat {
    if model_dir.join(MODEL_BIM).is_file() {
        return ModelFormat::Bim;
    }

    let definition = model_dir.join(DEFINITION_DIR);
    if definition.is_dir() && definition.join(MODEL_TMDL).is_file() {
        return ModelFormat::Tmdl;
    }

    ModelFormat::Unknown
}

/// A parameter whose value was rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterChange {
    pub name: String,
    pub value: String,
}

/// What a rewriter did to a model.
#[derive(Debug, Default)]
pub struct UpdateOutcome {
    pub updated: Vec<ParameterChange>,
    /// Parameters that already held the requested value.
    pub unchanged: Vec<String>,
    pub files_changed: Vec<PathBuf>,
}

impl UpdateOutcome {
    pub fn is_noop(&self) -> bool {
        self.updated.is_empty()
    }
}

/// Current value of every parameter defined in the model.
pub fn list_parameters(format: ModelFormat, model_dir: &Path) -> Result<BTreeMap<String, String>> {
    match format {
        ModelFormat::Bim => bim::list_parameters(model_dir),
        ModelFormat::Tmdl => tmdl::list_parameters(model_dir),
        ModelFormat::Unknown => Err(PbipError::UnknownModelFormat {
            path: model_dir.to_path_buf(),
        }),
    }
}

/// Rewrite every parameter of the model that the row has a value for.
pub fn apply_updates(
    format: ModelFormat,
    model_dir: &Path,
    row: &RowRecord,
    reporter: &dyn Reporter,
) -> Result<UpdateOutcome> {
    match format {
        ModelFormat::Bim => bim::apply_updates(model_dir, row, reporter),
        ModelFormat::Tmdl => tmdl::apply_updates(model_dir, row, reporter),
        ModelFormat::Unknown => Err(PbipError::UnknownModelFormat {
            path: model_dir.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_bim() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model.bim"), r#"{"model": {"expressions": []}}"#).unwrap();
        assert_eq!(detect(dir.path()), ModelFormat::Bim);
    }

    #[test]
    fn detects_tmdl() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("definition")).unwrap();
        fs::write(
            dir.path().join("definition/model.tmdl"),
            "model Model\n\tculture: en-US\n",
        )
        .unwrap();
        assert_eq!(detect(dir.path()), ModelFormat::Tmdl);
    }

    #[test]
    fn bim_wins_when_both_present() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("definition")).unwrap();
        fs::write(dir.path().join("definition/model.tmdl"), "model Model\n").unwrap();
        fs::write(dir.path().join("model.bim"), "{}").unwrap();
        assert_eq!(detect(dir.path()), ModelFormat::Bim);
    }

    #[test]
    fn definition_without_model_file_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("definition/tables")).unwrap();
        assert_eq!(detect(dir.path()), ModelFormat::Unknown);
    }

    #[test]
    fn missing_directory_is_unknown() {
        assert_eq!(
            detect(Path::new("/nonexistent/Example.SemanticModel")),
            ModelFormat::Unknown
        );
    }

    #[test]
    fn unknown_format_cannot_be_updated() {
        let dir = tempfile::tempdir().unwrap();
        let row = RowRecord::from_pairs([("Name", "x")]);
        let reporter = crate::report::MemoryReporter::new();
        let err = apply_updates(ModelFormat::Unknown, dir.path(), &row, &reporter).unwrap_err();
        assert!(matches!(err, PbipError::UnknownModelFormat { .. }));
    }
}
