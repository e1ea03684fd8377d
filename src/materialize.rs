//! Turn a template plus one row into a finished project folder.

use std::path::{Path, PathBuf};

use crate::error::{PbipError, Result};
use crate::fsutil;
use crate::model::{self, ModelFormat, UpdateOutcome};
use crate::project::ProjectDir;
use crate::rename;
use crate::report::Reporter;
use crate::rows::RowRecord;

/// What happened while materializing one row.
#[derive(Debug)]
pub struct RowReport {
    pub identifier: String,
    pub project_dir: PathBuf,
    pub format: ModelFormat,
    pub updates: UpdateOutcome,
    pub cache_removed: bool,
}

/// The row's target identifier, checked to be a plain folder name.
pub fn target_identifier(row: &RowRecord) -> Result<String> {
    let identifier = row.target_identifier();
    validate_identifier(&identifier)?;
    Ok(identifier)
}

pub fn validate_identifier(identifier: &str) -> Result<()> {
    let invalid = |reason: &str| PbipError::InvalidIdentifier {
        identifier: identifier.to_string(),
        reason: reason.to_string(),
    };

    if identifier.trim().is_empty() {
        return Err(invalid("it is empty"));
    }
    if identifier.contains(['/', '\\']) {
        return Err(invalid("it contains a path separator"));
    }
    if identifier == "." || identifier == ".." {
        return Err(invalid("it names the current or parent folder"));
    }
    if identifier.contains('\0') {
        return Err(invalid("it contains a NUL byte"));
    }
    Ok(())
}

/// Copy `template` to `output_dir/<target>`, rename its artifacts and rewrite
/// the semantic model's parameters from `row`.
///
/// Only the copy and the parameter rewrite can fail the row. Rename and cache
/// cleanup problems are reported as warnings.
pub fn materialize_row(
    template: &Path,
    row: &RowRecord,
    output_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<RowReport> {
    let identifier = target_identifier(row)?;
    let template_id = template_identifier(template);

    let project = copy_template(template, output_dir, &identifier, template_id.as_deref())?;
    let project = rename_stage(project, template_id.as_deref(), &identifier, reporter)?;

    let model_dir = project.model_dir();
    let format = model::detect(&model_dir);
    tracing::debug!(identifier = %identifier, %format, "detected model format");
    let updates = model::apply_updates(format, &model_dir, row, reporter)?;

    let cache_removed = remove_cache(&project, reporter);

    Ok(RowReport {
        identifier,
        project_dir: project.root().to_path_buf(),
        format,
        updates,
        cache_removed,
    })
}

/// The template's directory name, if its descriptor is named after it.
///
/// Otherwise the renamer derives the identifier from the copy.
fn template_identifier(template: &Path) -> Option<String> {
    ProjectDir::from_template(template)
        .filter(|project| project.descriptor().is_file())
        .map(|project| project.identifier().to_string())
}

fn copy_template(
    template: &Path,
    output_dir: &Path,
    identifier: &str,
    template_id: Option<&str>,
) -> Result<ProjectDir> {
    let dest = output_dir.join(identifier);
    let copied = fsutil::copy_dir_replacing(template, &dest)?;
    tracing::info!(target_dir = %dest.display(), files = copied, "copied template");

    Ok(ProjectDir::new(dest, template_id.unwrap_or(identifier)))
}

fn rename_stage(
    project: ProjectDir,
    template_id: Option<&str>,
    identifier: &str,
    reporter: &dyn Reporter,
) -> Result<ProjectDir> {
    let root = project.root().to_path_buf();

    match rename::rename_artifacts(project, template_id, identifier, reporter) {
        Ok((project, outcome)) => {
            tracing::debug!(
                renamed = outcome.renamed.len(),
                rewritten = outcome.files_rewritten.len(),
                dropped = outcome.artifacts_dropped,
                "renamed artifacts"
            );
            Ok(project)
        }
        Err(e) if e.is_row_scoped() => {
            reporter.warn(&format!(
                "Failed to rename artifacts in {}: {e}",
                root.display()
            ));
            Ok(ProjectDir::new(root, identifier))
        }
        Err(e) => Err(e),
    }
}

fn remove_cache(project: &ProjectDir, reporter: &dyn Reporter) -> bool {
    let cache = project.cache_file();
    if !cache.exists() {
        reporter.warn(&format!("Cache file not found: {}", cache.display()));
        return false;
    }

    match std::fs::remove_file(&cache) {
        Ok(()) => {
            reporter.info(&format!("Deleted cache file {}", cache.display()));
            true
        }
        Err(e) => {
            reporter.warn(&format!("Failed to delete {}: {e}", cache.display()));
            false
        }
    }
}
