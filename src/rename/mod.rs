pub mod binary;

use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::Result;
use crate::fsutil::{self, io_error};
use crate::project::{
    ProjectDir, ARTIFACT_SUFFIXES, PLATFORM_FILE, PROJECT_EXTENSION, REPORT_SUFFIX,
};
use crate::report::Reporter;

pub use binary::{binary_extension_set, is_binary_file};

/// What a rename pass did to a generated copy.
#[derive(Debug, Default)]
pub struct RenameOutcome {
    pub template_id: Option<String>,
    pub renamed: Vec<(PathBuf, PathBuf)>,
    pub files_rewritten: Vec<PathBuf>,
    pub artifacts_dropped: usize,
}

/// Find the identifier a copied template was created with, from its
/// `<T>.Report` folder or, failing that, its `<T>.pbip` descriptor.
pub fn derive_template_id(root: &Path) -> Result<Option<String>> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .map_err(io_error(format!("listing {}", root.display())))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    let descriptor_suffix = format!(".{PROJECT_EXTENSION}");
    for suffix in [REPORT_SUFFIX, descriptor_suffix.as_str()] {
        if let Some(id) = names
            .iter()
            .find_map(|name| name.strip_suffix(suffix).filter(|id| !id.is_empty()))
        {
            return Ok(Some(id.to_string()));
        }
    }
    Ok(None)
}

/// Rename a freshly copied template's artifacts from `template_id` to
/// `target_id` and rewrite every textual reference to the old identifier.
///
/// When `template_id` is `None` it is derived from the copy's contents.
pub fn rename_artifacts(
    project: ProjectDir,
    template_id: Option<&str>,
    target_id: &str,
    reporter: &dyn Reporter,
) -> Result<(ProjectDir, RenameOutcome)> {
    let root = project.root().to_path_buf();
    let mut outcome = RenameOutcome::default();

    let template_id = match template_id {
        Some(id) => id.to_string(),
        None => match derive_template_id(&root)? {
            Some(id) => id,
            None => {
                reporter.warn(&format!(
                    "Could not determine the template name inside {}; nothing renamed",
                    root.display()
                ));
                return Ok((project.renamed(target_id), outcome));
            }
        },
    };
    outcome.template_id = Some(template_id.clone());

    let old_id = (template_id != target_id).then_some(template_id.as_str());
    if let Some(old_id) = old_id {
        for suffix in ARTIFACT_SUFFIXES {
            let from = root.join(format!("{old_id}{suffix}"));
            let to = root.join(format!("{target_id}{suffix}"));
            if !from.exists() {
                tracing::debug!(path = %from.display(), "artifact not present, skipping rename");
                continue;
            }
            std::fs::rename(&from, &to).map_err(io_error(format!(
                "renaming {} to {}",
                from.display(),
                to.display()
            )))?;
            outcome.renamed.push((from, to));
        }
    }

    // `.platform` display names are set even when the identifier is unchanged.
    rewrite_references(&root, old_id, target_id, reporter, &mut outcome)?;

    let project = project.renamed(target_id);
    outcome.artifacts_dropped = keep_report_artifacts(&project.descriptor())?;

    Ok((project, outcome))
}

/// With `old` unset only `.platform` display names are rewritten.
fn rewrite_references(
    root: &Path,
    old: Option<&str>,
    new: &str,
    reporter: &dyn Reporter,
    outcome: &mut RenameOutcome,
) -> Result<()> {
    let binary_set = binary_extension_set()?;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                reporter.warn(&format!("Failed to walk {}: {e}", root.display()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        let is_platform = entry.file_name() == PLATFORM_FILE;
        if old.is_none() && !is_platform {
            continue;
        }
        if binary_set.is_match(entry.file_name()) || is_binary_file(path) {
            continue;
        }

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                reporter.warn(&format!(
                    "Failed to update references in {}: {e}",
                    path.display()
                ));
                continue;
            }
        };
        let Ok(content) = String::from_utf8(bytes) else {
            tracing::debug!(path = %path.display(), "not UTF-8, leaving untouched");
            continue;
        };

        let replace = |content: &str| old.and_then(|old| replace_identifier(content, old, new));
        let rewritten = if is_platform {
            rewrite_display_name(&content, new).or_else(|| replace(&content))
        } else {
            replace(&content)
        };

        if let Some(rewritten) = rewritten {
            if let Err(e) = fsutil::write_atomic(path, rewritten.as_bytes()) {
                reporter.warn(&format!("Failed to update references in {}: {e}", path.display()));
                continue;
            }
            outcome.files_rewritten.push(path.to_path_buf());
        }
    }

    Ok(())
}

/// Plain substring replacement; `None` when nothing changes.
fn replace_identifier(content: &str, old: &str, new: &str) -> Option<String> {
    if old.is_empty() || !content.contains(old) {
        return None;
    }
    let replaced = content.replace(old, new);
    (replaced != content).then_some(replaced)
}

/// Set `metadata.displayName` of a `.platform` document to `display_name`.
///
/// `None` if the document is not JSON, has no display name, or already
/// carries `display_name`.
fn rewrite_display_name(content: &str, display_name: &str) -> Option<String> {
    let mut doc = fsutil::parse_json(content).ok()?;
    let field = doc.pointer_mut("/metadata/displayName")?;
    if field.as_str() == Some(display_name) {
        return None;
    }
    *field = Value::String(display_name.to_string());
    serde_json::to_string_pretty(&doc).ok()
}

/// Generated projects are report-only: drop every non-report entry from the
/// descriptor's `artifacts` list. Returns how many entries were dropped.
pub fn keep_report_artifacts(descriptor: &Path) -> Result<usize> {
    if !descriptor.is_file() {
        return Ok(0);
    }

    let mut doc = fsutil::read_json(descriptor)?;
    let Some(artifacts) = doc.get_mut("artifacts").and_then(Value::as_array_mut) else {
        return Ok(0);
    };

    let before = artifacts.len();
    artifacts.retain(|artifact| artifact.get("report").is_some());
    let dropped = before - artifacts.len();

    if dropped > 0 {
        fsutil::write_json(descriptor, &doc)?;
    }
    Ok(dropped)
}
