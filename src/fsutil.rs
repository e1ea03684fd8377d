use std::io::Write;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{PbipError, Result};

pub(crate) fn io_error(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> PbipError {
    let context = context.into();
    move |source| PbipError::Io { context, source }
}

pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(io_error(format!("reading {}", path.display())))
}

/// Parse a JSON document, tolerating a leading UTF-8 byte-order mark.
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = read_to_string(path)?;
    parse_json(&content).map_err(|source| PbipError::ModelParse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn parse_json(content: &str) -> serde_json::Result<serde_json::Value> {
    serde_json::from_str(content.strip_prefix('\u{feff}').unwrap_or(content))
}

/// Serialize with two-space indentation and write atomically.
pub fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| PbipError::ModelParse {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, json.as_bytes())
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// A crash mid-write leaves either the old file or the new one, never a mix.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(io_error(format!("creating temp file in {}", dir.display())))?;
    tmp.write_all(contents)
        .map_err(io_error(format!("writing {}", path.display())))?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(io_error(format!("setting permissions on {}", path.display())))?;
    }
    tmp.persist(path).map_err(|e| PbipError::Io {
        context: format!("replacing {}", path.display()),
        source: e.error,
    })?;

    tracing::debug!(path = %path.display(), "rewrote file");
    Ok(())
}

/// Recursively copy `src` to `dest`, replacing `dest` if it already exists.
///
/// On failure the partial copy is removed.
pub fn copy_dir_replacing(src: &Path, dest: &Path) -> Result<usize> {
    if dest.is_dir() {
        std::fs::remove_dir_all(dest)
            .map_err(io_error(format!("removing existing {}", dest.display())))?;
    }

    std::fs::create_dir_all(dest).map_err(io_error(format!("creating {}", dest.display())))?;

    match copy_tree(src, dest) {
        Ok(copied) => {
            tracing::debug!(
                from = %src.display(),
                to = %dest.display(),
                files = copied,
                "copied tree"
            );
            Ok(copied)
        }
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_dir_all(dest) {
                tracing::debug!(
                    path = %dest.display(),
                    error = %cleanup,
                    "could not remove partial copy"
                );
            }
            Err(e)
        }
    }
}

fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| PbipError::Io {
            context: format!("walking {}", src.display()),
            source: e.into(),
        })?;

        let rel = entry.path().strip_prefix(src).map_err(|_| PbipError::Internal {
            message: format!("{} is not under {}", entry.path().display(), src.display()),
        })?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(io_error(format!("creating {}", target.display())))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(io_error(format!(
                "copying {} to {}",
                entry.path().display(),
                target.display()
            )))?;
            copied += 1;
        }
    }
    Ok(copied)
}
