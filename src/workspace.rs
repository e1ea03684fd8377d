//! Conventional folder layout for keeping templates, configs and data together.
//!
//! ```text
//! <root>/
//!   templates/  one PBIP project folder per template
//!   configs/    *.yaml / *.yml
//!   data/       *.csv
//!   outputs/    <Template>_OUTPUTS/ per template
//! ```

use std::path::{Path, PathBuf};

use crate::error::{PbipError, Result};
use crate::fsutil::io_error;
use crate::project::{MODEL_SUFFIX, PROJECT_EXTENSION, REPORT_SUFFIX};

pub const TEMPLATES_DIR: &str = "templates";
pub const CONFIGS_DIR: &str = "configs";
pub const DATA_DIR: &str = "data";
pub const OUTPUTS_DIR: &str = "outputs";

const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml"];
const DATA_EXTENSIONS: &[&str] = &["csv"];

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.root.join(CONFIGS_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join(OUTPUTS_DIR)
    }

    /// Create any of the four folders that are missing.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.templates_dir(),
            self.configs_dir(),
            self.data_dir(),
            self.outputs_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .map_err(io_error(format!("creating {}", dir.display())))?;
        }
        Ok(())
    }

    /// Folders under `templates/` that look like PBIP projects, sorted by name.
    pub fn templates(&self) -> Result<Vec<PathBuf>> {
        Ok(list_entries(&self.templates_dir())?
            .into_iter()
            .filter(|path| is_template_dir(path))
            .collect())
    }

    pub fn configs(&self) -> Result<Vec<PathBuf>> {
        files_with_extension(&self.configs_dir(), CONFIG_EXTENSIONS)
    }

    pub fn data_files(&self) -> Result<Vec<PathBuf>> {
        files_with_extension(&self.data_dir(), DATA_EXTENSIONS)
    }

    /// A path that exists is used as is; otherwise the name is looked up
    /// under `templates/`.
    pub fn resolve_template(&self, name_or_path: &str) -> Result<PathBuf> {
        let direct = PathBuf::from(name_or_path);
        if direct.exists() {
            return Ok(direct);
        }

        let named = self.templates_dir().join(name_or_path);
        if named.is_dir() {
            return Ok(named);
        }

        Err(PbipError::TemplateNotFound { path: direct })
    }

    /// `outputs/<Template>_OUTPUTS`.
    pub fn default_output_dir(&self, template_id: &str) -> PathBuf {
        self.outputs_dir().join(format!("{template_id}_OUTPUTS"))
    }
}

/// Whether `path` holds a `.pbip` file, a `.Report` folder and a
/// `.SemanticModel` folder.
pub fn is_template_dir(path: &Path) -> bool {
    let Ok(entries) = list_entries(path) else {
        return false;
    };

    let mut descriptor = false;
    let mut report = false;
    let mut model = false;
    for entry in &entries {
        let Some(name) = entry.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if entry.is_dir() {
            report |= name.ends_with(REPORT_SUFFIX);
            model |= name.ends_with(MODEL_SUFFIX);
        } else if entry.extension().is_some_and(|ext| ext == PROJECT_EXTENSION) {
            descriptor = true;
        }
    }
    descriptor && report && model
}

/// Sorted entries of `dir`; a missing directory is empty.
fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_error(format!("listing {}", dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    Ok(entries)
}

fn files_with_extension(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect())
}
