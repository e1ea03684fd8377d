use std::path::{Path, PathBuf};

pub const PROJECT_EXTENSION: &str = "pbip";
pub const REPORT_SUFFIX: &str = ".Report";
pub const MODEL_SUFFIX: &str = ".SemanticModel";
pub const PLATFORM_FILE: &str = ".platform";
pub const CACHE_DIR: &str = ".pbi";
pub const CACHE_FILE: &str = "cache.abf";

/// Suffixes of the three top-level artifacts that carry the project identifier.
pub const ARTIFACT_SUFFIXES: [&str; 3] = [".pbip", REPORT_SUFFIX, MODEL_SUFFIX];

/// A PBIP project folder and the identifier its artifacts are named after.
///
/// Owned by one pipeline stage at a time; each stage takes it and hands it on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDir {
    root: PathBuf,
    identifier: String,
}

impl ProjectDir {
    pub fn new(root: impl Into<PathBuf>, identifier: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            identifier: identifier.into(),
        }
    }

    /// A template folder, whose identifier is its own directory name.
    pub fn from_template(root: &Path) -> Option<Self> {
        let identifier = root.file_name()?.to_str()?.to_string();
        Some(Self::new(root, identifier))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn descriptor(&self) -> PathBuf {
        self.root
            .join(format!("{}.{PROJECT_EXTENSION}", self.identifier))
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.join(format!("{}{REPORT_SUFFIX}", self.identifier))
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join(format!("{}{MODEL_SUFFIX}", self.identifier))
    }

    pub fn cache_file(&self) -> PathBuf {
        self.model_dir().join(CACHE_DIR).join(CACHE_FILE)
    }

    /// Same folder, now known under a different identifier.
    pub fn renamed(self, identifier: impl Into<String>) -> Self {
        Self {
            root: self.root,
            identifier: identifier.into(),
        }
    }
}
