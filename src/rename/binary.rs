use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{PbipError, Result};

/// Extensions that are never rewritten, whatever their content looks like.
const BINARY_PATTERNS: &[&str] = &[
    "*.abf", "*.pbix", "*.pbit", "*.png", "*.jpg", "*.jpeg", "*.gif", "*.bmp", "*.ico", "*.tif",
    "*.tiff", "*.webp", "*.zip", "*.gz", "*.7z", "*.dll", "*.exe", "*.pdf", "*.woff", "*.woff2",
    "*.ttf", "*.otf", "*.xlsx", "*.xls", "*.parquet",
];

pub fn binary_extension_set() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in BINARY_PATTERNS {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| PbipError::GlobPattern {
                pattern: (*pattern).to_string(),
                source: e,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| PbipError::GlobPattern {
        pattern: "<binary extensions>".into(),
        source: e,
    })
}

/// Sniff the first 8KB; files with unknown extensions can still be binary.
pub fn is_binary_file(path: &Path) -> bool {
    use std::io::Read;

    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };

    let mut buf = Vec::with_capacity(8192);
    if file.take(8192).read_to_end(&mut buf).is_err() {
        return false;
    }

    content_inspector::inspect(&buf).is_binary()
}
