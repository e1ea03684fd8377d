//! Parameters stored as parameter-query tables in a TMDL `definition/` folder.
//!
//! A parameter table looks like:
//!
//! ```text
//! table Contract_Name
//!     partition Contract_Name = m
//!         mode: import
//!         source = "ATCO_WA" meta [IsParameterQuery=true, Type="Text", IsParameterQueryRequired=true]
//! ```
//!
//! Its identity is the declared table name, not the file name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;
use walkdir::WalkDir;

use super::{ParameterChange, UpdateOutcome, DEFINITION_DIR};
use crate::error::{PbipError, Result};
use crate::fsutil::{self, io_error};
use crate::report::Reporter;
use crate::rows::RowRecord;

pub const TABLES_DIR: &str = "tables";
const TMDL_EXTENSION: &str = "tmdl";

fn table_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*table[ \t]+(?:'((?:[^']|'')+)'|([^\s]+))").expect("valid regex")
    })
}

fn parameter_source_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)partition[ \t]+(?:'(?:[^']|'')+'|[^\s=]+)[ \t]*=[ \t]*m\b.*?source[ \t]*=[ \t]*"([^"]*)"[ \t]*meta[ \t]*\[[ \t]*IsParameterQuery[ \t]*=[ \t]*true[^\]]*\]"#,
        )
        .expect("valid regex")
    })
}

/// Declared name from the leading `table <Name>` line; quoted names are unescaped.
pub fn table_name(content: &str) -> Option<String> {
    let caps = table_name_re().captures(content)?;
    if let Some(quoted) = caps.get(1) {
        return Some(quoted.as_str().replace("''", "'"));
    }
    caps.get(2).map(|m| m.as_str().to_string())
}

/// Literal `source` value of the table's parameter partition, if it has one.
pub fn parameter_value(content: &str) -> Option<&str> {
    parameter_source_re()
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A table file that declares a parameter query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterTable {
    pub name: String,
    pub value: String,
    pub path: PathBuf,
}

fn tables_dir(model_dir: &Path) -> PathBuf {
    model_dir.join(DEFINITION_DIR).join(TABLES_DIR)
}

fn is_tmdl(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TMDL_EXTENSION)
}

/// Every parameter table under `definition/tables`, in file name order.
pub fn parameter_tables(model_dir: &Path) -> Result<Vec<ParameterTable>> {
    let dir = tables_dir(model_dir);
    if !dir.is_dir() {
        tracing::debug!(path = %dir.display(), "no tables folder");
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(io_error(format!("listing {}", dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_tmdl(path))
        .collect();
    files.sort();

    let mut tables = Vec::new();
    for path in files {
        let content = fsutil::read_to_string(&path)?;
        let Some(value) = parameter_value(&content) else {
            continue;
        };
        let Some(name) = table_name(&content) else {
            tracing::debug!(path = %path.display(), "parameter partition without table name");
            continue;
        };
        tracing::debug!(table = %name, value, "found parameter table");
        tables.push(ParameterTable {
            name,
            value: value.to_string(),
            path,
        });
    }

    Ok(tables)
}

pub fn list_parameters(model_dir: &Path) -> Result<BTreeMap<String, String>> {
    Ok(parameter_tables(model_dir)?
        .into_iter()
        .map(|table| (table.name, table.value))
        .collect())
}

/// Update each parameter named in the row.
///
/// The old literal is replaced in *every* `.tmdl` file of the model, so echoes
/// of the default value elsewhere (annotations, comments, other tables) follow
/// the parameter. Unrelated text that happens to equal the old value changes too.
pub fn apply_updates(
    model_dir: &Path,
    row: &RowRecord,
    reporter: &dyn Reporter,
) -> Result<UpdateOutcome> {
    let mut outcome = UpdateOutcome::default();

    for (name, new_value) in row.iter() {
        // Re-scan each time: an earlier replacement may have touched this table.
        let tables = parameter_tables(model_dir)?;
        let Some(table) = tables.into_iter().find(|t| t.name == name) else {
            tracing::debug!(key = name, "no parameter table for column");
            continue;
        };

        if table.value == new_value {
            reporter.info(&format!(
                "Parameter '{name}' already set to '{new_value}'"
            ));
            outcome.unchanged.push(name.to_string());
            continue;
        }

        let changed = if table.value.is_empty() {
            rewrite_source_literal(&table.path, new_value)?;
            vec![table.path.clone()]
        } else {
            replace_everywhere(model_dir, &table.value, new_value)?
        };

        reporter.info(&format!(
            "Updated parameter '{name}' from '{}' to '{new_value}' ({} file(s))",
            table.value,
            changed.len()
        ));
        outcome.updated.push(ParameterChange {
            name: name.to_string(),
            value: new_value.to_string(),
        });
        for path in changed {
            if !outcome.files_changed.contains(&path) {
                outcome.files_changed.push(path);
            }
        }
    }

    if outcome.is_noop() && outcome.unchanged.is_empty() {
        reporter.warn(&format!(
            "No parameters were updated in {}",
            model_dir.join(DEFINITION_DIR).display()
        ));
    }

    Ok(outcome)
}

/// Replace `old` with `new` in every `.tmdl` file under `model_dir`.
fn replace_everywhere(model_dir: &Path, old: &str, new: &str) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();

    for entry in WalkDir::new(model_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| PbipError::Io {
            context: format!("walking {}", model_dir.display()),
            source: e.into(),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_tmdl(path) {
            continue;
        }

        let content = fsutil::read_to_string(path)?;
        if !content.contains(old) {
            continue;
        }
        fsutil::write_atomic(path, content.replace(old, new).as_bytes())?;
        changed.push(path.to_path_buf());
    }

    Ok(changed)
}

/// Rewrite only the `source = "..."` literal of one table file.
fn rewrite_source_literal(path: &Path, new_value: &str) -> Result<()> {
    let content = fsutil::read_to_string(path)?;
    let Some(range) = parameter_source_re()
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.range())
    else {
        return Err(PbipError::Internal {
            message: format!("parameter source vanished from {}", path.display()),
        });
    };

    let mut updated = String::with_capacity(content.len() + new_value.len());
    updated.push_str(&content[..range.start]);
    updated.push_str(new_value);
    updated.push_str(&content[range.end..]);
    fsutil::write_atomic(path, updated.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MODEL_TMDL;
    use crate::report::{Level, MemoryReporter};
    use rstest::rstest;
    use std::fs;

    const CONTRACT_TABLE: &str = "table Contract_Name
\tlineageTag: a251da0c-f23e-4a35-892f-cdf1db97dc56

\tcolumn Contract_Name
\t\tdataType: string
\t\tlineageTag: 371fd31e-afc5-439b-b2c1-22d461084e30
\t\tsummarizeBy: none
\t\tsourceColumn: Contract_Name

\t\tannotation SummarizationSetBy = Automatic

\tpartition Contract_Name = m
\t\tmode: import
\t\tsource = \"ATCO_WA\" meta [IsParameterQuery=true, Type=\"Text\", IsParameterQueryRequired=true]

\tannotation PBI_NavigationStepName = Navigation

\tannotation PBI_ResultType = Text
";

    const REGULAR_TABLE: &str = "table Regular_Table
\tlineageTag: test-123

\tcolumn TestColumn
\t\tdataType: string
\t\tsourceColumn: TestColumn

\tpartition Regular_Table = m
\t\tmode: import
\t\tsource = \"SELECT * FROM test_table\"
";

    fn param_table(name: &str, value: &str) -> String {
        format!(
            "table {name}\n\tpartition {name} = m\n\t\tmode: import\n\t\tsource = \"{value}\" meta [IsParameterQuery=true, Type=\"Text\", IsParameterQueryRequired=true]\n"
        )
    }

    fn model_with(tables: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let definition = dir.path().join(DEFINITION_DIR);
        fs::create_dir_all(definition.join(TABLES_DIR)).unwrap();
        fs::write(definition.join(MODEL_TMDL), "model Model\n\tculture: en-US\n").unwrap();
        for (file, content) in tables {
            fs::write(definition.join(TABLES_DIR).join(file), content).unwrap();
        }
        dir
    }

    fn read_table(dir: &tempfile::TempDir, file: &str) -> String {
        fs::read_to_string(dir.path().join(DEFINITION_DIR).join(TABLES_DIR).join(file)).unwrap()
    }

    #[rstest]
    #[case("table Contract_Name\n\tlineageTag: x\n", Some("Contract_Name"))]
    #[case("table 'Contract Name'\n", Some("Contract Name"))]
    #[case("table 'O''Brien'\n", Some("O'Brien"))]
    #[case("/// doc\ntable Sales\r\n", Some("Sales"))]
    #[case("model Model\n", None)]
    fn test_table_name(#[case] content: &str, #[case] expected: Option<&str>) {
        assert_eq!(table_name(content).as_deref(), expected);
    }

    #[test]
    fn parameter_value_requires_parameter_query_meta() {
        assert_eq!(parameter_value(CONTRACT_TABLE), Some("ATCO_WA"));
        assert_eq!(parameter_value(REGULAR_TABLE), None);
    }

    #[test]
    fn finds_only_parameter_tables() {
        let dir = model_with(&[
            ("Contract_Name.tmdl", CONTRACT_TABLE),
            ("Regular_Table.tmdl", REGULAR_TABLE),
        ]);

        let tables = parameter_tables(dir.path()).unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Contract_Name");
        assert_eq!(tables[0].value, "ATCO_WA");
    }

    #[test]
    fn identity_is_declared_name_not_file_name() {
        let dir = model_with(&[("renamed_file.tmdl", &param_table("Logo_url", "a.png"))]);
        let params = list_parameters(dir.path()).unwrap();
        assert_eq!(params.get("Logo_url").map(String::as_str), Some("a.png"));
    }

    #[test]
    fn lists_all_parameters() {
        let dir = model_with(&[
            ("Contract_Name.tmdl", CONTRACT_TABLE),
            (
                "Logo_url.tmdl",
                &param_table("Logo_url", "https://example.com/logo.png"),
            ),
        ]);

        let params = list_parameters(dir.path()).unwrap();

        assert_eq!(params["Contract_Name"], "ATCO_WA");
        assert_eq!(params["Logo_url"], "https://example.com/logo.png");
    }

    #[test]
    fn missing_tables_folder_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_parameters(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn updates_value_and_keeps_structure() {
        let dir = model_with(&[("Contract_Name.tmdl", CONTRACT_TABLE)]);
        let row = RowRecord::from_pairs([("Report_Name", "X"), ("Contract_Name", "NEW_CONTRACT")]);
        let reporter = MemoryReporter::new();

        let outcome = apply_updates(dir.path(), &row, &reporter).unwrap();

        assert_eq!(outcome.updated.len(), 1);
        let content = read_table(&dir, "Contract_Name.tmdl");
        assert!(content.contains("source = \"NEW_CONTRACT\" meta [IsParameterQuery=true"));
        assert!(!content.contains("ATCO_WA"));
        assert!(content.contains("annotation PBI_ResultType = Text"));
        assert_eq!(
            list_parameters(dir.path()).unwrap()["Contract_Name"],
            "NEW_CONTRACT"
        );
    }

    #[test]
    fn replacement_reaches_unrelated_files() {
        let unrelated = "table Notes\n\t/// default contract is ATCO_WA\n\tcolumn Note\n";
        let dir = model_with(&[
            ("Contract_Name.tmdl", CONTRACT_TABLE),
            ("Notes.tmdl", unrelated),
        ]);
        let row = RowRecord::from_pairs([("Contract_Name", "NEW")]);

        let outcome = apply_updates(dir.path(), &row, &MemoryReporter::new()).unwrap();

        assert_eq!(outcome.files_changed.len(), 2);
        assert!(read_table(&dir, "Notes.tmdl").contains("default contract is NEW"));
    }

    #[test]
    fn current_value_is_skipped() {
        let dir = model_with(&[("Contract_Name.tmdl", CONTRACT_TABLE)]);
        let row = RowRecord::from_pairs([("Contract_Name", "ATCO_WA")]);
        let reporter = MemoryReporter::new();

        let outcome = apply_updates(dir.path(), &row, &reporter).unwrap();

        assert!(outcome.files_changed.is_empty());
        assert_eq!(outcome.unchanged, vec!["Contract_Name"]);
        assert!(reporter.at(Level::Warn).is_empty());
        assert_eq!(read_table(&dir, "Contract_Name.tmdl"), CONTRACT_TABLE);
    }

    #[test]
    fn unknown_keys_are_not_errors() {
        let dir = model_with(&[("Contract_Name.tmdl", CONTRACT_TABLE)]);
        let row = RowRecord::from_pairs([("Region", "North")]);
        let reporter = MemoryReporter::new();

        let outcome = apply_updates(dir.path(), &row, &reporter).unwrap();

        assert!(outcome.is_noop());
        assert_eq!(reporter.at(Level::Warn).len(), 1);
    }

    #[test]
    fn empty_current_value_only_touches_owning_table() {
        let dir = model_with(&[
            ("Blank.tmdl", &param_table("Blank", "")),
            ("Other.tmdl", &param_table("Other", "keep")),
        ]);
        let row = RowRecord::from_pairs([("Blank", "filled")]);

        let outcome = apply_updates(dir.path(), &row, &MemoryReporter::new()).unwrap();

        assert_eq!(outcome.files_changed.len(), 1);
        let params = list_parameters(dir.path()).unwrap();
        assert_eq!(params["Blank"], "filled");
        assert_eq!(params["Other"], "keep");
        assert_eq!(read_table(&dir, "Other.tmdl"), param_table("Other", "keep"));
    }

    #[test]
    fn sequential_updates_see_earlier_changes() {
        let dir = model_with(&[
            ("First.tmdl", &param_table("First", "alpha")),
            ("Second.tmdl", &param_table("Second", "beta")),
        ]);
        let row = RowRecord::from_pairs([("First", "beta"), ("Second", "gamma")]);

        apply_updates(dir.path(), &row, &MemoryReporter::new()).unwrap();

        // First -> "beta" collides with Second's literal, so both follow to "gamma".
        let params = list_parameters(dir.path()).unwrap();
        assert_eq!(params["First"], "gamma");
        assert_eq!(params["Second"], "gamma");
    }
}
