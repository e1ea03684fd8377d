use std::error::Error as _;
use std::path::Path;

use crate::error::{PbipError, Result};
use crate::fsutil::io_error;
use crate::materialize::materialize_row;
use crate::report::Reporter;
use crate::rows::RowRecord;

/// A row that could not be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based position in the input.
    pub row: usize,
    pub identifier: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    /// Generated folder names, in input order.
    pub succeeded: Vec<String>,
    pub failures: Vec<RowFailure>,
}

impl BatchSummary {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Materialize every row in order, isolating per-row failures.
///
/// Errors that are not row-scoped stop the batch and are returned.
pub fn process_all(
    template: &Path,
    rows: &[RowRecord],
    output_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(output_dir)
        .map_err(io_error(format!("creating {}", output_dir.display())))?;

    let summary = run_rows(rows, reporter, |row| {
        materialize_row(template, row, output_dir, reporter).map(|report| report.identifier)
    })?;

    tracing::info!(
        total = summary.total,
        succeeded = summary.success_count(),
        failed = summary.failure_count(),
        "batch finished"
    );
    Ok(summary)
}

/// Drive `process_row` over every row; it returns the generated folder name.
fn run_rows<F>(
    rows: &[RowRecord],
    reporter: &dyn Reporter,
    mut process_row: F,
) -> Result<BatchSummary>
where
    F: FnMut(&RowRecord) -> Result<String>,
{
    let mut summary = BatchSummary {
        total: rows.len(),
        ..Default::default()
    };

    for (i, row) in rows.iter().enumerate() {
        let index = i + 1;
        let label = row.target_identifier();
        reporter.progress(index, rows.len(), &label);

        match process_row(row) {
            Ok(identifier) => {
                reporter.success(&format!("Generated {identifier}"));
                summary.succeeded.push(identifier);
            }
            Err(e) if e.is_row_scoped() => {
                let message = describe(&e);
                reporter.error(&format!("Failed to process row {index} ({label}): {message}"));
                summary.failures.push(RowFailure {
                    row: index,
                    identifier: label,
                    message,
                });
            }
            Err(e) => {
                reporter.finish();
                return Err(e);
            }
        }
    }

    reporter.finish();
    Ok(summary)
}

/// The error and its chain of causes on one line.
fn describe(err: &PbipError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Level, MemoryReporter};
    use std::fs;
    use std::path::PathBuf;

    fn template(root: &Path) -> PathBuf {
        let template = root.join("Example_PBIP");
        let model = template.join("Example_PBIP.SemanticModel");
        fs::create_dir_all(&model).unwrap();
        fs::create_dir_all(template.join("Example_PBIP.Report")).unwrap();
        fs::write(template.join("Example_PBIP.pbip"), r#"{"artifacts": []}"#).unwrap();
        fs::write(
            model.join("model.bim"),
            r#"{"model": {"expressions": [{"name": "Name", "expression": "\"A\" meta [IsParameterQuery=true]"}]}}"#,
        )
        .unwrap();
        template
    }

    fn row(name: &str) -> RowRecord {
        RowRecord::from_pairs([("Report_Name", name), ("Name", name)])
    }

    #[test]
    fn failing_row_does_not_stop_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let template = template(tmp.path());
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        // A plain file where row 2's folder must go.
        fs::write(out.join("Second"), "blocked").unwrap();
        let reporter = MemoryReporter::new();

        let summary = process_all(
            &template,
            &[row("First"), row("Second"), row("Third")],
            &out,
            &reporter,
        )
        .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.success_count(), 2);
        assert_eq!(summary.succeeded, vec!["First", "Third"]);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].row, 2);
        assert_eq!(summary.failures[0].identifier, "Second");
        assert_eq!(reporter.at(Level::Error).len(), 1);
        assert!(out.join("Third/Third.SemanticModel/model.bim").is_file());
    }

    #[test]
    fn creates_missing_output_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let template = template(tmp.path());
        let out = tmp.path().join("nested/out");

        let summary = process_all(&template, &[row("Only")], &out, &MemoryReporter::new()).unwrap();

        assert_eq!(summary.success_count(), 1);
        assert!(out.join("Only").is_dir());
    }

    #[test]
    fn empty_input_succeeds_with_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let template = template(tmp.path());

        let summary =
            process_all(&template, &[], &tmp.path().join("out"), &MemoryReporter::new()).unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_count(), 0);
    }

    #[test]
    fn internal_error_aborts_remaining_rows() {
        let rows = [row("First"), row("Second"), row("Third")];
        let reporter = MemoryReporter::new();
        let mut seen = Vec::new();

        let err = run_rows(&rows, &reporter, |row| {
            let id = row.target_identifier();
            seen.push(id.clone());
            if id == "Second" {
                return Err(PbipError::Internal {
                    message: "broken invariant".into(),
                });
            }
            Ok(id)
        })
        .unwrap_err();

        assert!(matches!(err, PbipError::Internal { .. }));
        assert_eq!(seen, vec!["First", "Second"]);
        assert!(reporter.at(Level::Error).is_empty());
    }

    #[test]
    fn row_scoped_error_is_recorded_and_skipped() {
        let rows = [row("First"), row("Second")];
        let reporter = MemoryReporter::new();

        let summary = run_rows(&rows, &reporter, |row| {
            let id = row.target_identifier();
            if id == "First" {
                return Err(PbipError::UnknownModelFormat {
                    path: PathBuf::from("First.SemanticModel"),
                });
            }
            Ok(id)
        })
        .unwrap();

        assert_eq!(summary.succeeded, vec!["Second"]);
        assert_eq!(summary.failures[0].row, 1);
        assert!(summary.failures[0].message.contains("Unknown semantic model format"));
    }

    #[test]
    fn describe_includes_causes() {
        let err = PbipError::Io {
            context: "copying x".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(describe(&err), "IO error: copying x: gone");
    }
}
