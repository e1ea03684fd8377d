//! Parameters stored as `model.expressions` in a single `model.bim` document.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use super::{ParameterChange, UpdateOutcome, MODEL_BIM};
use crate::error::Result;
use crate::fsutil;
use crate::report::Reporter;
use crate::rows::RowRecord;

const PARAMETER_META: &str =
    r#"meta [IsParameterQuery=true, Type="Any", IsParameterQueryRequired=true]"#;

/// `"<value>" meta [...]`. The value is written verbatim; embedded quotes are not escaped.
pub fn encode_literal(value: &str) -> String {
    format!("\"{value}\" {PARAMETER_META}")
}

/// The first double-quoted substring of an expression.
pub fn literal_value(expression: &str) -> Option<&str> {
    let start = expression.find('"')? + 1;
    let len = expression[start..].find('"')?;
    Some(&expression[start..start + len])
}

/// Expressions are either one string or an array of lines.
fn expression_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(lines) => Some(
            lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        _ => None,
    }
}

pub fn list_parameters(model_dir: &Path) -> Result<BTreeMap<String, String>> {
    let doc = fsutil::read_json(&model_dir.join(MODEL_BIM))?;

    let mut params = BTreeMap::new();
    let expressions = doc
        .pointer("/model/expressions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for expression in expressions {
        let Some(name) = expression.get("name").and_then(Value::as_str) else {
            continue;
        };
        let Some(text) = expression.get("expression").and_then(expression_text) else {
            continue;
        };
        if let Some(value) = literal_value(&text) {
            params.insert(name.to_string(), value.to_string());
        }
    }

    Ok(params)
}

pub fn apply_updates(
    model_dir: &Path,
    row: &RowRecord,
    reporter: &dyn Reporter,
) -> Result<UpdateOutcome> {
    let path = model_dir.join(MODEL_BIM);
    let mut doc = fsutil::read_json(&path)?;
    let mut outcome = UpdateOutcome::default();

    if let Some(expressions) = doc
        .pointer_mut("/model/expressions")
        .and_then(Value::as_array_mut)
    {
        for expression in expressions.iter_mut() {
            let Some(name) = expression.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some(new_value) = row.get(name) else {
                continue;
            };
            let name = name.to_string();

            if let Some(fields) = expression.as_object_mut() {
                fields.insert(
                    "expression".to_string(),
                    Value::String(encode_literal(new_value)),
                );
            }

            reporter.info(&format!("Updated parameter '{name}' to '{new_value}'"));
            outcome.updated.push(ParameterChange {
                name,
                value: new_value.to_string(),
            });
        }
    }

    if outcome.is_noop() {
        reporter.warn(&format!("No parameters were updated in {}", path.display()));
        return Ok(outcome);
    }

    fsutil::write_json(&path, &doc)?;
    outcome.files_changed.push(path);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PbipError;
    use crate::report::{Level, MemoryReporter};
    use rstest::rstest;
    use std::fs;

    const MODEL: &str = r#"{
  "name": "SemanticModel",
  "compatibilityLevel": 1567,
  "model": {
    "culture": "en-US",
    "expressions": [
      {
        "name": "Name",
        "kind": "m",
        "expression": "\"Name A\" meta [IsParameterQuery=true, Type=\"Any\", IsParameterQueryRequired=true]"
      },
      {
        "name": "Owner",
        "kind": "m",
        "expression": [
          "\"Owner A\" meta [IsParameterQuery=true, Type=\"Any\", IsParameterQueryRequired=true]"
        ]
      },
      {
        "name": "Helper",
        "kind": "m",
        "expression": "let x = 1 in x"
      }
    ]
  }
}"#;

    fn model_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MODEL_BIM), MODEL).unwrap();
        dir
    }

    #[rstest]
    #[case(r#""Name A" meta [IsParameterQuery=true]"#, Some("Name A"))]
    #[case(r#""" meta [IsParameterQuery=true]"#, Some(""))]
    #[case("let x = 1 in x", None)]
    #[case(r#"unterminated "value"#, None)]
    fn test_literal_value(#[case] expression: &str, #[case] expected: Option<&str>) {
        assert_eq!(literal_value(expression), expected);
    }

    #[test]
    fn lists_string_and_array_expressions() {
        let dir = model_dir();
        let params = list_parameters(dir.path()).unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(params["Name"], "Name A");
        assert_eq!(params["Owner"], "Owner A");
    }

    #[test]
    fn updates_matching_expressions_only() {
        let dir = model_dir();
        let row = RowRecord::from_pairs([
            ("Report_Name", "Test_Report"),
            ("Name", "Test_Report"),
            ("Owner", "Test_Team"),
        ]);
        let reporter = MemoryReporter::new();

        let outcome = apply_updates(dir.path(), &row, &reporter).unwrap();

        assert_eq!(outcome.updated.len(), 2);
        let params = list_parameters(dir.path()).unwrap();
        assert_eq!(params["Name"], "Test_Report");
        assert_eq!(params["Owner"], "Test_Team");

        let doc: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MODEL_BIM)).unwrap())
                .unwrap();
        assert_eq!(
            doc["model"]["expressions"][0]["expression"],
            encode_literal("Test_Report")
        );
        assert_eq!(doc["model"]["expressions"][2]["expression"], "let x = 1 in x");
        assert_eq!(doc["compatibilityLevel"], 1567);
    }

    #[test]
    fn preserves_key_order() {
        let dir = model_dir();
        let row = RowRecord::from_pairs([("Name", "B")]);
        apply_updates(dir.path(), &row, &MemoryReporter::new()).unwrap();

        let written = fs::read_to_string(dir.path().join(MODEL_BIM)).unwrap();
        let name_pos = written.find("\"name\": \"SemanticModel\"").unwrap();
        let model_pos = written.find("\"model\"").unwrap();
        assert!(name_pos < model_pos);
    }

    #[test]
    fn no_match_is_a_warning_and_leaves_file_untouched() {
        let dir = model_dir();
        let row = RowRecord::from_pairs([("Region", "North")]);
        let reporter = MemoryReporter::new();

        let outcome = apply_updates(dir.path(), &row, &reporter).unwrap();

        assert!(outcome.is_noop());
        assert!(outcome.files_changed.is_empty());
        assert_eq!(reporter.at(Level::Warn).len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join(MODEL_BIM)).unwrap(),
            MODEL
        );
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MODEL_BIM), "{ \"model\": ").unwrap();
        let row = RowRecord::from_pairs([("Name", "x")]);

        let err = apply_updates(dir.path(), &row, &MemoryReporter::new()).unwrap_err();
        assert!(matches!(err, PbipError::ModelParse { .. }));
        assert!(matches!(
            list_parameters(dir.path()).unwrap_err(),
            PbipError::ModelParse { .. }
        ));
    }
}
