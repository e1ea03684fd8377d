use std::path::Path;

use crate::error::{PbipError, Result};

pub const REPORT_NAME_FIELD: &str = "Report_Name";
pub const NAME_FIELD: &str = "Name";
pub const OWNER_FIELD: &str = "Owner";

/// One line of tabular input: field name to value, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    fields: Vec<(String, String)>,
}

impl RowRecord {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Output folder / report identifier for this row.
    ///
    /// `Report_Name` wins; otherwise `Name_Owner`, with `Unknown` standing in
    /// for either part when absent.
    pub fn target_identifier(&self) -> String {
        if let Some(name) = self.get(REPORT_NAME_FIELD) {
            return name.to_string();
        }
        let name = self.get(NAME_FIELD).unwrap_or("Unknown");
        let owner = self.get(OWNER_FIELD).unwrap_or("Unknown");
        format!("{name}_{owner}")
    }
}

/// Strip byte-order marks (raw or mis-decoded) and surrounding whitespace.
pub fn clean_column_name(name: &str) -> String {
    name.replace('\u{feff}', "")
        .replace("ï»¿", "")
        .trim()
        .to_string()
}

/// Load every row of a CSV file.
///
/// Every row is keyed from the header, so a row whose field count differs from
/// the header's fails the whole load without returning any rows.
pub fn load_rows(path: &Path) -> Result<Vec<RowRecord>> {
    if !path.is_file() {
        return Err(PbipError::DataNotFound {
            path: path.to_path_buf(),
        });
    }

    let csv_error = |source| PbipError::CsvParse {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(clean_column_name)
        .collect();

    let mut rows = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let row_number = i + 1;

        if record.len() != headers.len() {
            return Err(PbipError::RowSchemaMismatch {
                row: row_number,
                expected: headers.join(", "),
            });
        }

        let row = RowRecord::from_pairs(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string)),
        );

        rows.push(row);
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded rows");
    Ok(rows)
}

/// Column names of a CSV file, cleaned the same way as row keys.
pub fn load_header(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(PbipError::DataNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path).map_err(|source| PbipError::CsvParse {
        path: path.to_path_buf(),
        source,
    })?;
    let headers = reader.headers().map_err(|source| PbipError::CsvParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(headers.iter().map(clean_column_name).collect())
}
