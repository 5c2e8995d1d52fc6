//! CSV ingestion for tabular classification experiments.
//!
//! Columns whose values all parse as numbers become numeric features (empty
//! cells become NaN and follow the trees' missing-value routing). Every other
//! column is factorized: each distinct string is assigned an integer code in
//! first-seen order. The target column is binarized against a configured
//! positive label.

use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;

use super::{DataError, Dataset};

/// Options for [`read_classification_csv`].
#[derive(Clone, Debug)]
pub struct CsvOptions {
    /// Whether the first row is a header.
    pub has_header: bool,
    /// Column names to use when the file has no header. Length must match
    /// the column count if provided.
    pub column_names: Option<Vec<String>>,
    /// Name of the target column. `None` means the last column.
    pub target_column: Option<String>,
    /// Target values equal to this string (after trimming) become label 1.
    pub positive_label: String,
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            column_names: None,
            target_column: None,
            positive_label: "1".to_string(),
            delimiter: b',',
        }
    }
}

/// Read a delimited table into a [`Dataset`].
///
/// See the module docs for the column typing rules.
pub fn read_classification_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Dataset, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path.as_ref())?;

    let header_names: Option<Vec<String>> = if options.has_header {
        Some(reader.headers()?.iter().map(str::to_string).collect())
    } else {
        None
    };

    let mut rows: Vec<csv::StringRecord> = Vec::new();
    for record in reader.records() {
        let record = record?;
        // Skip fully blank lines (common as trailing lines in published data).
        if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
            continue;
        }
        rows.push(record);
    }
    if rows.is_empty() {
        return Err(DataError::EmptyTable);
    }

    let n_cols = rows[0].len();
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(DataError::RaggedRow { line: i + 1, expected: n_cols, got: row.len() });
        }
    }

    let names: Vec<String> = match (&options.column_names, header_names) {
        (Some(names), _) => {
            if names.len() != n_cols {
                return Err(DataError::ColumnCount { expected: n_cols, got: names.len() });
            }
            names.clone()
        }
        (None, Some(names)) => names,
        (None, None) => (0..n_cols).map(|i| format!("c{i}")).collect(),
    };

    let target_idx = match &options.target_column {
        Some(name) => names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DataError::MissingColumn(name.clone()))?,
        None => n_cols - 1,
    };

    let n_samples = rows.len();
    let n_features = n_cols - 1;
    if n_features == 0 {
        return Err(DataError::EmptyTable);
    }

    let mut features = Array2::<f32>::zeros((n_features, n_samples));
    let mut feature_names = Vec::with_capacity(n_features);

    let mut out_idx = 0usize;
    for col in 0..n_cols {
        if col == target_idx {
            continue;
        }
        let values = column_values(&rows, col);
        encode_column(&values, features.row_mut(out_idx).into_slice().expect("row is contiguous"));
        feature_names.push(names[col].clone());
        out_idx += 1;
    }

    let labels: Vec<f32> = column_values(&rows, target_idx)
        .iter()
        .map(|v| if *v == options.positive_label { 1.0 } else { 0.0 })
        .collect();

    Dataset::from_columns(features, labels, feature_names)
}

fn column_values<'a>(rows: &'a [csv::StringRecord], col: usize) -> Vec<&'a str> {
    rows.iter().map(|r| r.get(col).unwrap_or("")).collect()
}

/// Fill `out` with a numeric parse of the column, or factorized codes if any
/// non-empty value fails to parse.
fn encode_column(values: &[&str], out: &mut [f32]) {
    let numeric = values.iter().all(|v| v.is_empty() || v.parse::<f32>().is_ok());

    if numeric {
        for (slot, v) in out.iter_mut().zip(values) {
            *slot = if v.is_empty() { f32::NAN } else { v.parse::<f32>().unwrap_or(f32::NAN) };
        }
    } else {
        let mut codes: HashMap<&str, f32> = HashMap::new();
        for (slot, &v) in out.iter_mut().zip(values) {
            let next = codes.len() as f32;
            *slot = *codes.entry(v).or_insert(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn factorize_codes_follow_first_seen_order() {
        let values = ["b", "a", "b", "c"];
        let mut out = [0.0f32; 4];
        encode_column(&values, &mut out);
        assert_eq!(out, [0.0, 1.0, 0.0, 2.0]);
    }

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn mixed_columns_with_header() {
        let path = write_temp(
            "treelin_csv_mixed.csv",
            "age,job,income\n39,clerk,>50K\n50,farmer,<=50K\n38,clerk,>50K\n",
        );
        let options = CsvOptions { positive_label: ">50K".into(), ..Default::default() };
        let ds = read_classification_csv(&path, &options).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.feature_names(), &["age".to_string(), "job".to_string()]);
        // Numeric column kept as-is.
        assert_eq!(ds.features().value(0, 1), 50.0);
        // Categorical column factorized in first-seen order: clerk=0, farmer=1.
        assert_eq!(ds.features().value(1, 0), 0.0);
        assert_eq!(ds.features().value(1, 1), 1.0);
        assert_eq!(ds.features().value(1, 2), 0.0);
        assert_eq!(ds.labels(), &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn headerless_with_names_and_target_column() {
        let path = write_temp(
            "treelin_csv_headerless.csv",
            "1,yes,0.5\n2,no,0.25\n",
        );
        let options = CsvOptions {
            has_header: false,
            column_names: Some(vec!["a".into(), "target".into(), "b".into()]),
            target_column: Some("target".into()),
            positive_label: "yes".into(),
            ..Default::default()
        };
        let ds = read_classification_csv(&path, &options).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.feature_names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(ds.labels(), &[1.0, 0.0]);
        assert_eq!(ds.features().value(1, 1), 0.25);
    }

    #[test]
    fn missing_target_column_errors() {
        let path = write_temp("treelin_csv_missing.csv", "a,b\n1,2\n");
        let options = CsvOptions { target_column: Some("nope".into()), ..Default::default() };
        let err = read_classification_csv(&path, &options).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, DataError::MissingColumn(name) if name == "nope"));
    }

    #[test]
    fn ragged_row_errors() {
        let path = write_temp("treelin_csv_ragged.csv", "a,b,y\n1,2,0\n1,0\n");
        let err = read_classification_csv(&path, &CsvOptions::default()).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, DataError::RaggedRow { line: 2, expected: 3, got: 2 }));
    }

    #[test]
    fn empty_cell_becomes_nan() {
        let path = write_temp("treelin_csv_nan.csv", "x,y\n1,0\n,1\n");
        let ds = read_classification_csv(&path, &CsvOptions::default()).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(ds.features().value(0, 1).is_nan());
    }
}
