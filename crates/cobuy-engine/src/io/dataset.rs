//! Co-purchase dataset reader.
//!
//! Each row holds an `input` and a `target` cell, both written as list
//! literals such as `[1001, 1003]`. Cells are parsed with a strict literal
//! parser; nothing in the file is ever evaluated.
use std::path::Path;

use csv::StringRecord;

use crate::error::{EngineError, Result};
use crate::ProductId;

/// One observed co-purchase: products already in the basket and products
/// bought alongside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    pub input: Vec<ProductId>,
    pub target: Vec<ProductId>,
}

/// Configuration for reading co-purchase datasets.
#[derive(Debug, Clone)]
pub struct DatasetReaderConfig {
    /// Column name holding the input product list.
    pub input_column: String,
    /// Column name holding the target product list.
    pub target_column: String,
    /// Field delimiter. When `None`, tab is used for `.tsv` files and comma otherwise.
    pub delimiter: Option<u8>,
}

impl Default for DatasetReaderConfig {
    fn default() -> Self {
        Self {
            input_column: "input".to_string(),
            target_column: "target".to_string(),
            delimiter: None,
        }
    }
}

/// Read every training example from a CSV/TSV file.
pub fn load_examples<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingExample>> {
    load_examples_with_config(path, &DatasetReaderConfig::default())
}

/// Read every training example using a custom configuration.
pub fn load_examples_with_config<P: AsRef<Path>>(
    path: P,
    config: &DatasetReaderConfig,
) -> Result<Vec<TrainingExample>> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| delimiter_for(path));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| EngineError::data_load(path, format!("cannot open file: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| EngineError::data_load(path, format!("cannot read header row: {}", e)))?
        .clone();

    let input_idx = find_column(&headers, &config.input_column).ok_or_else(|| {
        EngineError::data_load(path, format!("missing column '{}'", config.input_column))
    })?;
    let target_idx = find_column(&headers, &config.target_column).ok_or_else(|| {
        EngineError::data_load(path, format!("missing column '{}'", config.target_column))
    })?;

    let mut examples = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| EngineError::data_load(path, format!("row {}: {}", row_idx + 1, e)))?;

        let input = parse_cell(&record, input_idx, &config.input_column, row_idx)
            .map_err(|reason| EngineError::data_load(path, reason))?;
        let target = parse_cell(&record, target_idx, &config.target_column, row_idx)
            .map_err(|reason| EngineError::data_load(path, reason))?;

        examples.push(TrainingExample { input, target });
    }

    if examples.is_empty() {
        return Err(EngineError::data_load(path, "dataset contains no rows"));
    }

    log::debug!(
        "Read {} co-purchase examples from {}",
        examples.len(),
        path.display()
    );

    Ok(examples)
}

fn delimiter_for(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);
    if is_tsv {
        b'\t'
    } else {
        b','
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn parse_cell(
    record: &StringRecord,
    idx: usize,
    column: &str,
    row_idx: usize,
) -> std::result::Result<Vec<ProductId>, String> {
    let value = record
        .get(idx)
        .ok_or_else(|| format!("row {}: missing '{}' value", row_idx + 1, column))?;
    parse_id_list(value)
        .map_err(|e| format!("row {}: invalid '{}' value {:?}: {}", row_idx + 1, column, value, e))
}

/// Parse a list literal of integers, e.g. `[1001, 1003]`, `(7,)` or `[]`.
///
/// Brackets are optional. Order and duplicates are kept as written.
pub fn parse_id_list(text: &str) -> std::result::Result<Vec<ProductId>, String> {
    let trimmed = text.trim();
    let body = match (trimmed.chars().next(), trimmed.chars().last()) {
        (Some('['), Some(']')) | (Some('('), Some(')')) if trimmed.len() >= 2 => {
            &trimmed[1..trimmed.len() - 1]
        }
        (Some('['), _) | (Some('('), _) | (_, Some(']')) | (_, Some(')')) => {
            return Err("unbalanced brackets".to_string());
        }
        _ => trimmed,
    };

    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let body = body.strip_suffix(',').unwrap_or(body);
    body.split(',')
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return Err("empty list element".to_string());
            }
            token
                .parse::<ProductId>()
                .map_err(|_| format!("'{}' is not an integer", token))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_dataset(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_id_list_literals() {
        assert_eq!(parse_id_list("[1001, 1003]").unwrap(), vec![1001, 1003]);
        assert_eq!(parse_id_list(" ( 7 , ) ").unwrap(), vec![7]);
        assert_eq!(parse_id_list("[]").unwrap(), Vec::<ProductId>::new());
        assert_eq!(parse_id_list("3,3,-2").unwrap(), vec![3, 3, -2]);
    }

    #[test]
    fn test_parse_id_list_rejects_non_literals() {
        assert!(parse_id_list("[1, 2").is_err());
        assert!(parse_id_list("[1,,2]").is_err());
        assert!(parse_id_list("[1.5]").is_err());
        assert!(parse_id_list("__import__('os')").is_err());
        assert!(parse_id_list("[1, 2] + [3]").is_err());
    }

    #[test]
    fn test_load_csv_with_quoted_lists() {
        let file = write_dataset(
            ".csv",
            "input,target\n\"[1001, 1003]\",\"[1005]\"\n\"[1002, 1004]\",\"[1001, 1006]\"\n",
        );
        let examples = load_examples(file.path()).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].input, vec![1001, 1003]);
        assert_eq!(examples[1].target, vec![1001, 1006]);
    }

    #[test]
    fn test_load_tsv_with_extra_columns() {
        let file = write_dataset(".tsv", "id\tTarget\tInput\n1\t[5]\t[1, 2]\n");
        let examples = load_examples(file.path()).unwrap();
        assert_eq!(
            examples,
            vec![TrainingExample {
                input: vec![1, 2],
                target: vec![5],
            }]
        );
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let err = load_examples("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, EngineError::DataLoad { .. }));
    }

    #[test]
    fn test_missing_column_is_data_load_error() {
        let file = write_dataset(".csv", "input,other\n\"[1]\",\"[2]\"\n");
        let err = load_examples(file.path()).unwrap_err();
        assert!(err.to_string().contains("missing column 'target'"));
    }

    #[test]
    fn test_bad_cell_names_row() {
        let file = write_dataset(".csv", "input,target\n\"[1, 2]\",\"[3]\"\n\"[1, x]\",\"[3]\"\n");
        let err = load_examples(file.path()).unwrap_err();
        assert!(err.to_string().contains("row 2"), "{}", err);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let file = write_dataset(".csv", "input,target\n");
        assert!(load_examples(file.path()).is_err());
    }
}
