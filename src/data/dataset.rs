use std::path::Path;

use log::debug;

use super::columnspec::ColumnSpec;
use super::model::{DatasetSummary, Example, Row};
use crate::error::{Error, Result};

/// How to read the delimited input file.
#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    /// Field delimiter. `None` picks one from the file extension.
    pub delimiter: Option<u8>,
    /// Skip the first row
    pub header: bool,
}

/// Delimiter implied by the file extension: tab for `.tsv`, comma otherwise.
pub fn detect_delimiter(path: &Path) -> u8 {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "tsv" | "tab" => b'\t',
        _ => b',',
    }
}

/// Read all records of a delimited file, in file order.
///
/// Rows may have differing field counts here; the column spec check
/// happens in [`ColumnSpec::interpret`].
pub fn read_rows(path: &Path, options: &DatasetOptions) -> Result<Vec<Row>> {
    let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(path));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(options.header)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);
        rows.push(Row {
            line,
            fields: record.iter().map(|f| f.to_string()).collect(),
        });
    }

    debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Examples of one input file together with the column spec that produced them.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub spec: ColumnSpec,
    pub examples: Vec<Example>,
}

impl Dataset {
    pub fn load(path: &Path, spec: ColumnSpec, options: &DatasetOptions) -> Result<Self> {
        let rows = read_rows(path, options)?;
        Self::from_rows(spec, &rows)
    }

    pub fn from_rows(spec: ColumnSpec, rows: &[Row]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let examples = rows
            .iter()
            .map(|row| spec.interpret(row))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { spec, examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn labels(&self) -> Vec<f64> {
        self.examples.iter().map(|e| e.label).collect()
    }

    pub fn metric_weights(&self) -> Vec<f64> {
        self.examples.iter().map(|e| e.metric_weight).collect()
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::from_examples(&self.examples)
    }
}
