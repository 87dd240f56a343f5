use serde::{Deserialize, Serialize};

/// One input record, as read from the delimited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number, for error messages
    pub line: usize,
    pub fields: Vec<String>,
}

/// A single feature extracted from a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    /// Free text, tokenised at conversion time
    Words { column: usize, text: String },
    /// Whole field as one indicator feature
    Categorical { column: usize, value: String },
    /// Real-valued feature
    Numeric { column: usize, value: f64 },
    /// Pre-formatted VW feature text
    Raw(String),
}

/// A row after column interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub label: f64,
    /// Importance weight given to VW
    pub training_weight: f64,
    /// Weight used when computing weighted metrics
    pub metric_weight: f64,
    pub features: Vec<Feature>,
    /// Example tag from an `info` column
    pub tag: Option<String>,
}

/// Training-weighted totals, the same figures VW reports at the end of a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub examples: usize,
    pub weighted_example_sum: f64,
    pub weighted_label_sum: f64,
}

impl DatasetSummary {
    pub fn from_examples(examples: &[Example]) -> Self {
        examples.iter().fold(Self::default(), |mut acc, ex| {
            acc.examples += 1;
            acc.weighted_example_sum += ex.training_weight;
            acc.weighted_label_sum += ex.training_weight * ex.label;
            acc
        })
    }
}
