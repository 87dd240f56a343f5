//! Data layer: column roles, loading, preprocessing and VW conversion.
//!
//! ```text
//!   .csv / .tsv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ dataset  │  csv records → Row
//!   └──────────┘
//!        │  ColumnSpec::interpret
//!        ▼
//!   ┌──────────┐
//!   │ Example  │  label, training/metric weight, features
//!   └──────────┘
//!        │  Preprocessing
//!        ▼
//!   ┌──────────┐
//!   │ vwformat │  one VW line per example
//!   └──────────┘
//! ```

pub mod columnspec;
pub mod dataset;
pub mod model;
pub mod preprocess;
pub mod vwformat;

pub use columnspec::{ColumnRole, ColumnSpec, FeatureKind, WeightUse};
pub use dataset::{Dataset, DatasetOptions, detect_delimiter, read_rows};
pub use model::{DatasetSummary, Example, Feature, Row};
pub use preprocess::{Preprocessing, PreprocessingSpace, Toggle};
pub use vwformat::{escape_token, to_vw_line, write_dataset, write_dataset_file};
