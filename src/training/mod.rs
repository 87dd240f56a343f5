//! Hyperparameter search over VW options.
//!
//! - `gridsearch`: option grammar (`a/b/c`, `a/b/c?`, `lo..hi?`, `--flag?`)
//!   and the configurations it spans
//! - `metrics`: weighted and unweighted scores of a prediction set
//! - `search`: grid enumeration followed by a coordinate sweep of tuned
//!   options, first-seen winning ties

pub mod gridsearch;
pub mod metrics;
pub mod search;

pub use gridsearch::{
    Configuration, ParamRange, RANGE_POINTS, SearchMode, SearchSpace, Setting, VwOption,
};
pub use metrics::{Metric, Task, accuracy, evaluate, mean_squared_error};
pub use search::{RunResult, SearchOutcome, search};
