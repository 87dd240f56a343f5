//! vwoptimize - Vowpal Wabbit on delimited text, with hyperparameter search
//!
//! Converts CSV/TSV rows into VW's input format according to a column spec,
//! drives the `vw` executable, scores its predictions and searches VW
//! option alternatives for the best configuration.
//!
//! # Architecture
//!
//! ```text
//! CSV rows → ColumnSpec → Examples → VW text → vw subprocess → predictions → metrics
//!    ↓           ↓                      ↓            ↓                          ↓
//!   csv       roles per            escaping,     Trainer trait            acc / acc_w
//!  crate       column            preprocessing   (fakeable)                   ↓
//!                                                                 grid + coordinate search
//! ```

pub mod args;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod report;
pub mod training;
pub mod vw;

pub use data::{ColumnRole, ColumnSpec, Dataset, Example, Preprocessing};
pub use driver::{RunOptions, RunSummary, run};
pub use error::{Error, Result};
pub use training::{Metric, SearchSpace};
pub use vw::{Trainer, VwTrainer, WorkDir};
