//! Everything that touches the VW process and its files.

pub mod runner;
pub mod workdir;

pub use runner::{TrainRequest, Trainer, VwTrainer, parse_predictions, read_predictions};
pub use workdir::{DEFAULT_WORKDIR, WorkDir};
