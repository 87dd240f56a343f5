//! Running the external trainer.
//!
//! [`Trainer`] is the seam between the search and the VW binary: given
//! VW arguments, a data file and a predictions path, train on the data and
//! leave one progressive prediction per example in the predictions file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// One training invocation.
#[derive(Debug, Clone, Copy)]
pub struct TrainRequest<'a> {
    /// VW options, excluding data and prediction paths
    pub args: &'a [String],
    pub data: &'a Path,
    pub predictions: &'a Path,
    /// Let the trainer's own diagnostics reach the terminal
    pub show_output: bool,
}

pub trait Trainer {
    fn train(&self, request: &TrainRequest<'_>) -> Result<()>;
}

/// Shells out to the `vw` executable.
#[derive(Debug, Clone)]
pub struct VwTrainer {
    program: PathBuf,
}

impl VwTrainer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, request: &TrainRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(request.args)
            .arg("-d")
            .arg(request.data)
            .arg("-p")
            .arg(request.predictions);
        cmd
    }
}

impl Default for VwTrainer {
    fn default() -> Self {
        Self::new("vw")
    }
}

impl Trainer for VwTrainer {
    fn train(&self, request: &TrainRequest<'_>) -> Result<()> {
        let program = self.program.display().to_string();
        let mut cmd = self.command(request);
        debug!("running {:?}", cmd);

        let spawn_err = |source| Error::TrainerSpawn {
            program: program.clone(),
            source,
        };

        // Shown output goes straight to our stderr; otherwise it is kept
        // for the error message.
        let (status, stderr) = if request.show_output {
            let status = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(spawn_err)?;
            (status, String::new())
        } else {
            let output = cmd.stdin(Stdio::null()).output().map_err(spawn_err)?;
            (
                output.status,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )
        };

        if !status.success() {
            return Err(Error::TrainerFailed {
                program,
                status: status.to_string(),
                options: request.args.join(" "),
                stderr,
            });
        }

        Ok(())
    }
}

/// Parse a VW predictions file: one line per example, the prediction being
/// the first whitespace separated token (a tag may follow).
pub fn parse_predictions(text: &str) -> Result<Vec<f64>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.split_whitespace()
                .next()
                .and_then(|tok| tok.parse::<f64>().ok())
                .ok_or_else(|| Error::BadPrediction {
                    line: i + 1,
                    text: line.to_string(),
                })
        })
        .collect()
}

pub fn read_predictions(path: &Path) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path)?;
    parse_predictions(&text)
}
