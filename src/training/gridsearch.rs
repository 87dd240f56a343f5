//! VW option grammar and the space of configurations it spans.
//!
//! ## Option values
//!
//! | Written             | Meaning                                        |
//! |---------------------|------------------------------------------------|
//! | `-b 18`             | fixed                                          |
//! | `-b 18/20/22`       | grid: every value, cartesian with other grids  |
//! | `-b 18/20/22?`      | tuned: coordinate search, first value is start |
//! | `--l2 1e-8..1e-4?`  | tuned range, expanded into sample points       |
//! | `--adaptive?`       | tuned flag: tried absent, then present         |
//!
//! ## Range Encoding
//!
//! Ranges are sampled at evenly spaced points of the normalized [0, 1]
//! interval and decoded to their actual range, in log space when the range
//! is positive and spans more than a decade.
//!
//! Options that name files are never split on `/`. Prediction output is
//! owned by the trainer, so `-p` / `--predictions` are refused.

use crate::error::{Error, Result};
use crate::report::format_g;

/// Points sampled from a `lo..hi` range.
pub const RANGE_POINTS: usize = 5;

/// Options whose values are file paths.
const PATH_OPTIONS: &[&str] = &[
    "-f",
    "--final_regressor",
    "-i",
    "--initial_regressor",
    "-r",
    "--raw_predictions",
    "--cache_file",
    "--readable_model",
    "--invert_hash",
    "--feature_mask",
    "--dictionary",
    "--dictionary_path",
];

/// Options the trainer sets itself on every run.
const RESERVED_OPTIONS: &[&str] = &["-p", "--predictions"];

/// Sampling range for a numeric option.
#[derive(Debug, Clone)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    /// If true, sample in log space (good for learning rates, regularisers)
    pub log_scale: bool,
}

impl ParamRange {
    pub fn linear(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            log_scale: false,
        }
    }

    pub fn log(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            log_scale: true,
        }
    }

    /// Log scale for positive ranges wider than a factor of 10.
    pub fn auto(min: f64, max: f64) -> Self {
        if min > 0.0 && max / min > 10.0 {
            Self::log(min, max)
        } else {
            Self::linear(min, max)
        }
    }

    /// Convert normalized [0, 1] value to actual parameter value.
    pub fn decode(&self, normalized: f64) -> f64 {
        let t = normalized.clamp(0.0, 1.0);
        if self.log_scale {
            let log_min = self.min.ln();
            let log_max = self.max.ln();
            (log_min + t * (log_max - log_min)).exp()
        } else {
            self.min + t * (self.max - self.min)
        }
    }

    /// `n` evenly spaced points from min to max inclusive.
    pub fn sample(&self, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = if n > 1 {
                    i as f64 / (n - 1) as f64
                } else {
                    0.5
                };
                self.decode(t)
            })
            .collect()
    }
}

/// What a single option contributes to the command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Setting {
    /// Option left out
    Absent,
    /// Option given without a value
    Flag,
    Value(String),
}

/// How an option's choices are explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Fixed,
    Grid,
    Tuned,
}

/// A VW option with one or more possible settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VwOption {
    pub name: String,
    pub choices: Vec<Setting>,
    pub mode: SearchMode,
}

impl VwOption {
    fn render(&self, choice: usize, out: &mut Vec<String>) {
        match &self.choices[choice] {
            Setting::Absent => {}
            Setting::Flag => out.push(self.name.clone()),
            Setting::Value(v) => {
                out.push(self.name.clone());
                out.push(v.clone());
            }
        }
    }
}

/// One point in the space: a choice index per option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Configuration {
    choices: Vec<usize>,
}

impl Configuration {
    pub fn with_choice(&self, option: usize, choice: usize) -> Self {
        let mut next = self.clone();
        next.choices[option] = choice;
        next
    }
}

/// All VW options of a run and the configurations they span.
///
/// Fixed options are kept first, followed by grid and tuned options; each
/// group keeps command-line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSpace {
    options: Vec<VwOption>,
}

impl SearchSpace {
    /// Parse pass-through VW arguments.
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut options = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let token = &args[i];
            if !is_option_name(token) {
                return Err(Error::OptionGrammar {
                    option: token.clone(),
                    reason: "expected an option name".into(),
                });
            }

            let (name, value) = match token.split_once('=') {
                Some((name, value)) if token.starts_with("--") => {
                    (name.to_string(), Some(value.to_string()))
                }
                _ => {
                    let value = match args.get(i + 1) {
                        Some(next) if !is_option_name(next) => {
                            i += 1;
                            Some(next.clone())
                        }
                        _ => None,
                    };
                    (token.clone(), value)
                }
            };

            options.push(parse_option(&name, value.as_deref())?);
            i += 1;
        }

        // Stable: fixed options first, then searched ones in given order
        options.sort_by_key(|o| o.mode != SearchMode::Fixed);
        Ok(Self { options })
    }

    pub fn options(&self) -> &[VwOption] {
        &self.options
    }

    /// True when there is exactly one configuration.
    pub fn is_single(&self) -> bool {
        self.options.iter().all(|o| o.choices.len() == 1)
    }

    /// Every option at its first choice.
    pub fn initial(&self) -> Configuration {
        Configuration {
            choices: vec![0; self.options.len()],
        }
    }

    /// Cartesian product of grid options; everything else at its first choice.
    pub fn grid_points(&self) -> Vec<Configuration> {
        let grid: Vec<usize> = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.mode == SearchMode::Grid)
            .map(|(i, _)| i)
            .collect();

        let total: usize = grid.iter().map(|&oi| self.options[oi].choices.len()).product();

        (0..total)
            .map(|idx| {
                // Convert linear index to multi-index
                let mut config = self.initial();
                let mut remaining = idx;
                for &oi in &grid {
                    let len = self.options[oi].choices.len();
                    config.choices[oi] = remaining % len;
                    remaining /= len;
                }
                config
            })
            .collect()
    }

    /// Indices of tuned options, in search order.
    pub fn tuned(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.mode == SearchMode::Tuned)
            .map(|(i, _)| i)
            .collect()
    }

    /// Command-line arguments for a configuration.
    pub fn args(&self, config: &Configuration) -> Vec<String> {
        let mut out = Vec::new();
        for (option, &choice) in self.options.iter().zip(&config.choices) {
            option.render(choice, &mut out);
        }
        out
    }
}

fn is_option_name(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && token.parse::<f64>().is_err()
}

fn is_path_option(name: &str) -> bool {
    PATH_OPTIONS.contains(&name)
}

fn grammar_error(option: &str, reason: impl Into<String>) -> Error {
    Error::OptionGrammar {
        option: option.to_string(),
        reason: reason.into(),
    }
}

fn parse_option(name: &str, value: Option<&str>) -> Result<VwOption> {
    if RESERVED_OPTIONS.contains(&name.trim_end_matches('?')) {
        return Err(grammar_error(
            name,
            "predictions are written to the work directory and cannot be redirected",
        ));
    }

    if let Some(base) = name.strip_suffix('?') {
        if value.is_some() {
            return Err(grammar_error(base, "an optional flag ('?') cannot take a value"));
        }
        return Ok(VwOption {
            name: base.to_string(),
            choices: vec![Setting::Absent, Setting::Flag],
            mode: SearchMode::Tuned,
        });
    }

    let Some(value) = value else {
        return Ok(VwOption {
            name: name.to_string(),
            choices: vec![Setting::Flag],
            mode: SearchMode::Fixed,
        });
    };

    let fixed = |v: &str| VwOption {
        name: name.to_string(),
        choices: vec![Setting::Value(v.to_string())],
        mode: SearchMode::Fixed,
    };

    if is_path_option(name) {
        return Ok(fixed(value));
    }

    let (body, tuned) = match value.strip_suffix('?') {
        Some(body) => (body, true),
        None => (value, false),
    };

    let values = if let Some((lo, hi)) = body.split_once("..") {
        expand_range(name, lo, hi)?
    } else if body.contains('/') {
        let parts: Vec<String> = body.split('/').map(str::to_string).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(grammar_error(name, format!("empty alternative in '{value}'")));
        }
        parts
    } else if tuned {
        return Err(grammar_error(
            name,
            "nothing to search: give alternatives (a/b) or a range (lo..hi)",
        ));
    } else {
        return Ok(fixed(value));
    };

    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !unique.contains(&v) {
            unique.push(v);
        }
    }

    let mode = match (unique.len(), tuned) {
        (1, _) => SearchMode::Fixed,
        (_, true) => SearchMode::Tuned,
        (_, false) => SearchMode::Grid,
    };

    Ok(VwOption {
        name: name.to_string(),
        choices: unique.into_iter().map(Setting::Value).collect(),
        mode,
    })
}

fn expand_range(name: &str, lo: &str, hi: &str) -> Result<Vec<String>> {
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| grammar_error(name, format!("'{s}' is not a number")))
    };
    let (min, max) = (parse(lo)?, parse(hi)?);
    if min >= max {
        return Err(grammar_error(name, format!("empty range {lo}..{hi}")));
    }

    let integer = lo.trim().parse::<i64>().is_ok() && hi.trim().parse::<i64>().is_ok();
    let range = ParamRange::auto(min, max);

    Ok(range
        .sample(RANGE_POINTS)
        .into_iter()
        .map(|v| {
            if integer {
                (v.round() as i64).to_string()
            } else {
                format_g(v)
            }
        })
        .collect())
}
