//! vwoptimize CLI - Vowpal Wabbit on CSV, with hyperparameter search
//!
//! The command line is split in two before clap sees it: wrapper flags
//! (data, column spec, metrics, preprocessing) and everything else, which
//! goes to VW verbatim. VW arguments may carry alternatives:
//!
//! - `-b 18/20/22`     grid over three values
//! - `-b 18/20/22?`    tune one value at a time
//! - `--l2 1e-8..1e-4?` tune over a range
//! - `--adaptive?`     try with and without the flag
//!
//! Settings from vwoptimize.toml (or `[tool.vwoptimize]` in pyproject.toml)
//! fill in whatever the command line leaves unset.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use log::debug;

use vwoptimize::args::split_args;
use vwoptimize::config::Config;
use vwoptimize::data::{DatasetOptions, PreprocessingSpace, Toggle};
use vwoptimize::driver::{self, RunOptions};
use vwoptimize::training::Metric;
use vwoptimize::vw::{DEFAULT_WORKDIR, VwTrainer};

/// Train and tune Vowpal Wabbit models on delimited text files
///
/// Rows are converted to VW format according to --columnspec, then VW is
/// run once, or once per configuration when VW options list alternatives.
/// Any option not listed here is passed to VW unchanged.
///
/// Examples:
///   vwoptimize -d train.csv --columnspec y,text --metric acc --quiet
///   vwoptimize -d train.csv --columnspec y,weight,text,text -b 1/2/3? --metric acc,acc_w
///   vwoptimize -d train.csv --columnspec y,text,text --tovw -
#[derive(Parser, Debug)]
#[command(name = "vwoptimize")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Input file (CSV, or TSV for .tsv/.tab names)
    #[arg(short = 'd', long = "data", value_name = "FILE")]
    pub data: PathBuf,

    /// Comma-separated role of each column
    ///
    /// Roles:
    ///   y              label (exactly one)
    ///   drop           ignored
    ///   text           free text, split into words
    ///   cat            categorical value
    ///   num            numeric feature
    ///   vw             raw VW feature text
    ///   info           example tag
    ///   weight         importance weight for training and metrics
    ///   weight_train   importance weight for training only
    ///   weight_metric  importance weight for metrics only
    #[arg(long, value_name = "ROLES")]
    pub columnspec: String,

    /// Metrics to report, comma separated; the first ranks configurations
    ///
    /// Known metrics: acc, acc_w, mse, mse_w.
    /// Required whenever VW options contain alternatives.
    #[arg(long, value_name = "METRICS")]
    pub metric: Option<String>,

    /// Field delimiter (single character, or "\t")
    ///
    /// Defaults to tab for .tsv/.tab files and comma otherwise.
    #[arg(long)]
    pub delimiter: Option<String>,

    /// First row is a header and is skipped
    #[arg(long)]
    pub header: bool,

    /// Lowercase text columns (`--lowercase?` to try both)
    #[arg(long, value_enum, value_name = "MODE")]
    pub lowercase: Option<ToggleArg>,

    /// Replace punctuation in text columns (`--strip_punct?` to try both)
    #[arg(long = "strip_punct", value_enum, value_name = "MODE")]
    pub strip_punct: Option<ToggleArg>,

    /// VW executable
    #[arg(long, value_name = "PATH")]
    pub vw: Option<PathBuf>,

    /// Directory for intermediate files
    ///
    /// Files written by this process are removed on exit.
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Write the converted dataset here and exit ("-" for stdout)
    #[arg(long, value_name = "FILE")]
    pub tovw: Option<PathBuf>,

    /// Write every evaluated configuration and its scores as JSON
    #[arg(long = "results-json", value_name = "FILE")]
    pub results_json: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,

    /// Arguments destined for VW
    #[arg(skip)]
    pub vw_args: Vec<String>,
}

/// Preprocessing mode as written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToggleArg {
    On,
    Tune,
}

impl From<ToggleArg> for Toggle {
    fn from(arg: ToggleArg) -> Self {
        match arg {
            ToggleArg::On => Toggle::On,
            ToggleArg::Tune => Toggle::Tune,
        }
    }
}

impl Cli {
    /// Parse a full argv, routing non-wrapper arguments to `vw_args`.
    pub fn from_argv<I>(argv: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let split = split_args(argv);
        let mut cli = Cli::parse_from(split.wrapper);
        cli.vw_args = split.vw;
        cli
    }
}

fn main() -> Result<()> {
    let cli = Cli::from_argv(std::env::args());
    init_logging(cli.verbose);

    let config = Config::load(Path::new("."));
    debug!("configuration:\n{}", config.display_summary());

    let options = build_options(&cli, &config)?;
    let program = cli
        .vw
        .clone()
        .or_else(|| config.vw.clone())
        .unwrap_or_else(|| PathBuf::from("vw"));
    let trainer = VwTrainer::new(program);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    driver::run(&options, &trainer, &mut out)?;
    out.flush()?;

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Merge command line and config file; the command line wins.
fn build_options(cli: &Cli, config: &Config) -> Result<RunOptions> {
    let metrics = match &cli.metric {
        Some(list) => Metric::parse_list(list)?,
        None => Metric::parse_list(&config.metric.join(","))?,
    };

    let delimiter = match cli.delimiter.as_ref().or(config.delimiter.as_ref()) {
        Some(d) => Some(parse_delimiter(d)?),
        None => None,
    };

    Ok(RunOptions {
        data: cli.data.clone(),
        columnspec: cli.columnspec.clone(),
        dataset: DatasetOptions {
            delimiter,
            header: cli.header || config.header.unwrap_or(false),
        },
        metrics,
        preprocessing: PreprocessingSpace {
            lowercase: cli.lowercase.map(Toggle::from).unwrap_or_default(),
            strip_punct: cli.strip_punct.map(Toggle::from).unwrap_or_default(),
        },
        vw_args: cli.vw_args.clone(),
        workdir: cli
            .workdir
            .clone()
            .or_else(|| config.workdir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKDIR)),
        tovw: cli.tovw.clone(),
        results_json: cli.results_json.clone(),
    })
}

fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "\\t" | "\t" | "tab" => Ok(b'\t'),
        _ if s.len() == 1 => Ok(s.as_bytes()[0]),
        _ => bail!("delimiter must be a single ASCII character, got {:?}", s),
    }
}
