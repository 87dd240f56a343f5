//! End-to-end run: load → convert → train or search → report.
//!
//! Output goes to the writer handed in (stdout in the binary). Trainer
//! diagnostics go to stderr only for runs with `show_output`: the single
//! run and the final re-run of the best configuration.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use crate::data::{
    ColumnSpec, Dataset, DatasetOptions, DatasetSummary, Preprocessing, PreprocessingSpace,
    write_dataset, write_dataset_file,
};
use crate::error::Error;
use crate::report::{best_with_line, metric_line, result_line, summary_lines};
use crate::training::{Metric, RunResult, SearchOutcome, SearchSpace, evaluate, search};
use crate::vw::{TrainRequest, Trainer, WorkDir, read_predictions};

/// Everything a run needs, after CLI and config file are merged.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub data: PathBuf,
    pub columnspec: String,
    pub dataset: DatasetOptions,
    /// First metric is the one configurations are ranked by
    pub metrics: Vec<Metric>,
    pub preprocessing: PreprocessingSpace,
    /// Pass-through VW arguments, possibly with alternatives
    pub vw_args: Vec<String>,
    pub workdir: PathBuf,
    /// Write converted data here (`-` for the output writer) and stop
    pub tovw: Option<PathBuf>,
    pub results_json: Option<PathBuf>,
}

/// What a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub dataset: DatasetSummary,
    /// Every evaluated configuration, in evaluation order
    pub results: Vec<RunResult>,
    pub best: Option<RunResult>,
    /// Scores of the single run, or of the final re-run of the best configuration
    pub final_scores: Vec<(Metric, f64)>,
}

/// Dataset, trainer and work directory for one run.
///
/// Dropping the session drops the work directory, which removes every
/// artifact written during the run.
struct Session<'a, T: ?Sized> {
    dataset: &'a Dataset,
    trainer: &'a T,
    workdir: WorkDir,
    metrics: &'a [Metric],
    labels: Vec<f64>,
    weights: Vec<f64>,
}

impl<T: Trainer + ?Sized> Session<'_, T> {
    fn write_data(&self, preprocessing: &Preprocessing) -> crate::error::Result<PathBuf> {
        let path = self.workdir.file("data", "vw");
        write_dataset_file(&path, self.dataset, preprocessing)?;
        debug!(
            "wrote {} examples ({}) to {}",
            self.dataset.len(),
            preprocessing.describe(),
            path.display()
        );
        Ok(path)
    }

    fn score(
        &self,
        data: &Path,
        args: &[String],
        show_output: bool,
    ) -> crate::error::Result<Vec<(Metric, f64)>> {
        let predictions = self.workdir.file("predictions", "txt");
        self.trainer.train(&TrainRequest {
            args,
            data,
            predictions: &predictions,
            show_output,
        })?;

        if self.metrics.is_empty() {
            return Ok(Vec::new());
        }

        let preds = read_predictions(&predictions)?;
        evaluate(self.metrics, &self.labels, &preds, &self.weights)
    }
}

pub fn run<T, W>(options: &RunOptions, trainer: &T, out: &mut W) -> Result<RunSummary>
where
    T: Trainer + ?Sized,
    W: Write,
{
    let spec = ColumnSpec::parse(&options.columnspec)?;
    let dataset = Dataset::load(&options.data, spec, &options.dataset)
        .with_context(|| format!("Failed to load {}", options.data.display()))?;

    let mut summary = RunSummary {
        dataset: dataset.summary(),
        ..Default::default()
    };
    info!(
        "loaded {} examples from {} (columnspec {})",
        summary.dataset.examples,
        options.data.display(),
        dataset.spec
    );
    debug!(
        "weighted example sum = {:.6}",
        summary.dataset.weighted_example_sum
    );
    debug!(
        "weighted label sum = {:.6}",
        summary.dataset.weighted_label_sum
    );
    if !dataset.spec.has_metric_weight() && options.metrics.iter().any(|m| m.is_weighted()) {
        info!("no metric weight column; weighted metrics use weight 1 for every row");
    }

    let combinations = options.preprocessing.combinations();

    if let Some(target) = &options.tovw {
        let preprocessing = combinations.first().copied().unwrap_or_default();
        if target.as_os_str() == "-" {
            write_dataset(out, &dataset, &preprocessing)?;
        } else {
            write_dataset_file(target, &dataset, &preprocessing)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            info!("wrote VW data to {}", target.display());
        }
        return Ok(summary);
    }

    let space = SearchSpace::parse(&options.vw_args)?;
    let workdir = WorkDir::create(&options.workdir).with_context(|| {
        format!(
            "Failed to create work directory {}",
            options.workdir.display()
        )
    })?;

    let session = Session {
        dataset: &dataset,
        trainer,
        workdir,
        metrics: &options.metrics,
        labels: dataset.labels(),
        weights: dataset.metric_weights(),
    };

    if space.is_single() && combinations.len() == 1 {
        let data = session.write_data(&combinations[0])?;
        let args = space.args(&space.initial());
        out.flush()?;
        summary.final_scores = session.score(&data, &args, true)?;
        print_scores(out, &summary.final_scores)?;
    } else {
        run_search(&session, &space, &combinations, out, &mut summary)?;
    }

    if let Some(path) = &options.results_json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(summary)
}

fn run_search<T, W>(
    session: &Session<'_, T>,
    space: &SearchSpace,
    combinations: &[Preprocessing],
    out: &mut W,
    summary: &mut RunSummary,
) -> Result<()>
where
    T: Trainer + ?Sized,
    W: Write,
{
    let Some(&primary) = session.metrics.first() else {
        return Err(Error::NoMetric.into());
    };

    let mut outcomes: Vec<(Preprocessing, PathBuf, SearchOutcome)> = Vec::new();

    for &preprocessing in combinations {
        let data = session.write_data(&preprocessing)?;
        let outcome = search(
            space,
            primary,
            |args: &[String]| {
                Ok(RunResult {
                    preprocessing,
                    vw_args: args.to_vec(),
                    scores: session.score(&data, args, false)?,
                })
            },
            |result, improved| {
                writeln!(out, "{}", result_line(result, improved))?;
                Ok(())
            },
        )?;
        outcomes.push((preprocessing, data, outcome));
    }

    // First-seen wins across preprocessing combinations too
    let mut overall = 0;
    for (i, (_, _, outcome)) in outcomes.iter().enumerate().skip(1) {
        let candidate = outcome.best().score(primary).unwrap_or(f64::NAN);
        let incumbent = outcomes[overall].2.best().score(primary).unwrap_or(f64::NAN);
        if primary.improves(candidate, incumbent) {
            overall = i;
        }
    }

    for (i, (preprocessing, _, outcome)) in outcomes.iter().enumerate() {
        let value = outcome.best().score(primary).unwrap_or(f64::NAN);
        writeln!(
            out,
            "{}",
            best_with_line(primary, preprocessing, value, i == overall)
        )?;
    }

    let (_, best_data, best_outcome) = &outcomes[overall];
    let best = best_outcome.best().clone();
    for line in summary_lines(primary, &best) {
        writeln!(out, "{}", line)?;
    }

    info!("re-running best configuration: {}", best.options());
    out.flush()?;
    summary.final_scores = session.score(best_data, &best.vw_args, true)?;
    print_scores(out, &summary.final_scores)?;

    summary.results = outcomes
        .into_iter()
        .flat_map(|(_, _, outcome)| outcome.results)
        .collect();
    summary.best = Some(best);
    Ok(())
}

fn print_scores<W: Write>(out: &mut W, scores: &[(Metric, f64)]) -> Result<()> {
    for (metric, value) in scores {
        writeln!(out, "{}", metric_line(*metric, *value))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    use crate::data::Toggle;

    /// Stand-in for VW: records calls and predicts from the `-b` value.
    ///
    /// With `-b 1` only the first example is right; otherwise everything is
    /// predicted as class 1, which gets the two class-1 examples right.
    #[derive(Default)]
    struct FakeTrainer {
        calls: RefCell<Vec<(Vec<String>, bool)>>,
        data_seen: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Trainer for FakeTrainer {
        fn train(&self, request: &TrainRequest<'_>) -> crate::error::Result<()> {
            self.calls
                .borrow_mut()
                .push((request.args.to_vec(), request.show_output));
            if self.fail {
                return Err(Error::TrainerFailed {
                    program: "vw".into(),
                    status: "exit status: 1".into(),
                    options: request.args.join(" "),
                    stderr: "boom".into(),
                });
            }

            let data = fs::read_to_string(request.data)?;
            self.data_seen.borrow_mut().push(data.clone());

            let bits = request
                .args
                .iter()
                .position(|a| a == "-b")
                .and_then(|i| request.args.get(i + 1))
                .map(String::as_str)
                .unwrap_or("18");

            let preds: Vec<&str> = data
                .lines()
                .enumerate()
                .map(|(i, _)| match (bits, i) {
                    ("1", 0) => "1",
                    ("1", _) => "0",
                    _ => "1",
                })
                .collect();
            fs::write(request.predictions, preds.join("\n") + "\n")?;
            Ok(())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        data: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("simple_w.csv");
        fs::write(
            &data,
            "1,0.1,Hello world,foo\n1,1.0,good day,bar\n2,1.0,bad day,baz\n",
        )
        .unwrap();
        Fixture { dir, data }
    }

    fn options(fx: &Fixture, columnspec: &str, vw_args: &str) -> RunOptions {
        RunOptions {
            data: fx.data.clone(),
            columnspec: columnspec.to_string(),
            dataset: DatasetOptions::default(),
            metrics: vec![Metric::Acc, Metric::AccW],
            preprocessing: PreprocessingSpace::default(),
            vw_args: vw_args.split_whitespace().map(String::from).collect(),
            workdir: fx.dir.path().join(".vwoptimize"),
            tovw: None,
            results_json: None,
        }
    }

    fn run_to_string(opts: &RunOptions, trainer: &FakeTrainer) -> (RunSummary, String) {
        let mut out = Vec::new();
        let summary = run(opts, trainer, &mut out).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_weight_ignored() {
        let fx = fixture();
        let trainer = FakeTrainer::default();
        let (summary, out) = run_to_string(&options(&fx, "y,drop,text,text", ""), &trainer);

        assert!((summary.dataset.weighted_example_sum - 3.0).abs() < 1e-9);
        assert!((summary.dataset.weighted_label_sum - 4.0).abs() < 1e-9);
        assert_eq!(out, "acc = 0.666667\nacc_w = 0.666667\n");
        assert!(trainer.data_seen.borrow()[0].starts_with("1 | Hello world foo\n"));
    }

    #[test]
    fn test_weight_both() {
        let fx = fixture();
        let trainer = FakeTrainer::default();
        let (summary, out) = run_to_string(&options(&fx, "y,weight,text,text", ""), &trainer);

        assert!((summary.dataset.weighted_example_sum - 2.1).abs() < 1e-9);
        assert!((summary.dataset.weighted_label_sum - 3.1).abs() < 1e-9);
        assert_eq!(out, "acc = 0.666667\nacc_w = 0.52381\n");
        assert!(trainer.data_seen.borrow()[0].starts_with("1 0.1 | Hello world foo\n"));
    }

    #[test]
    fn test_weight_metric_only() {
        let fx = fixture();
        let trainer = FakeTrainer::default();
        let (summary, out) =
            run_to_string(&options(&fx, "y,weight_metric,text,text", ""), &trainer);

        assert!((summary.dataset.weighted_example_sum - 3.0).abs() < 1e-9);
        assert!((summary.dataset.weighted_label_sum - 4.0).abs() < 1e-9);
        assert_eq!(out, "acc = 0.666667\nacc_w = 0.52381\n");
        assert!(trainer.data_seen.borrow()[0].starts_with("1 | Hello"));
    }

    #[test]
    fn test_weight_train_only() {
        let fx = fixture();
        let trainer = FakeTrainer::default();
        let (summary, out) =
            run_to_string(&options(&fx, "y,weight_train,text,text", ""), &trainer);

        assert!((summary.dataset.weighted_example_sum - 2.1).abs() < 1e-9);
        assert!((summary.dataset.weighted_label_sum - 3.1).abs() < 1e-9);
        assert_eq!(out, "acc = 0.666667\nacc_w = 0.666667\n");
        assert!(trainer.data_seen.borrow()[0].starts_with("1 0.1 | Hello"));
    }

    #[test]
    fn test_tune_bits() {
        let fx = fixture();
        let trainer = FakeTrainer::default();
        let (summary, out) = run_to_string(
            &options(&fx, "y,weight,text,text", "-b 1/2/3? --quiet"),
            &trainer,
        );

        let expected = "\
Result vw --quiet -b 1... acc=0.3333   acc_w=0.0476
Result vw --quiet -b 2... acc=0.6667*  acc_w=0.5238
Result vw --quiet -b 3... acc=0.6667   acc_w=0.5238
Best acc with 'no preprocessing' = 0.6667*
Best preprocessor options = <none>
Best vw options = --quiet -b 2
Best acc = 0.6667
acc = 0.666667
acc_w = 0.52381
";
        assert_eq!(out, expected);
        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.best.as_ref().map(|b| b.options()).as_deref(), Some("--quiet -b 2"));

        // Only the final re-run shows trainer output
        let calls = trainer.calls.borrow();
        assert_eq!(calls.len(), 4);
        assert!(calls[..3].iter().all(|(_, shown)| !shown));
        let expected_args: Vec<String> = vec!["--quiet".into(), "-b".into(), "2".into()];
        assert_eq!(calls[3], (expected_args, true));
    }

    #[test]
    fn test_rerun_is_identical() {
        let fx = fixture();
        let opts = options(&fx, "y,weight,text,text", "-b 1/2/3? --quiet");
        let (_, first) = run_to_string(&opts, &FakeTrainer::default());
        let (_, second) = run_to_string(&opts, &FakeTrainer::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_workdir_empty_after_run() {
        let fx = fixture();
        let opts = options(&fx, "y,weight,text,text", "-b 1/2/3? --quiet");
        run_to_string(&opts, &FakeTrainer::default());
        assert_eq!(fs::read_dir(&opts.workdir).unwrap().count(), 0);
    }

    #[test]
    fn test_trainer_failure_aborts_and_cleans_up() {
        let fx = fixture();
        let opts = options(&fx, "y,weight,text,text", "-b 1/2/3?");
        let trainer = FakeTrainer {
            fail: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        let err = run(&opts, &trainer, &mut out).unwrap_err();

        assert!(err.to_string().contains("boom"));
        assert_eq!(trainer.calls.borrow().len(), 1);
        assert_eq!(fs::read_dir(&opts.workdir).unwrap().count(), 0);
    }

    #[test]
    fn test_prediction_path_rejected_before_training() {
        let fx = fixture();
        let opts = options(&fx, "y,weight,text,text", "-p out.txt --quiet");
        let trainer = FakeTrainer::default();
        let mut out = Vec::new();
        let err = run(&opts, &trainer, &mut out).unwrap_err();

        assert!(err.to_string().contains("-p"));
        assert!(trainer.calls.borrow().is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_search_requires_metric() {
        let fx = fixture();
        let mut opts = options(&fx, "y,text,text,text", "-b 1/2?");
        opts.metrics.clear();
        let mut out = Vec::new();
        let err = run(&opts, &FakeTrainer::default(), &mut out).unwrap_err();
        assert!(err.to_string().contains("--metric"));
    }

    #[test]
    fn test_single_run_without_metrics() {
        let fx = fixture();
        let mut opts = options(&fx, "y,drop,text,text", "--quiet");
        opts.metrics.clear();
        let trainer = FakeTrainer::default();
        let (summary, out) = run_to_string(&opts, &trainer);
        assert!(out.is_empty());
        assert!(summary.final_scores.is_empty());
        assert_eq!(trainer.calls.borrow().len(), 1);
    }

    #[test]
    fn test_preprocessing_search() {
        let fx = fixture();
        let mut opts = options(&fx, "y,drop,text,text", "--quiet");
        opts.preprocessing.lowercase = Toggle::Tune;
        let trainer = FakeTrainer::default();
        let (summary, out) = run_to_string(&opts, &trainer);

        // Same scores either way: the first combination keeps the star
        assert!(out.contains("Best acc with 'no preprocessing' = 0.6667*\n"));
        assert!(out.contains("Best acc with '--lowercase' = 0.6667\n"));
        assert!(out.contains("Best preprocessor options = <none>\n"));
        assert_eq!(summary.results.len(), 2);

        let data = trainer.data_seen.borrow();
        assert!(data[0].contains("Hello"));
        assert!(data[1].contains("hello"));
    }

    #[test]
    fn test_tovw_to_writer() {
        let fx = fixture();
        let mut opts = options(&fx, "y,weight,text,drop", "");
        opts.tovw = Some(PathBuf::from("-"));
        opts.preprocessing.lowercase = Toggle::On;
        let trainer = FakeTrainer::default();
        let (_, out) = run_to_string(&opts, &trainer);

        assert_eq!(out, "1 0.1 | hello world\n1 1 | good day\n2 1 | bad day\n");
        assert!(trainer.calls.borrow().is_empty());
        assert!(!opts.workdir.exists());
    }

    #[test]
    fn test_results_json() {
        let fx = fixture();
        let mut opts = options(&fx, "y,weight,text,text", "-b 1/2?");
        let json_path = fx.dir.path().join("results.json");
        opts.results_json = Some(json_path.clone());
        run_to_string(&opts, &FakeTrainer::default());

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["results"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(value["best"]["vw_args"][1], "2");
        assert_eq!(value["results"][0]["scores"][0][0], "acc");
    }
}
