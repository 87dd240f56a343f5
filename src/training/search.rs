//! Flat enumeration over a [`SearchSpace`].
//!
//! 1. Every grid point is evaluated, tuned options at their first value.
//! 2. Each tuned option in turn is swept over all its values while every
//!    other option stays at the best configuration found so far.
//!
//! Results are cached by argument list, so a configuration reached twice
//! is evaluated (and reported) once. The best result is the first one to
//! reach the best primary score; later ties never replace it.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::gridsearch::{Configuration, SearchSpace};
use super::metrics::Metric;
use crate::data::Preprocessing;
use crate::error::Result;

/// Scores of one trainer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub preprocessing: Preprocessing,
    pub vw_args: Vec<String>,
    pub scores: Vec<(Metric, f64)>,
}

impl RunResult {
    pub fn score(&self, metric: Metric) -> Option<f64> {
        self.scores
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, v)| *v)
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.score(Metric::Acc)
    }

    pub fn weighted_accuracy(&self) -> Option<f64> {
        self.score(Metric::AccW)
    }

    pub fn options(&self) -> String {
        self.vw_args.join(" ")
    }
}

/// Everything a search evaluated, in evaluation order.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<RunResult>,
    pub best: usize,
}

impl SearchOutcome {
    pub fn best(&self) -> &RunResult {
        &self.results[self.best]
    }
}

struct Searcher<'s, E, R> {
    space: &'s SearchSpace,
    primary: Metric,
    evaluate: E,
    on_result: R,
    results: Vec<RunResult>,
    seen: HashMap<Vec<String>, usize>,
    best: Option<(usize, Configuration)>,
}

impl<E, R> Searcher<'_, E, R>
where
    E: FnMut(&[String]) -> Result<RunResult>,
    R: FnMut(&RunResult, bool) -> Result<()>,
{
    fn visit(&mut self, config: &Configuration) -> Result<()> {
        let args = self.space.args(config);
        if self.seen.contains_key(&args) {
            debug!("already evaluated: {}", args.join(" "));
            return Ok(());
        }

        let result = (self.evaluate)(&args)?;
        let score = result.score(self.primary).unwrap_or(f64::NAN);

        let improved = match &self.best {
            Some((index, _)) => {
                let incumbent = self.results[*index]
                    .score(self.primary)
                    .unwrap_or(f64::NAN);
                self.primary.improves(score, incumbent)
            }
            None => false,
        };

        (self.on_result)(&result, improved)?;

        let index = self.results.len();
        if self.best.is_none() || improved {
            self.best = Some((index, config.clone()));
        }
        self.seen.insert(args, index);
        self.results.push(result);
        Ok(())
    }
}

/// Run the search.
///
/// `evaluate` trains and scores one argument list. `on_result` sees every
/// new result together with whether it strictly improved on all earlier
/// ones (the first result is the baseline and never counts as improved).
pub fn search<E, R>(
    space: &SearchSpace,
    primary: Metric,
    evaluate: E,
    on_result: R,
) -> Result<SearchOutcome>
where
    E: FnMut(&[String]) -> Result<RunResult>,
    R: FnMut(&RunResult, bool) -> Result<()>,
{
    let mut searcher = Searcher {
        space,
        primary,
        evaluate,
        on_result,
        results: Vec::new(),
        seen: HashMap::new(),
        best: None,
    };

    for config in space.grid_points() {
        searcher.visit(&config)?;
    }

    for option in space.tuned() {
        let Some((_, base)) = searcher.best.clone() else {
            break;
        };
        let n_choices = space.options()[option].choices.len();
        debug!(
            "tuning {} over {} values",
            space.options()[option].name,
            n_choices
        );
        for choice in 0..n_choices {
            searcher.visit(&base.with_choice(option, choice))?;
        }
    }

    // grid_points() is never empty, so there is always a best
    let best = searcher.best.map(|(i, _)| i).unwrap_or_default();
    Ok(SearchOutcome {
        results: searcher.results,
        best,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    /// Scores keyed by the `-b` value; unknown values score 0.
    fn scorer(table: &'static [(&'static str, f64)]) -> impl FnMut(&[String]) -> Result<RunResult> {
        move |a: &[String]| {
            let bits = a
                .iter()
                .position(|x| x == "-b")
                .and_then(|i| a.get(i + 1))
                .cloned()
                .unwrap_or_default();
            let score = table
                .iter()
                .find(|(b, _)| *b == bits)
                .map(|(_, s)| *s)
                .unwrap_or(0.0);
            Ok(RunResult {
                preprocessing: Preprocessing::default(),
                vw_args: a.to_vec(),
                scores: vec![(Metric::Acc, score)],
            })
        }
    }

    #[test]
    fn test_first_seen_wins_ties() {
        let space = SearchSpace::parse(&args("-b 1/2/3? --quiet")).unwrap();
        let mut marks = Vec::new();
        let outcome = search(
            &space,
            Metric::Acc,
            scorer(&[("1", 1.0 / 3.0), ("2", 2.0 / 3.0), ("3", 2.0 / 3.0)]),
            |r, improved| {
                marks.push((r.options(), improved));
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.best().options(), "--quiet -b 2");
        assert_eq!(
            marks,
            vec![
                ("--quiet -b 1".to_string(), false),
                ("--quiet -b 2".to_string(), true),
                ("--quiet -b 3".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_cached_configurations_not_rerun() {
        let space = SearchSpace::parse(&args("-b 1/2? --ngram 1/2?")).unwrap();
        let mut calls = 0;
        let mut inner = scorer(&[("2", 1.0)]);
        let outcome = search(
            &space,
            Metric::Acc,
            |a: &[String]| {
                calls += 1;
                inner(a)
            },
            |_, _| Ok(()),
        )
        .unwrap();

        // b=1 n=1, b=2 n=1, then ngram sweep from b=2: n=1 cached, n=2 new
        assert_eq!(calls, 3);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.best().options(), "-b 2 --ngram 1");
    }

    #[test]
    fn test_loss_metric_prefers_lower() {
        let space = SearchSpace::parse(&args("-b 1/2/3")).unwrap();
        let outcome = search(
            &space,
            Metric::Mse,
            |a: &[String]| {
                let mse = if a.contains(&"3".to_string()) { 0.1 } else { 0.5 };
                Ok(RunResult {
                    preprocessing: Preprocessing::default(),
                    vw_args: a.to_vec(),
                    scores: vec![(Metric::Mse, mse)],
                })
            },
            |_, _| Ok(()),
        )
        .unwrap();
        assert_eq!(outcome.best().options(), "-b 3");
    }

    #[test]
    fn test_evaluation_error_aborts() {
        let space = SearchSpace::parse(&args("-b 1/2?")).unwrap();
        let result = search(
            &space,
            Metric::Acc,
            |_: &[String]| Err(crate::error::Error::NoMetric),
            |_, _| Ok(()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_run_result_accessors() {
        let r = RunResult {
            preprocessing: Preprocessing::default(),
            vw_args: args("--quiet -b 2"),
            scores: vec![(Metric::Acc, 0.5), (Metric::AccW, 0.25)],
        };
        assert_eq!(r.accuracy(), Some(0.5));
        assert_eq!(r.weighted_accuracy(), Some(0.25));
        assert_eq!(r.score(Metric::Mse), None);
    }
}
