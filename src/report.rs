//! User-facing output lines.
//!
//! Two number formats are used: the final metric lines print six
//! significant digits in `%g` style (`0.666667`, `0.52381`), while the
//! search table prints four fixed decimals.

use crate::data::Preprocessing;
use crate::training::{Metric, RunResult};

/// Significant digits of [`format_g`].
const G_PRECISION: i32 = 6;

/// Format like C's `%g`: six significant digits, trailing zeros dropped,
/// scientific notation for very small or large magnitudes.
pub fn format_g(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    // Round first; the exponent after rounding decides the notation
    let sci = format!("{:.*e}", (G_PRECISION - 1) as usize, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= G_PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (G_PRECISION - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// `acc = 0.666667`
pub fn metric_line(metric: Metric, value: f64) -> String {
    format!("{} = {}", metric, format_g(value))
}

/// `Result vw --quiet -b 2... acc=0.6667*  acc_w=0.5238`
///
/// The primary (first) metric carries a `*` when the result improved on
/// everything before it, a space otherwise, so columns stay aligned.
pub fn result_line(result: &RunResult, improved: bool) -> String {
    let fields: Vec<String> = result
        .scores
        .iter()
        .enumerate()
        .map(|(i, (metric, value))| {
            let mark = match (i, improved) {
                (0, true) => "*",
                (0, false) => " ",
                _ => "",
            };
            format!("{}={:.4}{}", metric, value, mark)
        })
        .collect();

    format!("Result vw {}... {}", result.options(), fields.join("  "))
}

/// `Best acc with 'no preprocessing' = 0.6667*`
pub fn best_with_line(
    metric: Metric,
    preprocessing: &Preprocessing,
    value: f64,
    overall_best: bool,
) -> String {
    format!(
        "Best {} with '{}' = {:.4}{}",
        metric,
        preprocessing.describe(),
        value,
        if overall_best { "*" } else { "" }
    )
}

/// The closing summary of a search.
pub fn summary_lines(metric: Metric, best: &RunResult) -> Vec<String> {
    let value = best.score(metric).unwrap_or(f64::NAN);
    vec![
        format!("Best preprocessor options = {}", best.preprocessing),
        format!("Best vw options = {}", best.options()),
        format!("Best {} = {:.4}", metric, value),
    ]
}
