//! Rendering examples as VW input lines.
//!
//! ```text
//! label [weight] ['tag]| word word c3=red c4:0.5 [raw vw text]
//! ```
//!
//! `|` and `:` are structural in VW, and whitespace separates features, so
//! they are replaced inside feature tokens.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::dataset::Dataset;
use super::model::{Example, Feature};
use super::preprocess::Preprocessing;
use crate::error::Result;

/// Replace characters VW would read as syntax.
pub fn escape_token(token: &str) -> Cow<'_, str> {
    if !token.contains(['|', ':']) && !token.contains(char::is_whitespace) {
        return Cow::Borrowed(token);
    }
    Cow::Owned(
        token
            .chars()
            .map(|c| match c {
                '|' => '/',
                ':' => ';',
                c if c.is_whitespace() => '_',
                c => c,
            })
            .collect(),
    )
}

/// Render one example as a VW line (without trailing newline).
pub fn to_vw_line(example: &Example, write_weight: bool, preprocessing: &Preprocessing) -> String {
    let mut line = example.label.to_string();

    if write_weight {
        line.push(' ');
        line.push_str(&example.training_weight.to_string());
    }

    match &example.tag {
        Some(tag) => {
            line.push_str(" '");
            line.push_str(&escape_token(tag));
            line.push('|');
        }
        None => line.push_str(" |"),
    }

    for feature in &example.features {
        match feature {
            Feature::Words { text, .. } => {
                let text = preprocessing.apply(text);
                for word in text.split_whitespace() {
                    line.push(' ');
                    line.push_str(&escape_token(word));
                }
            }
            Feature::Categorical { column, value } => {
                line.push_str(&format!(" c{}={}", column + 1, escape_token(value)));
            }
            Feature::Numeric { column, value } => {
                line.push_str(&format!(" c{}:{}", column + 1, value));
            }
            Feature::Raw(text) => {
                line.push(' ');
                line.push_str(text);
            }
        }
    }

    line
}

/// Write a whole dataset in VW format.
pub fn write_dataset<W: Write>(
    out: &mut W,
    dataset: &Dataset,
    preprocessing: &Preprocessing,
) -> Result<()> {
    let write_weight = dataset.spec.has_training_weight();
    for example in &dataset.examples {
        writeln!(out, "{}", to_vw_line(example, write_weight, preprocessing))?;
    }
    Ok(())
}

pub fn write_dataset_file(
    path: &Path,
    dataset: &Dataset,
    preprocessing: &Preprocessing,
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_dataset(&mut out, dataset, preprocessing)?;
    out.flush()?;
    Ok(())
}
