//! Column roles and the row → example transform.
//!
//! A column spec is a comma separated list of roles, one per input column:
//!
//! ```text
//! y,weight,text,text
//! │   │     └────┴── word features
//! │   └── per-row weight (training and metric)
//! └── label
//! ```
//!
//! Weight columns carry a [`WeightUse`] tag instead of being separate
//! roles, so `weight`, `weight_train` and `weight_metric` all go through
//! the same code path and only differ in where the value ends up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::model::{Example, Feature, Row};
use crate::error::{Error, Result};

/// Where a weight column's value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightUse {
    /// `weight`: scales training influence and metric contribution
    Both,
    /// `weight_train`: scales training influence only
    Train,
    /// `weight_metric`: scales metric contribution only
    Metric,
}

impl WeightUse {
    pub fn trains(self) -> bool {
        matches!(self, WeightUse::Both | WeightUse::Train)
    }

    pub fn scores(self) -> bool {
        matches!(self, WeightUse::Both | WeightUse::Metric)
    }
}

/// How a feature column is turned into VW features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Whitespace separated words
    Text,
    /// Whole field is a single categorical value
    Categorical,
    /// Field is a real-valued feature
    Numeric,
    /// Field already holds VW feature syntax
    Raw,
}

/// Role of a single input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Label,
    Drop,
    /// Carried as the example tag, not used as a feature
    Info,
    Feature(FeatureKind),
    Weight(WeightUse),
}

impl FromStr for ColumnRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let role = match s.trim() {
            "y" => ColumnRole::Label,
            "drop" => ColumnRole::Drop,
            "info" => ColumnRole::Info,
            "text" => ColumnRole::Feature(FeatureKind::Text),
            "cat" => ColumnRole::Feature(FeatureKind::Categorical),
            "num" => ColumnRole::Feature(FeatureKind::Numeric),
            "vw" => ColumnRole::Feature(FeatureKind::Raw),
            "weight" => ColumnRole::Weight(WeightUse::Both),
            "weight_train" => ColumnRole::Weight(WeightUse::Train),
            "weight_metric" => ColumnRole::Weight(WeightUse::Metric),
            other => {
                return Err(Error::ColumnSpec(format!(
                    "unknown column role '{other}' \
                     (expected y, drop, info, text, cat, num, vw, weight, weight_train, weight_metric)"
                )));
            }
        };
        Ok(role)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Label => "y",
            ColumnRole::Drop => "drop",
            ColumnRole::Info => "info",
            ColumnRole::Feature(FeatureKind::Text) => "text",
            ColumnRole::Feature(FeatureKind::Categorical) => "cat",
            ColumnRole::Feature(FeatureKind::Numeric) => "num",
            ColumnRole::Feature(FeatureKind::Raw) => "vw",
            ColumnRole::Weight(WeightUse::Both) => "weight",
            ColumnRole::Weight(WeightUse::Train) => "weight_train",
            ColumnRole::Weight(WeightUse::Metric) => "weight_metric",
        };
        f.write_str(name)
    }
}

/// Positional role assignment for the columns of an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    roles: Vec<ColumnRole>,
}

impl ColumnSpec {
    /// Parse a comma separated role list.
    ///
    /// Requires exactly one `y` column. `weight` cannot be combined with
    /// `weight_train` or `weight_metric`, and each usage may appear once.
    pub fn parse(spec: &str) -> Result<Self> {
        if spec.trim().is_empty() {
            return Err(Error::ColumnSpec("column spec is empty".into()));
        }

        let roles = spec
            .split(',')
            .map(ColumnRole::from_str)
            .collect::<Result<Vec<_>>>()?;

        Self::from_roles(roles)
    }

    pub fn from_roles(roles: Vec<ColumnRole>) -> Result<Self> {
        match roles.iter().filter(|r| **r == ColumnRole::Label).count() {
            1 => {}
            0 => return Err(Error::ColumnSpec("no label column ('y') specified".into())),
            n => {
                return Err(Error::ColumnSpec(format!(
                    "exactly one label column allowed, found {n}"
                )));
            }
        }

        let weights: Vec<WeightUse> = roles
            .iter()
            .filter_map(|r| match r {
                ColumnRole::Weight(usage) => Some(*usage),
                _ => None,
            })
            .collect();

        for (i, usage) in weights.iter().enumerate() {
            for other in &weights[i + 1..] {
                if usage == other {
                    return Err(Error::ColumnSpec(format!(
                        "weight column '{}' specified more than once",
                        ColumnRole::Weight(*usage)
                    )));
                }
                if (usage.trains() && other.trains()) || (usage.scores() && other.scores()) {
                    return Err(Error::ColumnSpec(format!(
                        "'{}' conflicts with '{}'",
                        ColumnRole::Weight(*usage),
                        ColumnRole::Weight(*other)
                    )));
                }
            }
        }

        Ok(Self { roles })
    }

    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Whether examples carry a weight that VW must see.
    pub fn has_training_weight(&self) -> bool {
        self.roles
            .iter()
            .any(|r| matches!(r, ColumnRole::Weight(usage) if usage.trains()))
    }

    /// Whether metrics are computed with per-row weights.
    pub fn has_metric_weight(&self) -> bool {
        self.roles
            .iter()
            .any(|r| matches!(r, ColumnRole::Weight(usage) if usage.scores()))
    }

    /// Turn one row into an example.
    ///
    /// Weights default to 1.0 when no column supplies them. An empty weight
    /// field also counts as 1.0.
    pub fn interpret(&self, row: &Row) -> Result<Example> {
        if row.fields.len() != self.roles.len() {
            return Err(Error::ColumnCount {
                row: row.line,
                expected: self.roles.len(),
                found: row.fields.len(),
            });
        }

        let mut example = Example {
            label: 0.0,
            training_weight: 1.0,
            metric_weight: 1.0,
            features: Vec::new(),
            tag: None,
        };

        for (column, (role, field)) in self.roles.iter().zip(&row.fields).enumerate() {
            match role {
                ColumnRole::Label => {
                    example.label = parse_number(field, row.line, "label")?;
                }
                ColumnRole::Drop => {}
                ColumnRole::Info => {
                    example.tag = Some(field.clone());
                }
                ColumnRole::Weight(usage) => {
                    let weight = parse_weight(field, row.line)?;
                    if usage.trains() {
                        example.training_weight = weight;
                    }
                    if usage.scores() {
                        example.metric_weight = weight;
                    }
                }
                ColumnRole::Feature(kind) => {
                    if let Some(feature) = interpret_feature(*kind, column, field, row.line)? {
                        example.features.push(feature);
                    }
                }
            }
        }

        Ok(example)
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.roles.iter().map(|r| r.to_string()).collect();
        f.write_str(&names.join(","))
    }
}

fn interpret_feature(
    kind: FeatureKind,
    column: usize,
    field: &str,
    line: usize,
) -> Result<Option<Feature>> {
    if field.trim().is_empty() {
        return Ok(None);
    }

    let feature = match kind {
        FeatureKind::Text => Feature::Words {
            column,
            text: field.to_string(),
        },
        FeatureKind::Categorical => Feature::Categorical {
            column,
            value: field.trim().to_string(),
        },
        FeatureKind::Numeric => Feature::Numeric {
            column,
            value: parse_number(field, line, &format!("column {}", column + 1))?,
        },
        FeatureKind::Raw => Feature::Raw(field.trim().to_string()),
    };
    Ok(Some(feature))
}

fn parse_number(field: &str, line: usize, column: &str) -> Result<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::NotNumeric {
            row: line,
            column: column.to_string(),
            value: field.to_string(),
        })
}

fn parse_weight(field: &str, line: usize) -> Result<f64> {
    if field.trim().is_empty() {
        return Ok(1.0);
    }
    let weight = parse_number(field, line, "weight")?;
    if weight < 0.0 {
        return Err(Error::NegativeWeight {
            row: line,
            value: weight,
        });
    }
    Ok(weight)
}
