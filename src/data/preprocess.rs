//! Text normalisation for `text` columns.
//!
//! Each option can be fixed on (`--lowercase`) or tuned (`--lowercase?`),
//! in which case both settings are evaluated and the better one wins.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Anything that is not a word character or whitespace.
static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]+").unwrap());

/// One concrete preprocessing setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Preprocessing {
    pub lowercase: bool,
    pub strip_punct: bool,
}

impl Preprocessing {
    pub fn is_noop(&self) -> bool {
        !self.lowercase && !self.strip_punct
    }

    /// Normalise free text.
    pub fn apply(&self, text: &str) -> String {
        let mut out = if self.strip_punct {
            PUNCT_RE.replace_all(text, " ").into_owned()
        } else {
            text.to_string()
        };
        if self.lowercase {
            out = out.to_lowercase();
        }
        out
    }

    /// Command-line form of the enabled options.
    pub fn args(&self) -> Vec<&'static str> {
        let mut args = Vec::new();
        if self.lowercase {
            args.push("--lowercase");
        }
        if self.strip_punct {
            args.push("--strip_punct");
        }
        args
    }

    /// Label used in the per-preprocessing summary lines.
    pub fn describe(&self) -> String {
        if self.is_noop() {
            "no preprocessing".to_string()
        } else {
            self.args().join(" ")
        }
    }
}

impl fmt::Display for Preprocessing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.args().join(" "))
        }
    }
}

/// Whether a preprocessing option is off, on, or searched over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Toggle {
    #[default]
    Off,
    On,
    Tune,
}

impl Toggle {
    fn choices(self) -> &'static [bool] {
        match self {
            Toggle::Off => &[false],
            Toggle::On => &[true],
            Toggle::Tune => &[false, true],
        }
    }
}

/// The set of preprocessing settings to evaluate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessingSpace {
    pub lowercase: Toggle,
    pub strip_punct: Toggle,
}

impl PreprocessingSpace {
    /// All combinations, options off before on.
    pub fn combinations(&self) -> Vec<Preprocessing> {
        let mut out = Vec::new();
        for &lowercase in self.lowercase.choices() {
            for &strip_punct in self.strip_punct.choices() {
                out.push(Preprocessing {
                    lowercase,
                    strip_punct,
                });
            }
        }
        out
    }
}
