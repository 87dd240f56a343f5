//! Separating wrapper flags from VW flags.
//!
//! The command line mixes both freely (`-d x.csv -b 1/2/3? --metric acc`),
//! and VW option names are open-ended, so clap only ever sees the wrapper's
//! own flags. Everything unrecognised is handed to VW in its original order.
//!
//! `--lowercase` / `--strip_punct` are rewritten to `=on`, and their `?`
//! forms to `=tune`, since clap cannot take `?` in a flag name. The
//! explicit `--lowercase=tune` form is accepted as well.

/// Wrapper options followed by a value.
const VALUE_OPTIONS: &[&str] = &[
    "-d",
    "--data",
    "--columnspec",
    "--metric",
    "--delimiter",
    "--vw",
    "--workdir",
    "--tovw",
    "--results-json",
];

/// Wrapper options without a value.
const FLAG_OPTIONS: &[&str] = &["--header", "-v", "--verbose", "-h", "--help", "-V", "--version"];

/// Preprocessing toggles, optionally suffixed with `?`.
const TOGGLE_OPTIONS: &[&str] = &["--lowercase", "--strip_punct"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitArgs {
    /// Program name followed by wrapper flags, ready for clap
    pub wrapper: Vec<String>,
    /// Everything else, for VW
    pub vw: Vec<String>,
}

pub fn split_args<I>(argv: I) -> SplitArgs
where
    I: IntoIterator<Item = String>,
{
    let mut split = SplitArgs::default();
    let mut iter = argv.into_iter();

    if let Some(program) = iter.next() {
        split.wrapper.push(program);
    }

    while let Some(token) = iter.next() {
        let name = token.split_once('=').map_or(token.as_str(), |(n, _)| n);

        if VALUE_OPTIONS.contains(&name) {
            let inline = name.len() != token.len();
            split.wrapper.push(token);
            if !inline {
                if let Some(value) = iter.next() {
                    split.wrapper.push(value);
                }
            }
        } else if FLAG_OPTIONS.contains(&token.as_str()) {
            split.wrapper.push(token);
        } else if let Some(toggle) = toggle(&token) {
            split.wrapper.push(toggle);
        } else {
            split.vw.push(token);
        }
    }

    split
}

fn toggle(token: &str) -> Option<String> {
    // Explicit `=on` / `=tune`; clap rejects any other value
    if let Some((name, _)) = token.split_once('=') {
        return TOGGLE_OPTIONS.contains(&name).then(|| token.to_string());
    }

    let (name, mode) = match token.strip_suffix('?') {
        Some(name) => (name, "tune"),
        None => (token, "on"),
    };
    TOGGLE_OPTIONS
        .contains(&name)
        .then(|| format!("{name}={mode}"))
}
