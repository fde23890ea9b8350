use clap::Parser;
use std::{ffi::OsString, path::PathBuf};

// flags that consume the next token as their value
const VALUE_FLAGS: [&str; 7] = [
    "runner",
    "gsdir",
    "dumpdir",
    "renderer",
    "upscale",
    "renderhacks",
    "parallel",
];
const SWITCH_FLAGS: [&str; 3] = ["strict", "dry-run", "normal-priority"];

/// Generate frame dump images for regression tests
#[derive(Debug, Parser)]
#[command(name = "gsregress", version, about)]
pub struct Cli {
    /// Path to the GS runner executable
    #[arg(long)]
    pub runner: PathBuf,

    /// Directory containing GS dumps
    #[arg(long)]
    pub gsdir: PathBuf,

    /// Base directory to dump frames to
    #[arg(long)]
    pub dumpdir: PathBuf,

    /// Renderer to use
    #[arg(long, allow_hyphen_values = true)]
    pub renderer: Option<String>,

    /// Upscaling multiplier to use
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub upscale: f64,

    /// Enable HW rendering hacks
    #[arg(long, allow_hyphen_values = true)]
    pub renderhacks: Option<String>,

    /// Number of runner processes to launch
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub parallel: i64,

    /// Fail the run when any runner fails to launch or exits non-zero
    #[arg(long)]
    pub strict: bool,

    /// Print the planned invocations as JSON lines instead of launching them
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Launch runners at normal priority
    #[arg(long = "normal-priority")]
    pub normal_priority: bool,
}

impl Cli {
    /// Parse the process arguments, accepting the single-dash long flags regression scripts use.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }
}

/// Rewrite `-runner x` style flags into `--runner x` so clap can take them. Values following a
/// flag are copied as-is, even when they start with a dash, and everything after `--` is left
/// alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut iter = args.into_iter().map(Into::into);
    let mut col: Vec<OsString> = iter.next().into_iter().collect();

    while let Some(arg) = iter.next() {
        let Some(text) = arg.to_str() else {
            col.push(arg);
            continue;
        };

        if text == "--" {
            col.push(arg);
            col.extend(iter.by_ref());
            break;
        }

        match known_flag(text) {
            Some(takes_value) => {
                let inline_value = text.contains('=');
                let long = if text.starts_with("--") {
                    text.to_owned()
                } else {
                    format!("-{text}")
                };
                col.push(long.into());
                if takes_value && !inline_value {
                    if let Some(value) = iter.next() {
                        col.push(value);
                    }
                }
            }
            None => col.push(arg),
        }
    }

    col
}

// Some(takes_value) when `text` is one of ours, in either dash form
fn known_flag(text: &str) -> Option<bool> {
    let body = text
        .strip_prefix("--")
        .or_else(|| text.strip_prefix('-'))?;
    let name = body.split_once('=').map_or(body, |(name, _)| name);
    if VALUE_FLAGS.contains(&name) {
        Some(true)
    } else if SWITCH_FLAGS.contains(&name) {
        Some(false)
    } else {
        None
    }
}
