//! Command-line interface implementation for render.
//! Provides argument parsing and resolution of the rendering mode.

use clap::Parser;
use std::path::PathBuf;

use crate::constants::DESCRIPTION;
use crate::error::{Error, Result};

/// Command-line arguments structure for render.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = DESCRIPTION,
    long_about = None,
    after_help = "Templates use Jinja syntax: '{{ }}' prints a value, '{% %}' marks a statement and '{# #}' a comment. \
                  In directory mode every file is rendered, so these sequences must be escaped in plain files, \
                  for example with '{% raw %}...{% endraw %}'."
)]
pub struct Args {
    /// Enable debug logging output
    #[arg(short, long)]
    pub debug: bool,

    /// The input template file, stdin if empty, can't be used with --indir or --outdir
    #[arg(long = "in", value_name = "FILE", conflicts_with_all = ["indir", "outdir"])]
    pub input: Option<PathBuf>,

    /// The output file, stdout if empty, can't be used with --indir or --outdir
    #[arg(long = "out", value_name = "FILE", conflicts_with_all = ["indir", "outdir"])]
    pub output: Option<PathBuf>,

    /// The input directory, can't be used with --in or --out
    #[arg(long, value_name = "DIR")]
    pub indir: Option<PathBuf>,

    /// The output directory, the same as --indir if empty, can't be used with --in or --out
    #[arg(long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Optional configuration YAML file, can be used multiple times
    #[arg(long = "config", value_name = "FILE")]
    pub configs: Vec<PathBuf>,

    /// Additional parameters in key=value format, can be used multiple times
    #[arg(long = "var", visible_alias = "set", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Do not fail on missing map keys and print '<no value>' instead
    #[arg(long)]
    pub unsafe_ignore_missing_keys: bool,

    /// In directory mode, render the remaining files after a failure
    #[arg(long)]
    pub keep_going: bool,
}

/// Where templates come from and where the output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Single template; `None` selects stdin or stdout
    File {
        input: Option<PathBuf>,
        output: Option<PathBuf>,
    },
    /// Directory tree
    Dir { input: PathBuf, output: PathBuf },
}

impl Args {
    /// Resolves the rendering mode, rejecting mixed file and directory flags.
    ///
    /// # Errors
    /// * `Error::UsageConflict` if file and directory flags are combined or
    ///   `--outdir` is given without `--indir`
    pub fn mode(&self) -> Result<Mode> {
        match (&self.indir, &self.outdir) {
            (Some(indir), outdir) => {
                if self.input.is_some() {
                    return Err(Error::UsageConflict("--in can't be used with --indir or --outdir".into()));
                }
                if self.output.is_some() {
                    return Err(Error::UsageConflict("--out can't be used with --indir or --outdir".into()));
                }
                Ok(Mode::Dir {
                    input: indir.clone(),
                    output: outdir.clone().unwrap_or_else(|| indir.clone()),
                })
            }
            (None, Some(_)) => Err(Error::UsageConflict("--outdir can't be used without --indir".into())),
            (None, None) => Ok(Mode::File {
                input: self.input.clone(),
                output: self.output.clone(),
            }),
        }
    }
}

/// Parses command line arguments, exiting with clap's usage handling on
/// invalid input.
pub fn get_args() -> Args {
    Args::parse()
}
