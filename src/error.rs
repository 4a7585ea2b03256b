//! Error handling for the render application.
//! Defines the error taxonomy and the result type used throughout the crate.

use std::io;
use thiserror::Error;

/// Custom error types for render operations.
///
/// Every variant carries enough context (file, template or argument name)
/// to be actionable when printed at the top level.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Mutually exclusive options were supplied together
    #[error("Usage conflict: {0}.")]
    UsageConflict(String),

    /// A named input could not be opened or read
    #[error("Cannot read input '{path}': {source}.")]
    InputUnavailable { path: String, source: io::Error },

    /// No input path was given and stdin is not a pipe
    #[error("Expected piped stdin, --in or --indir parameter, for usage use --help.")]
    ExpectedPipe,

    /// A YAML configuration file failed to parse
    #[error("Cannot parse configuration file '{path}': {source}.")]
    ConfigParseError {
        path: String,
        source: serde_yaml::Error,
    },

    /// A `name=value` argument has the wrong shape
    #[error("Invalid parameter: '{0}'.")]
    InvalidOverrideArgument(String),

    /// A dotted key walks through an existing non-map value
    #[error("Key conflict: key '{key}' already exists and is not a map, it has type: '{kind}'.")]
    KeyConflict { key: String, kind: &'static str },

    /// A key or one of its dotted segments is empty
    #[error("Unexpected empty key in '{0}'.")]
    EmptyKey(String),

    /// A plain merge met a map and a scalar at the same path
    #[error("Merge conflict: key '{key}' has type '{existing}', cannot merge a value of type '{incoming}'.")]
    MergeConflict {
        key: String,
        existing: &'static str,
        incoming: &'static str,
    },

    /// The working directory could not be determined
    #[error("Cannot get the working directory: {0}.")]
    WorkingDirectory(io::Error),

    /// A regular expression failed to compile
    #[error("Invalid expression '{expression}': {source}.")]
    InvalidExpression {
        expression: String,
        source: regex::Error,
    },

    /// The renderer was configured with unusable settings
    #[error("Invalid renderer state: {0}.")]
    InvalidState(String),

    /// Template syntax is invalid under the configured delimiters
    #[error("Cannot parse the template '{name}': {source}.")]
    TemplateParseError {
        name: String,
        source: minijinja::Error,
    },

    /// Template evaluation failed
    #[error("Cannot render the template '{name}': {source}.")]
    TemplateExecutionError {
        name: String,
        source: minijinja::Error,
    },

    /// The destination could not be written
    #[error("Cannot write output '{path}': {source}.")]
    OutputWriteError { path: String, source: io::Error },

    /// A single file of a directory render failed
    #[error("Cannot render '{path}': {source}")]
    DirEntryError { path: String, source: Box<Error> },

    /// Some files of a directory render failed in keep-going mode
    #[error("{failed} of {total} file(s) failed to render in '{dir}'.")]
    PartialRender {
        dir: String,
        failed: usize,
        total: usize,
    },
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
