//! render is a command-line text-template renderer.
//! It merges YAML configuration files and `name=value` overrides into a single
//! parameter tree and renders templates from a file, a directory tree or
//! stdin against it, with support for nested, self-referential rendering.

/// Command-line interface module for the render application
pub mod cli;

/// Configuration assembly from working directory, files and variables
pub mod config;

/// Common constants
pub mod constants;

/// Error types and handling for the render application
pub mod error;

/// Extra functions available to templates
pub mod functions;

/// Template input loading from files or piped stdin
pub mod loader;

/// Logger initialisation
pub mod logger;

/// Named-capture regular expression matching
pub mod matcher;

/// The parameter tree and its merge policies
pub mod parameters;

/// File and directory rendering
pub mod processor;

/// Template rendering engine, including nested rendering
pub mod renderer;
