//! Configuration assembly.
//! Builds the single parameter tree a render runs against from the working
//! directory, YAML configuration files and `name=value` overrides.

use std::fs;
use std::path::Path;

use log::debug;
use serde_json::Value;

use crate::constants::ROOT_KEY;
use crate::error::{Error, Result};
use crate::parameters::Parameters;

/// Creates the configuration from base, configuration files and extra
/// variables, each layer overriding the previous one.
pub fn all<P: AsRef<Path>, S: AsRef<str>>(config_paths: &[P], vars: &[S]) -> Result<Parameters> {
    let base_config = base()?;
    let files_config = from_files(config_paths)?;
    let vars_config = Parameters::from_vars(vars)?;

    Ok(Parameters::merge([base_config, files_config, vars_config]))
}

/// Creates the base configuration, binding `root` to the working directory.
pub fn base() -> Result<Parameters> {
    let pwd = std::env::current_dir().map_err(Error::WorkingDirectory)?;
    let config: Parameters =
        [(ROOT_KEY, Value::String(pwd.display().to_string()))].into_iter().collect();
    debug!("Base configuration: {config:?}");
    Ok(config)
}

/// Creates a configuration from YAML files, later files overriding earlier.
///
/// Empty paths, missing files and zero-length files are skipped.
pub fn from_files<P: AsRef<Path>>(config_paths: &[P]) -> Result<Parameters> {
    let mut accumulator = Parameters::new();
    for (i, config_path) in config_paths.iter().enumerate() {
        let config_path = config_path.as_ref();
        debug!("Reading configuration file [{i}]: {}", config_path.display());
        if is_empty_or_missing(config_path) {
            continue;
        }

        let content = fs::read_to_string(config_path).map_err(|source| Error::InputUnavailable {
            path: config_path.display().to_string(),
            source,
        })?;
        let config: Option<Parameters> =
            serde_yaml::from_str(&content).map_err(|source| Error::ConfigParseError {
                path: config_path.display().to_string(),
                source,
            })?;
        if let Some(config) = config {
            accumulator.merge_override(config);
        }
    }
    debug!("Parameters from files: {accumulator:?}");

    Ok(accumulator)
}

/// Returns true if the path is empty, does not exist or has no content.
pub fn is_empty_or_missing<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        debug!("Configuration file path is empty");
        return true;
    }
    match fs::metadata(path) {
        Err(_) => {
            debug!("Configuration file '{}' does not exist", path.display());
            true
        }
        Ok(metadata) if metadata.len() == 0 => {
            debug!("Configuration file '{}' is empty", path.display());
            true
        }
        Ok(_) => false,
    }
}
