//! render's main application entry point and orchestration logic.
//! Handles command-line argument parsing, configuration assembly and
//! dispatching to file or directory rendering.

use log::{info, warn};

use render::{
    cli::{get_args, Args, Mode},
    config,
    constants::{NAME, NO_VALUE},
    error::{default_error_handler, Result},
    functions,
    logger::init_logger,
    processor::FailurePolicy,
    renderer::{MissingKey, Renderer},
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.debug);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Resolves file or directory mode, rejecting conflicting flags
/// 2. Assembles parameters from base, configuration files and variables
/// 3. Builds the renderer with the extra functions
/// 4. Renders the file or directory
fn run(args: Args) -> Result<()> {
    let mode = args.mode()?;

    let missing_key = if args.unsafe_ignore_missing_keys {
        warn!("You are using '--unsafe-ignore-missing-keys', {NAME} will print '{NO_VALUE}' for missing keys");
        MissingKey::Invalid
    } else {
        MissingKey::Error
    };

    if !args.configs.is_empty() {
        let configs: Vec<_> = args.configs.iter().map(|p| p.display().to_string()).collect();
        info!("Configurations:\n\t{}", configs.join("\n\t"));
    }
    if !args.vars.is_empty() {
        info!("Variables:\n\t{}", args.vars.join("\n\t"));
    }
    let parameters = config::all(&args.configs, &args.vars)?;

    let failure_policy = if args.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::Abort
    };
    let renderer = Renderer::new(parameters)
        .with_missing_key(missing_key)
        .with_functions(functions::extra())
        .with_failure_policy(failure_policy);

    match mode {
        Mode::Dir { input, output } => renderer.dir_render(input, output),
        Mode::File { input, output } => {
            renderer.file_render(input.unwrap_or_default(), output.unwrap_or_default())
        }
    }
}
