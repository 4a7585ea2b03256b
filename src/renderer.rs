//! Template rendering engine built on MiniJinja.
//!
//! A [`Renderer`] binds one parameter tree, the delimiter pair, the
//! missing-key policy and an immutable function set. Templates can call back
//! into the renderer through `render`, optionally with extra parameters that
//! are merged over a copy of the current tree for that call only.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use minijinja::syntax::SyntaxConfig;
use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{escape_formatter, AutoEscape, Environment, ErrorKind, Output, State, UndefinedBehavior};

use crate::constants::{DEFAULT_NAME, LEFT_DELIMITER, NESTED_NAME, NO_VALUE, RIGHT_DELIMITER};
use crate::error::{Error, Result};
use crate::functions::FunctionSet;
use crate::parameters::Parameters;
use crate::processor::{self, FailurePolicy};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders `template`, using `name` in diagnostics.
    ///
    /// # Errors
    /// * `Error::InvalidState` if the engine is misconfigured
    /// * `Error::TemplateParseError` if the template does not parse
    /// * `Error::TemplateExecutionError` if evaluation fails
    fn named_render(&self, name: &str, template: &str) -> Result<String>;

    /// Renders `template` under a default diagnostic name.
    fn render(&self, template: &str) -> Result<String> {
        self.named_render(DEFAULT_NAME, template)
    }
}

/// What happens when a template looks up a key the parameters lack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingKey {
    /// Abort rendering with an error
    #[default]
    Error,
    /// Print `<no value>` and continue
    Invalid,
}

/// MiniJinja-based template rendering engine.
///
/// Cloning is cheap: the parameter tree and the function set are shared.
#[derive(Debug, Clone)]
pub struct Renderer {
    parameters: Arc<Parameters>,
    left_delimiter: String,
    right_delimiter: String,
    missing_key: MissingKey,
    functions: Arc<FunctionSet>,
    failure_policy: FailurePolicy,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(Parameters::new())
    }
}

impl Renderer {
    /// Creates a renderer over `parameters` with no extra functions.
    pub fn new(parameters: Parameters) -> Self {
        Self {
            parameters: Arc::new(parameters),
            left_delimiter: LEFT_DELIMITER.to_string(),
            right_delimiter: RIGHT_DELIMITER.to_string(),
            missing_key: MissingKey::default(),
            functions: Arc::new(FunctionSet::new()),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_delimiters<L: Into<String>, R: Into<String>>(mut self, left: L, right: R) -> Self {
        self.left_delimiter = left.into();
        self.right_delimiter = right.into();
        self
    }

    pub fn with_missing_key(mut self, missing_key: MissingKey) -> Self {
        self.missing_key = missing_key;
        self
    }

    /// Layers `functions` over the current set, later names winning.
    pub fn with_functions(mut self, functions: FunctionSet) -> Self {
        self.functions = Arc::new(self.functions.as_ref().clone().extend(functions));
        self
    }

    /// Decides whether a directory render stops at the first failing file.
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn functions(&self) -> &FunctionSet {
        &self.functions
    }

    /// Renders the file at `input` (stdin if empty) into `output` (stdout
    /// if empty).
    pub fn file_render<I: AsRef<Path>, O: AsRef<Path>>(&self, input: I, output: O) -> Result<()> {
        processor::render_file(self, input.as_ref(), output.as_ref())
    }

    /// Renders every file under `input_dir` into the mirrored path under
    /// `output_dir`, stripping template extensions.
    pub fn dir_render<I: AsRef<Path>, O: AsRef<Path>>(&self, input_dir: I, output_dir: O) -> Result<()> {
        processor::render_dir(self, input_dir.as_ref(), output_dir.as_ref(), self.failure_policy)
    }

    /// Renders a template from inside template evaluation.
    ///
    /// Accepts `[template]`, rendered against this renderer's parameters, or
    /// `[extra, template]`, rendered by a child renderer whose parameters are
    /// these parameters override-merged with `extra`.
    pub fn nested_render(&self, args: &[Value]) -> std::result::Result<String, minijinja::Error> {
        match args {
            [template] => {
                let template = expect_str(template, 1)?;
                self.named_render(NESTED_NAME, template).map_err(nested_failure)
            }
            [extra, template] => {
                let extra = expect_map(extra, 1)?;
                let template = expect_str(template, 2)?;
                self.child(extra).named_render(NESTED_NAME, template).map_err(nested_failure)
            }
            _ => {
                let kind = if args.is_empty() {
                    ErrorKind::MissingArgument
                } else {
                    ErrorKind::TooManyArguments
                };
                Err(minijinja::Error::new(
                    kind,
                    format!("expected 1 or 2 parameters, got {}", args.len()),
                ))
            }
        }
    }

    /// A renderer sharing everything but the parameters, which are a copy of
    /// ours with `extra` merged over them.
    pub fn child(&self, extra: Parameters) -> Renderer {
        let parameters = Parameters::merge([self.parameters.as_ref().clone(), extra]);
        Renderer {
            parameters: Arc::new(parameters),
            ..self.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.left_delimiter.is_empty() || self.right_delimiter.is_empty() {
            return Err(Error::InvalidState(format!(
                "delimiters must not be empty, got '{}' and '{}'",
                self.left_delimiter, self.right_delimiter
            )));
        }
        if self.left_delimiter == self.right_delimiter {
            return Err(Error::InvalidState(format!(
                "left and right delimiters must differ, got '{}' for both",
                self.left_delimiter
            )));
        }
        Ok(())
    }

    /// Builds the environment for one render call.
    ///
    /// Custom delimiters also move statements and comments next to them:
    /// with `[[` `]]`, blocks are `[[% %]]` and comments `[[# #]]`, so a
    /// literal `{%` or `{#` in the template is plain text.
    ///
    /// `render` is attached last, bound to this renderer, so it shadows a
    /// same-named entry of the function set.
    fn environment<'source>(&self) -> Result<Environment<'source>> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        if self.left_delimiter != LEFT_DELIMITER || self.right_delimiter != RIGHT_DELIMITER {
            let (left, right) = (&self.left_delimiter, &self.right_delimiter);
            let syntax = SyntaxConfig::builder()
                .variable_delimiters(left.clone(), right.clone())
                .block_delimiters(format!("{left}%"), format!("%{right}"))
                .comment_delimiters(format!("{left}#"), format!("#{right}"))
                .build()
                .map_err(|e| Error::InvalidState(e.to_string()))?;
            env.set_syntax(syntax);
        }

        match self.missing_key {
            MissingKey::Error => env.set_undefined_behavior(UndefinedBehavior::Strict),
            MissingKey::Invalid => {
                env.set_undefined_behavior(UndefinedBehavior::Chainable);
                env.set_formatter(no_value_formatter);
            }
        }

        self.functions.register(&mut env);

        let renderer = self.clone();
        env.add_function("render", move |args: Rest<Value>| renderer.nested_render(&args));
        let renderer = self.clone();
        env.add_filter("render", move |template: Value, args: Rest<Value>| {
            let mut all = args.0;
            all.push(template);
            renderer.nested_render(&all)
        });

        Ok(env)
    }
}

impl TemplateRenderer for Renderer {
    fn named_render(&self, name: &str, template: &str) -> Result<String> {
        self.validate()?;
        let env = self.environment()?;

        let parsed = env
            .template_from_named_str(name, template)
            .map_err(|source| Error::TemplateParseError {
                name: name.to_string(),
                source,
            })?;
        debug!("Parsed template '{name}'");

        parsed
            .render(self.parameters.as_ref())
            .map_err(|source| Error::TemplateExecutionError {
                name: name.to_string(),
                source,
            })
    }
}

fn no_value_formatter(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> std::result::Result<(), minijinja::Error> {
    if value.is_undefined() {
        out.write_str(NO_VALUE)
            .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string()))
    } else {
        escape_formatter(out, state, value)
    }
}

fn expect_str(value: &Value, position: usize) -> std::result::Result<&str, minijinja::Error> {
    value.as_str().ok_or_else(|| type_error(value, position, "string"))
}

fn expect_map(value: &Value, position: usize) -> std::result::Result<Parameters, minijinja::Error> {
    if value.kind() != ValueKind::Map {
        return Err(type_error(value, position, "map"));
    }
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

fn type_error(value: &Value, position: usize, expected: &str) -> minijinja::Error {
    minijinja::Error::new(
        ErrorKind::InvalidOperation,
        format!("expected parameter {position} to be type {expected}, got {}", value.kind()),
    )
}

fn nested_failure(err: Error) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}
