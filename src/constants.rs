//! Common constants used throughout the render application.

/// Application name
pub const NAME: &str = "render";

/// Single line description of the application
pub const DESCRIPTION: &str = "Universal file renderer";

/// Extensions stripped from output file names in directory mode
pub const TEMPLATE_EXTENSIONS: [&str; 2] = [".tmpl", ".tpl"];

/// Diagnostic template name used when reading from stdin
pub const STDIN_NAME: &str = "stdin";

/// Diagnostic template name used by `Renderer::render`
pub const DEFAULT_NAME: &str = "nameless";

/// Diagnostic template name used by nested renders
pub const NESTED_NAME: &str = "nested";

/// Placeholder printed for missing keys when they are not an error
pub const NO_VALUE: &str = "<no value>";

/// Parameter holding the directory relative file paths resolve against
pub const ROOT_KEY: &str = "root";

/// Default left variable delimiter
pub const LEFT_DELIMITER: &str = "{{";

/// Default right variable delimiter
pub const RIGHT_DELIMITER: &str = "}}";

/// Extra variable argument format, name is everything before the first `=`
pub const VAR_ARG_EXPRESSION: &str = r"^(?P<name>\S+?)=(?P<value>.*)$";
