//! File and directory rendering.
//! Reads templates, renders them through a [`TemplateRenderer`] and writes
//! the results, mirroring directory trees in directory mode.

use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, error};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::constants::TEMPLATE_EXTENSIONS;
use crate::error::{Error, Result};
use crate::loader::TemplateSource;
use crate::renderer::TemplateRenderer;

/// What a directory render does when one file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop and report the failing file
    #[default]
    Abort,
    /// Log the failure, render the remaining files, then report a summary
    KeepGoing,
}

/// Returns true if the file name ends with a template extension and has a
/// name left once it is stripped.
pub fn is_template_path(filename: &str) -> bool {
    TEMPLATE_EXTENSIONS
        .iter()
        .any(|ext| filename.len() > ext.len() && filename.ends_with(ext))
}

/// Maps a path relative to the input directory to its output path.
///
/// # Returns
/// * `(PathBuf, bool)` - The target path and whether an extension was stripped
pub fn resolve_target_path<P: AsRef<Path>, O: AsRef<Path>>(relative: P, output_dir: O) -> (PathBuf, bool) {
    let relative = relative.as_ref();
    let target = output_dir.as_ref().join(relative);

    let Some(filename) = relative.file_name().and_then(|n| n.to_str()) else {
        return (target, false);
    };
    if !is_template_path(filename) {
        return (target, false);
    }

    let stripped = TEMPLATE_EXTENSIONS
        .iter()
        .find_map(|ext| filename.strip_suffix(ext))
        .unwrap_or(filename);
    (target.with_file_name(stripped), true)
}

/// Renders one template from `input` (stdin if empty) to `output` (stdout if
/// empty).
///
/// Input that is not UTF-8 text, such as an image in a template tree, is
/// copied through unchanged.
pub fn render_file(engine: &dyn TemplateRenderer, input: &Path, output: &Path) -> Result<()> {
    let source = TemplateSource::from_path(input);
    let rendered = match String::from_utf8(source.load_bytes()?) {
        Ok(template) => engine.named_render(&source.name(), &template)?.into_bytes(),
        Err(err) => {
            debug!("'{source}' is not UTF-8 text, copying it verbatim");
            err.into_bytes()
        }
    };

    let permissions = match &source {
        TemplateSource::FileSystem(path) => fs::metadata(path).ok().map(|m| m.permissions()),
        TemplateSource::Stdin => None,
    };
    write_output(output, &rendered, permissions)
}

/// Renders every regular file under `input_dir` into `output_dir`.
///
/// The tree is listed before anything is written, so rendering a directory
/// onto itself never picks up its own output.
pub fn render_dir(
    engine: &dyn TemplateRenderer,
    input_dir: &Path,
    output_dir: &Path,
    policy: FailurePolicy,
) -> Result<()> {
    debug!("Rendering directory '{}' into '{}'", input_dir.display(), output_dir.display());
    let entries = WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::IoError(e.into()))?;
    let files: Vec<_> = entries.into_iter().filter(|e| e.file_type().is_file()).collect();

    let total = files.len();
    let mut failed = 0;
    for entry in files {
        let relative = entry
            .path()
            .strip_prefix(input_dir)
            .map_err(|e| Error::IoError(io::Error::other(e)))?;
        let (target, stripped) = resolve_target_path(relative, output_dir);
        debug!(
            "{} '{}' to '{}'",
            if stripped { "Rendering template" } else { "Rendering file" },
            relative.display(),
            target.display()
        );

        if let Err(err) = render_file(engine, entry.path(), &target) {
            let err = Error::DirEntryError {
                path: relative.display().to_string(),
                source: Box::new(err),
            };
            match policy {
                FailurePolicy::Abort => return Err(err),
                FailurePolicy::KeepGoing => {
                    error!("{err}");
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        return Err(Error::PartialRender {
            dir: input_dir.display().to_string(),
            failed,
            total,
        });
    }
    Ok(())
}

/// Writes `content` to `output`, or to stdout if `output` is empty.
///
/// Files are written to a temporary sibling and moved into place, so a
/// failed write never leaves a truncated file behind.
pub fn write_output(output: &Path, content: &[u8], permissions: Option<Permissions>) -> Result<()> {
    if output.as_os_str().is_empty() {
        debug!("No output path, writing to stdout");
        let mut stdout = io::stdout().lock();
        return stdout
            .write_all(content)
            .and_then(|_| stdout.flush())
            .map_err(|source| Error::OutputWriteError {
                path: "stdout".to_string(),
                source,
            });
    }

    debug!("Writing to file: {}", output.display());
    let write_error = |source: io::Error| Error::OutputWriteError {
        path: output.display().to_string(),
        source,
    };
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_error)?;

    let mut file = NamedTempFile::new_in(parent).map_err(write_error)?;
    file.write_all(content).map_err(write_error)?;
    if let Some(permissions) = permissions.or_else(default_permissions) {
        file.as_file().set_permissions(permissions).map_err(write_error)?;
    }
    file.persist(output).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}
