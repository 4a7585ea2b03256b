//! Template input loading.
//! Reads template text either from a file or from piped stdin.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::debug;

use crate::constants::STDIN_NAME;
use crate::error::{Error, Result};

/// Represents the source location of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Piped standard input
    Stdin,
    /// Local filesystem template path
    FileSystem(PathBuf),
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::Stdin => write!(f, "{STDIN_NAME}"),
            TemplateSource::FileSystem(path) => write!(f, "{}", path.display()),
        }
    }
}

impl TemplateSource {
    /// An empty path selects stdin.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            Self::Stdin
        } else {
            Self::FileSystem(path.to_path_buf())
        }
    }

    /// Name used for template diagnostics.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Reads the whole template text.
    ///
    /// # Errors
    /// * `Error::ExpectedPipe` if stdin is selected but is not a pipe
    /// * `Error::InputUnavailable` if the input cannot be read or is not UTF-8
    pub fn load(&self) -> Result<String> {
        String::from_utf8(self.load_bytes()?).map_err(|e| Error::InputUnavailable {
            path: self.name(),
            source: io::Error::new(io::ErrorKind::InvalidData, e.utf8_error()),
        })
    }

    /// Reads the raw input bytes.
    ///
    /// # Errors
    /// * `Error::ExpectedPipe` if stdin is selected but is not a pipe
    /// * `Error::InputUnavailable` if the input cannot be read
    pub fn load_bytes(&self) -> Result<Vec<u8>> {
        match self {
            TemplateSource::Stdin => {
                if !stdin_is_pipe() {
                    return Err(Error::ExpectedPipe);
                }
                debug!("No input path, using piped stdin");
                read_piped(io::stdin().lock())
            }
            TemplateSource::FileSystem(path) => {
                debug!("Input path: {}", path.display());
                fs::read(path).map_err(|source| Error::InputUnavailable {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }
}

/// Reads everything from an already verified pipe.
pub fn read_piped<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).map_err(|source| Error::InputUnavailable {
        path: STDIN_NAME.to_string(),
        source,
    })?;
    Ok(buffer)
}

#[cfg(unix)]
fn stdin_is_pipe() -> bool {
    use std::os::fd::AsFd;
    use std::os::unix::fs::FileTypeExt;

    io::stdin()
        .as_fd()
        .try_clone_to_owned()
        .map(fs::File::from)
        .and_then(|file| file.metadata())
        .map(|metadata| metadata.file_type().is_fifo())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn stdin_is_pipe() -> bool {
    use std::io::IsTerminal;

    !io::stdin().is_terminal()
}
