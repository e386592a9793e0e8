//! Input sources and output sinks named on the command line.
//!
//! Both accept `-` for the process's standard streams. The toolchain only
//! takes file paths, so standard input is copied into a scoped temporary file
//! before a subprocess runs.

use std::convert::Infallible;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use super::commands::CliError;

const STDIO_MARKER: &str = "-";

/// Where the term handed to the toolchain comes from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputSource {
    /// The process's standard input.
    Stdin,
    /// A file on disk.
    File(PathBuf),
}

impl FromStr for InputSource {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(if raw == STDIO_MARKER {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(raw))
        })
    }
}

impl InputSource {
    /// Confirms a file source can be opened for reading.
    ///
    /// # Errors
    /// Returns [`CliError::Io`] when the file cannot be opened.
    pub fn ensure_readable(&self) -> Result<(), CliError> {
        match self {
            Self::Stdin => Ok(()),
            Self::File(path) => File::open(path)
                .map(drop)
                .map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                }),
        }
    }

    /// Resolves the source to a filesystem path, draining standard input into
    /// a temporary file when necessary.
    ///
    /// # Errors
    /// Returns [`CliError::Io`] when standard input cannot be read or the
    /// temporary file cannot be written.
    pub fn materialize(&self) -> Result<MaterializedInput, CliError> {
        self.materialize_from(io::stdin().lock())
    }

    /// Like [`Self::materialize`], but drains `stdin` instead of the process's
    /// standard input.
    ///
    /// # Errors
    /// Returns [`CliError::Io`] when `stdin` cannot be read or the temporary
    /// file cannot be written.
    #[instrument(name = "cli.materialize_input", err, skip(stdin))]
    pub fn materialize_from(&self, mut stdin: impl Read) -> Result<MaterializedInput, CliError> {
        match self {
            Self::File(path) => Ok(MaterializedInput {
                path: path.clone(),
                temp: None,
            }),
            Self::Stdin => {
                let stdin_path = PathBuf::from(STDIO_MARKER);
                let mut temp = NamedTempFile::new().map_err(|source| CliError::Io {
                    path: std::env::temp_dir(),
                    source,
                })?;
                let copied = io::copy(&mut stdin, temp.as_file_mut())
                    .and_then(|copied| temp.as_file_mut().flush().map(|()| copied))
                    .map_err(|source| CliError::Io {
                        path: stdin_path,
                        source,
                    })?;
                debug!(bytes = copied, path = %temp.path().display(), "copied stdin to temporary file");
                Ok(MaterializedInput {
                    path: temp.path().to_path_buf(),
                    temp: Some(temp),
                })
            }
        }
    }
}

/// A filesystem path for the input, valid for as long as the value lives.
///
/// When the input came from standard input the path names a temporary file
/// that is deleted on drop.
#[derive(Debug)]
pub struct MaterializedInput {
    path: PathBuf,
    temp: Option<NamedTempFile>,
}

impl MaterializedInput {
    /// Path to hand to the toolchain.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` when the path names a temporary copy of standard input.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Destination named by `--output`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OutputTarget {
    /// The process's standard output.
    Stdout,
    /// A file on disk, created or truncated when opened.
    File(PathBuf),
}

impl FromStr for OutputTarget {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(if raw == STDIO_MARKER {
            Self::Stdout
        } else {
            Self::File(PathBuf::from(raw))
        })
    }
}

impl OutputTarget {
    /// Opens the target for writing.
    ///
    /// # Errors
    /// Returns [`CliError::Io`] when the file cannot be created.
    pub fn open(&self) -> Result<OutputSink, CliError> {
        match self {
            Self::Stdout => Ok(OutputSink::Stdout(io::stdout())),
            Self::File(path) => {
                let file = File::create(path).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(OutputSink::File {
                    path: path.clone(),
                    writer: BufWriter::new(file),
                })
            }
        }
    }
}

/// An opened output destination.
#[derive(Debug)]
pub enum OutputSink {
    /// Writes to the process's standard output.
    Stdout(io::Stdout),
    /// Writes to a buffered file.
    File {
        /// Path of the file, for diagnostics.
        path: PathBuf,
        /// Buffered handle to the file.
        writer: BufWriter<File>,
    },
}

impl OutputSink {
    /// Path used when reporting write failures; `-` for standard output.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        match self {
            Self::Stdout(_) => PathBuf::from(STDIO_MARKER),
            Self::File { path, .. } => path.clone(),
        }
    }

    /// Wraps `source` in a [`CliError::Io`] naming this sink.
    #[must_use]
    pub fn error(&self, source: io::Error) -> CliError {
        CliError::Io {
            path: self.path(),
            source,
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(stdout) => stdout.write(buf),
            Self::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(stdout) => stdout.flush(),
            Self::File { writer, .. } => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    #[test]
    fn stdin_bytes_are_copied_verbatim_and_removed_on_drop()
    -> Result<(), Box<dyn std::error::Error>> {
        let bytes = vec![0xff, 0x00, b'\n', 0xc3];
        let materialized = InputSource::Stdin.materialize_from(Cursor::new(bytes.clone()))?;
        assert!(materialized.is_temporary());
        let path = materialized.path().to_path_buf();
        assert_eq!(fs::read(&path)?, bytes);

        drop(materialized);
        assert!(!path.exists(), "temporary input must be removed on drop");
        Ok(())
    }

    #[test]
    fn file_sources_are_used_in_place() -> Result<(), Box<dyn std::error::Error>> {
        let source = InputSource::File(PathBuf::from("pgm.imp"));
        let materialized = source.materialize_from(io::empty())?;
        assert!(!materialized.is_temporary());
        assert_eq!(materialized.path(), Path::new("pgm.imp"));
        Ok(())
    }
}
