use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::OutputFormat;
use crate::errors::{FreqError, FreqResult};
use crate::frequency::RankedResult;

/// Destination for a finished ranking
pub trait ResultWriter {
    fn write(&self, ranked: &RankedResult) -> FreqResult<()>;
}

/// Writes `<rank>. <word>: <count>` lines, ranks starting at 1
pub fn render_text<W: Write>(ranked: &RankedResult, out: &mut W) -> io::Result<()> {
    for (rank, entry) in ranked.ranked() {
        writeln!(out, "{}. {}: {}", rank, entry.word, entry.count)?;
    }
    Ok(())
}

/// Writes the ranking as a pretty-printed JSON array
pub fn render_json<W: Write>(ranked: &RankedResult, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, ranked)?;
    writeln!(out)
}

/// Writes the ranking to a file, replacing it atomically.
///
/// Output goes to a temporary file next to the destination that is renamed
/// over it once fully flushed, so readers never observe a partial report.
#[derive(Debug, Clone)]
pub struct FileResultWriter {
    path: PathBuf,
    format: OutputFormat,
}

impl FileResultWriter {
    pub fn new(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_inner(&self, ranked: &RankedResult) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Temp files are created 0600; keep the mode of a file being replaced
        let permissions = match std::fs::metadata(&self.path) {
            Ok(meta) => Some(meta.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file());
            match self.format {
                OutputFormat::Text => render_text(ranked, &mut out)?,
                OutputFormat::Json => render_json(ranked, &mut out)?,
            }
            out.flush()?;
        }
        tmp.as_file().sync_all()?;

        match permissions {
            Some(permissions) => tmp.as_file().set_permissions(permissions)?,
            None => set_new_file_mode(tmp.as_file())?,
        }

        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_new_file_mode(file: &std::fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_new_file_mode(_file: &std::fs::File) -> io::Result<()> {
    Ok(())
}

impl ResultWriter for FileResultWriter {
    fn write(&self, ranked: &RankedResult) -> FreqResult<()> {
        self.write_inner(ranked)
            .map_err(|e| FreqError::write(&self.path, e))?;
        debug!(
            "Wrote {} entries to {}",
            ranked.len(),
            self.path.display()
        );
        Ok(())
    }
}
