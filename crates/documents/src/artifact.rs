//! Scoped on-disk copy of a request's document bytes.

use std::io::Write;
use std::path::{Path, PathBuf};

use docqa_core::DocumentFormat;
use tempfile::NamedTempFile;
use tracing::debug;

/// A temporary file holding one request's document.
///
/// The file is removed when the value is dropped, whichever way the request
/// ends. Never shared across requests.
pub struct TempArtifact {
    file: NamedTempFile,
}

impl TempArtifact {
    /// Write `bytes` to a fresh file in `dir` (or the system temp dir).
    ///
    /// The suffix matches `format` so the file is recognizable on disk.
    pub fn write(dir: Option<&Path>, format: DocumentFormat, bytes: &[u8]) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docqa-").suffix(format.suffix());

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        debug!(path = %file.path().display(), bytes = bytes.len(), "Wrote temporary artifact");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> std::io::Result<u64> {
        Ok(self.file.as_file().metadata()?.len())
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        debug!(path = %self.file.path().display(), "Releasing temporary artifact");
    }
}

impl std::fmt::Debug for TempArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempArtifact")
            .field("path", &PathBuf::from(self.file.path()))
            .finish()
    }
}
