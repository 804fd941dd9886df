use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use roadwatch_logging::rw_info;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use thiserror::Error;

use crate::{ApiError, Backend};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("download directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("invalid artifact filename: {0}")]
    InvalidFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        ApiError::Io(err.to_string())
    }
}

/// Ensure the download directory exists; create it if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Saves downloaded artifacts into one directory. A file only appears under
/// its final name once the whole body has arrived.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub async fn save(
        &self,
        backend: &dyn Backend,
        url_path: &str,
        filename: &str,
    ) -> Result<PathBuf, ApiError> {
        let target = self.target_path(filename)?;
        ensure_output_dir(&self.dir)?;

        let tmp = NamedTempFile::new_in(&self.dir).map_err(PersistError::from)?;
        let mut file = tokio::fs::File::from_std(tmp.reopen().map_err(PersistError::from)?);
        let written = backend.download(url_path, &mut file).await?;
        file.flush().await.map_err(PersistError::from)?;
        file.sync_all().await.map_err(PersistError::from)?;
        drop(file);

        if target.exists() {
            fs::remove_file(&target).map_err(PersistError::from)?;
        }
        tmp.persist(&target)
            .map_err(|e| PersistError::Io(e.error))?;
        rw_info!("Saved {} bytes to {:?}", written, target);
        Ok(target)
    }

    fn target_path(&self, filename: &str) -> Result<PathBuf, PersistError> {
        let name = Path::new(filename);
        match name.file_name() {
            Some(base) if base == name.as_os_str() => Ok(self.dir.join(base)),
            _ => Err(PersistError::InvalidFilename(filename.to_string())),
        }
    }
}

/// Name and size of a local file about to be offered for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

pub fn inspect_file(path: &Path) -> io::Result<LocalFile> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    Ok(LocalFile {
        path: path.to_path_buf(),
        name,
        size_bytes: meta.len(),
    })
}
