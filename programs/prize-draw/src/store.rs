use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::state::StateDocument;

/// Persistence collaborator: the whole document is loaded once and
/// rewritten after every mutation.
pub trait Store: Send + Sync {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<StateDocument>>;

    fn save(&self, document: &StateDocument) -> Result<()>;
}

/// Keeps the encoded document in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the last saved document, if any.
    pub fn saved_len(&self) -> Option<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Vec::len)
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Option<StateDocument>> {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        bytes
            .as_deref()
            .map(StateDocument::decode)
            .transpose()
    }

    fn save(&self, document: &StateDocument) -> Result<()> {
        let encoded = document.encode()?;
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
        Ok(())
    }
}

/// Stores the document in a single file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

impl Store for FileStore {
    fn load(&self) -> Result<Option<StateDocument>> {
        match fs::read(&self.path) {
            Ok(bytes) => StateDocument::decode(&bytes).map(Some),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => {
                msg!("Reading {} failed: {}", self.path.display(), e);
                err!(CompetitionError::StorageFailed)
            }
        }
    }

    fn save(&self, document: &StateDocument) -> Result<()> {
        let encoded = document.encode()?;
        let staging = self.staging_path();

        fs::write(&staging, &encoded)
            .and_then(|_| fs::rename(&staging, &self.path))
            .map_err(|e| {
                msg!("Writing {} failed: {}", self.path.display(), e);
                CompetitionError::StorageFailed
            })?;
        Ok(())
    }
}
