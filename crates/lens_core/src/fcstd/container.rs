//! The `.FCStd` ZIP container, fully decompressed into memory.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use thiserror::Error;
use zip::ZipArchive;

/// Errors raised while opening a container.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("invalid ZIP archive: {0}")]
    InvalidArchive(#[from] zip::result::ZipError),

    #[error("failed to read archive entry '{name}': {source}")]
    Entry {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ContainerResult<T> = Result<T, ContainerError>;

/// Immutable name → bytes view of every file in the archive.
#[derive(Clone, Debug, Default)]
pub struct Container {
    files: HashMap<String, Vec<u8>>,
}

impl Container {
    /// Decompress an archive held in memory. Directory entries are skipped.
    pub fn from_bytes(bytes: &[u8]) -> ContainerResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut files = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|source| ContainerError::Entry {
                    name: name.clone(),
                    source,
                })?;
            files.insert(name, content);
        }

        log::debug!("Opened container with {} entries", files.len());
        Ok(Self { files })
    }

    /// Build a container from already-extracted files.
    pub fn from_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Entry names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.files.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
