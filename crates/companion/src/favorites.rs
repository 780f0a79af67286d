//! Persistent favorites.

use std::{fs, io::ErrorKind, path::Path};

use pericope_wire::Passage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CompanionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredFavorite {
    book: String,
    chapter: u8,
    range: String,
}

impl From<&Passage> for StoredFavorite {
    fn from(passage: &Passage) -> Self {
        Self {
            book: passage.book.clone(),
            chapter: passage.chapter,
            range: passage.range.clone(),
        }
    }
}

impl From<StoredFavorite> for Passage {
    fn from(stored: StoredFavorite) -> Self {
        Self::new(stored.book, stored.chapter, stored.range)
    }
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Ordered, duplicate-free list of favorite passages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteStore {
    favorites: Vec<Passage>,
}

impl FavoriteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, CompanionError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No favorites file, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(CompanionError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let stored: Vec<StoredFavorite> = serde_json::from_str(&contents)?;

        let mut store = Self::new();
        for favorite in stored {
            store.add(favorite.into());
        }
        Ok(store)
    }

    /// Write to a JSON file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), CompanionError> {
        let write_error = |source| CompanionError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let stored: Vec<StoredFavorite> = self.favorites.iter().map(Into::into).collect();
        let contents = serde_json::to_string_pretty(&stored)?;
        fs::write(path, contents).map_err(write_error)
    }

    pub fn contains(&self, passage: &Passage) -> bool {
        self.favorites.contains(passage)
    }

    /// Add `passage`. Returns `false` if it was already present.
    pub fn add(&mut self, passage: Passage) -> bool {
        if self.contains(&passage) {
            return false;
        }
        self.favorites.push(passage);
        true
    }

    /// Remove `passage`. Returns `false` if it was not present.
    pub fn remove(&mut self, passage: &Passage) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|favorite| favorite != passage);
        self.favorites.len() != before
    }

    pub fn toggle(&mut self, passage: Passage) -> Toggle {
        if self.remove(&passage) {
            Toggle::Removed
        } else {
            self.favorites.push(passage);
            Toggle::Added
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Passage> {
        self.favorites.iter()
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }
}
