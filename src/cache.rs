use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::data::loader::load_file;
use crate::data::model::FoodTable;
use crate::data::search_key::{PinyinTransliterator, Transliterator};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// DatasetCache – one loaded table per source file
// ---------------------------------------------------------------------------

struct CachedTable {
    modified: Option<SystemTime>,
    table: Arc<FoodTable>,
}

/// Loaded tables keyed by source path and modification time.
///
/// A table is parsed once and shared until its file changes on disk or the
/// entry is invalidated. Loading is idempotent, so re-running it after an
/// eviction is always safe.
pub struct DatasetCache {
    transliterator: Box<dyn Transliterator>,
    entries: HashMap<PathBuf, CachedTable>,
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(Box::new(PinyinTransliterator))
    }
}

impl DatasetCache {
    pub fn new(transliterator: Box<dyn Transliterator>) -> Self {
        DatasetCache {
            transliterator,
            entries: HashMap::new(),
        }
    }

    /// Return the cached table for `path`, loading it on first use or when
    /// the file's modification time has changed.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<FoodTable>, LoadError> {
        let modified = modification_time(path)?;

        if let Some(entry) = self.entries.get(path) {
            if entry.modified == modified {
                log::debug!("dataset cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.table));
            }
            log::info!("{} changed on disk, reloading", path.display());
        }

        let table = Arc::new(load_file(path, self.transliterator.as_ref())?);
        self.entries.insert(
            path.to_path_buf(),
            CachedTable {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop the entry for `path`; the next lookup reloads it.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let removed = self.entries.remove(path).is_some();
        if removed {
            log::info!("invalidated cached dataset {}", path.display());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn modification_time(path: &Path) -> Result<Option<SystemTime>, LoadError> {
    match std::fs::metadata(path) {
        // Some filesystems do not report mtime; such entries are kept until invalidated.
        Ok(meta) => Ok(meta.modified().ok()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoadError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(LoadError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
