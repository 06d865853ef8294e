//! Path ↔ `FileId` bookkeeping for the scripts of a session.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::FileId;

/// Assigns stable [`FileId`]s to script paths.
///
/// Shared between the indexing and resolution phases; lookups take a read
/// lock so parallel resolution can render locations concurrently.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<FileSetInner>,
}

#[derive(Debug, Default)]
struct FileSetInner {
    path_to_id: IndexMap<PathBuf, FileId>,
    id_to_path: IndexMap<FileId, PathBuf>,
    next_id: u32,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or assign the FileId for a path.
    pub fn file_id(&self, path: &Path) -> FileId {
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.path_to_id.get(path) {
                return id;
            }
        }

        let mut inner = self.inner.write();
        // Another writer may have won the race between the two locks.
        if let Some(&id) = inner.path_to_id.get(path) {
            return id;
        }

        let id = FileId::new(inner.next_id);
        inner.next_id += 1;
        inner.path_to_id.insert(path.to_owned(), id);
        inner.id_to_path.insert(id, path.to_owned());
        id
    }

    pub fn path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.read().id_to_path.get(&file).cloned()
    }

    /// Human-readable name for a file, falling back to `file#N`.
    pub fn display_name(&self, file: FileId) -> String {
        match self.path(file) {
            Some(path) => path.display().to_string(),
            None => file.to_string(),
        }
    }

    /// Forget a file. Its id is never reused.
    pub fn remove(&self, file: FileId) {
        let mut inner = self.inner.write();
        if let Some(path) = inner.id_to_path.swap_remove(&file) {
            inner.path_to_id.swap_remove(&path);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().path_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All known file ids, in assignment order.
    pub fn files(&self) -> Vec<FileId> {
        self.inner.read().id_to_path.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_id_assignment() {
        let files = FileSet::new();

        let a = files.file_id(Path::new("std/entity.qss"));
        let b = files.file_id(Path::new("game/main.qss"));
        let again = files.file_id(Path::new("std/entity.qss"));

        assert_ne!(a, b);
        assert_eq!(a, again);
        assert_eq!(files.files(), vec![a, b]);
    }

    #[test]
    fn test_file_set_display_name() {
        let files = FileSet::new();
        let id = files.file_id(Path::new("game/main.qss"));

        assert_eq!(files.display_name(id), "game/main.qss");
        assert_eq!(files.display_name(FileId::new(42)), "file#42");
    }

    #[test]
    fn test_file_set_remove_does_not_reuse_ids() {
        let files = FileSet::new();
        let a = files.file_id(Path::new("a.qss"));
        files.remove(a);
        assert!(files.path(a).is_none());
        assert!(files.is_empty());

        let b = files.file_id(Path::new("b.qss"));
        assert_ne!(a, b);
    }
}
