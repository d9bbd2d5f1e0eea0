use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::loader;
use crate::models::LoadOutcome;

struct CachedLoad {
    path: PathBuf,
    digest: blake3::Hash,
    outcome: Arc<LoadOutcome>,
}

/// Memoizes the parsed signup log, keyed on the source path and a BLAKE3
/// digest of its bytes. Owned by the caller; nothing here is global.
#[derive(Default)]
pub struct SourceCache {
    entry: Option<CachedLoad>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed source, re-parsing only when the path or the file
    /// contents differ from the cached entry. A failed read keeps the old
    /// entry.
    pub fn load(&mut self, path: &Path) -> Result<Arc<LoadOutcome>> {
        let bytes = std::fs::read(path).map_err(|source| Error::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let digest = blake3::hash(&bytes);

        if let Some(entry) = &self.entry {
            if entry.path == path && entry.digest == digest {
                debug!(path = %path.display(), "signup cache hit");
                return Ok(Arc::clone(&entry.outcome));
            }
        }

        debug!(path = %path.display(), digest = %digest, "signup cache miss");
        let outcome = Arc::new(loader::parse_reader(bytes.as_slice())?);
        self.entry = Some(CachedLoad {
            path: path.to_path_buf(),
            digest,
            outcome: Arc::clone(&outcome),
        });
        Ok(outcome)
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.entry.as_ref().is_some_and(|entry| entry.path == path)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_source(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("signers.csv");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn unchanged_source_reuses_parsed_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "1,done,OrgA,en,90001,01/15/2023 10:00\n");
        let mut cache = SourceCache::new();

        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_cached(&path));
    }

    #[test]
    fn changed_contents_invalidate_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "1,done,OrgA,en,90001,01/15/2023 10:00\n");
        let mut cache = SourceCache::new();

        let first = cache.load(&path).unwrap();
        write_source(
            &dir,
            "1,done,OrgA,en,90001,01/15/2023 10:00\n2,done,OrgB,en,90001,02/15/2023 10:00\n",
        );
        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.records.len(), 2);
    }

    #[test]
    fn clear_forces_reparse() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "1,done,OrgA,en,90001,01/15/2023 10:00\n");
        let mut cache = SourceCache::new();

        let first = cache.load(&path).unwrap();
        cache.clear();
        assert!(!cache.is_cached(&path));
        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn unreadable_source_keeps_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "1,done,OrgA,en,90001,01/15/2023 10:00\n");
        let mut cache = SourceCache::new();
        cache.load(&path).unwrap();

        let missing = dir.path().join("missing.csv");
        let err = cache.load(&missing).unwrap_err();
        assert!(matches!(err, Error::SourceUnreadable { .. }));
        assert!(cache.is_cached(&path));
    }
}
