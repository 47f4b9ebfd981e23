// Load-once transducer cache shared between threads

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use lexfst_core::TextEncoding;
use parking_lot::RwLock;

use crate::{FstError, FstLookup};

/// Identity of a loaded artifact.
///
/// A legacy artifact is keyed by its path and the encoding it was decoded
/// with, since the same file read with another encoding is another
/// transducer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    Path(PathBuf),
    Legacy(PathBuf, TextEncoding),
}

/// Process-wide cache of loaded transducers.
///
/// Later requests for a loaded artifact get the same `Arc`. Files are read
/// outside the lock, so concurrent first requests may each read one; the
/// first to finish is kept and returned to all of them. Failed loads are not
/// cached.
#[derive(Debug, Default)]
pub struct TransducerRegistry {
    entries: RwLock<HashMap<ArtifactKey, Arc<FstLookup>>>,
}

impl TransducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The transducer at `path`, loading it on first use.
    pub fn get_or_load(&self, path: impl AsRef<Path>) -> Result<Arc<FstLookup>, FstError> {
        let path = path.as_ref();
        self.get_or_insert_with(ArtifactKey::Path(path.to_path_buf()), || {
            FstLookup::from_path(path)
        })
    }

    /// The header-less transducer at `path`, decoded with `encoding`.
    pub fn get_or_load_legacy(
        &self,
        path: impl AsRef<Path>,
        encoding: TextEncoding,
    ) -> Result<Arc<FstLookup>, FstError> {
        let path = path.as_ref();
        self.get_or_insert_with(ArtifactKey::Legacy(path.to_path_buf(), encoding), || {
            FstLookup::from_legacy_path(path, encoding)
        })
    }

    /// An already loaded transducer.
    pub fn get(&self, key: &ArtifactKey) -> Option<Arc<FstLookup>> {
        self.entries.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn get_or_insert_with(
        &self,
        key: ArtifactKey,
        load: impl FnOnce() -> Result<FstLookup, FstError>,
    ) -> Result<Arc<FstLookup>, FstError> {
        if let Some(fst) = self.get(&key) {
            return Ok(fst);
        }

        let fst = Arc::new(load()?);
        match self.entries.write().entry(key) {
            // Another thread finished loading first
            Entry::Occupied(existing) => Ok(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                tracing::info!(
                    artifact = ?slot.key(),
                    transitions = fst.transition_count(),
                    labels = fst.label_count(),
                    "loaded transducer"
                );
                slot.insert(Arc::clone(&fst));
                Ok(fst)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FstHeader, write_header, write_u16, write_u32};
    use crate::transition::{ArcLayout, FINAL_LABEL, START_LABEL, Transition};
    use std::io::Write;

    /// "a" -> "x"
    fn build_fst_bytes(with_header: bool) -> Vec<u8> {
        let layout = ArcLayout::default();
        let mut data = Vec::new();
        if with_header {
            write_header(&mut data, &FstHeader::new(TextEncoding::Utf8, layout));
        }
        let arcs = [
            Transition {
                target: 1,
                label: START_LABEL,
                last: true,
            },
            Transition {
                target: 2,
                label: 2,
                last: true,
            },
            Transition {
                target: 2,
                label: FINAL_LABEL,
                last: true,
            },
        ];
        write_u32(&mut data, arcs.len() as u32);
        for arc in arcs {
            write_u32(&mut data, layout.pack(arc).unwrap());
        }
        write_u32(&mut data, 3);
        for o in [0u16, 1, 2, 3, 4, 6] {
            write_u16(&mut data, o);
        }
        data.extend_from_slice(&[0, 0, 0, 0, b'a', 0, b'x', 0]);
        data
    }

    fn write_temp(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn repeated_loads_share_one_instance() {
        let file = write_temp(&build_fst_bytes(true));
        let registry = TransducerRegistry::new();
        let first = registry.get_or_load(file.path()).unwrap();
        let second = registry.get_or_load(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(first.lookup("a"), vec!["x"]);

        let key = ArtifactKey::Path(file.path().to_path_buf());
        assert!(registry.get(&key).is_some());
    }

    #[test]
    fn legacy_artifacts_are_keyed_by_encoding() {
        let file = write_temp(&build_fst_bytes(false));
        let registry = TransducerRegistry::new();
        let utf8 = registry
            .get_or_load_legacy(file.path(), TextEncoding::Utf8)
            .unwrap();
        let latin1 = registry
            .get_or_load_legacy(file.path(), TextEncoding::Latin1)
            .unwrap();
        assert!(!Arc::ptr_eq(&utf8, &latin1));
        assert_eq!(registry.len(), 2);
        assert_eq!(latin1.lookup("a"), vec!["x"]);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let registry = TransducerRegistry::new();
        let err = registry.get_or_load("/nonexistent/lexicon.fst").unwrap_err();
        assert!(matches!(err, FstError::Io { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn loading_does_not_hold_the_lock() {
        let first = write_temp(&build_fst_bytes(true));
        let second = write_temp(&build_fst_bytes(true));
        let registry = TransducerRegistry::new();
        let cached = registry.get_or_load(first.path()).unwrap();
        let cached_key = ArtifactKey::Path(first.path().to_path_buf());

        // The loader reads the registry, which would deadlock under the lock
        let fst = registry
            .get_or_insert_with(ArtifactKey::Path(second.path().to_path_buf()), || {
                assert!(Arc::ptr_eq(&registry.get(&cached_key).unwrap(), &cached));
                assert_eq!(registry.len(), 1);
                FstLookup::from_path(second.path())
            })
            .unwrap();
        assert_eq!(fst.lookup("a"), vec!["x"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn first_finished_load_wins() {
        let file = write_temp(&build_fst_bytes(true));
        let registry = TransducerRegistry::new();
        let key = ArtifactKey::Path(file.path().to_path_buf());

        let mut inner = None;
        let outer = registry
            .get_or_insert_with(key.clone(), || {
                // A second request completes while the first is still loading
                inner = Some(registry.get_or_load(file.path()).unwrap());
                FstLookup::from_path(file.path())
            })
            .unwrap();
        assert!(Arc::ptr_eq(&outer, &inner.unwrap()));
        assert!(Arc::ptr_eq(&outer, &registry.get(&key).unwrap()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_first_use_shares_one_instance() {
        let file = write_temp(&build_fst_bytes(true));
        let registry = TransducerRegistry::new();
        let loaded: Vec<Arc<FstLookup>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry.get_or_load(file.path()).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(registry.len(), 1);
        for fst in &loaded[1..] {
            assert!(Arc::ptr_eq(&loaded[0], fst));
        }
    }
}
