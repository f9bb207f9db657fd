//! WC-Root Resolver (§4.8): given an absolute filesystem path, locates the
//! working-copy root and produces a `(WCROOT handle, path relative to
//! root)` pair, caching the mapping.
//!
//! Grounded on `wc_db_pdh.c`'s `svn_wc__db_pdh_parse_local_abspath`: strip
//! the basename and walk upward one directory at a time until a directory
//! carrying the admin marker (`.svn/`, standing in for `wc.db`) is found,
//! or the filesystem root is reached. `database/registry.rs`'s
//! `Lazy<Mutex<HashMap<PathBuf, _>>>` singleton-by-path pattern is the
//! model for [`Resolver`]'s cache, adapted to own its entries outright
//! (`db->dir_data` in the source is itself pool-owned for the lifetime of
//! the open `svn_wc__db_t`, so there is no weak-reference lifecycle to
//! mirror here).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use wcdb_core::error::{WcdbError, WcdbResult};
use wcdb_core::types::{RelPath, WcId};
use wcdb_kv::Store;

use crate::lock::LockTable;

const ADM_DIR: &str = ".svn";

/// One resolved working-copy root: its absolute path, its id, the
/// in-memory key-value store backing its `NODES`/`ACTUAL`/pristine tables,
/// and the locks this process currently owns within it.
pub struct WcRoot {
    /// Absolute filesystem path of the working-copy root directory.
    pub abspath: PathBuf,
    /// This process's id for the root (`WCROOT.id`).
    pub wc_id: WcId,
    /// The key-value store holding every table for this working copy.
    pub store: Store,
    /// Locks owned by this process (`wcroot->owned_locks`).
    pub locks: Mutex<LockTable>,
}

impl WcRoot {
    /// The admin directory (`.svn/`) under this root.
    pub fn admin_dir(&self) -> PathBuf {
        self.abspath.join(ADM_DIR)
    }
}

fn has_admin_marker(dir: &Path) -> bool {
    dir.join(ADM_DIR).is_dir()
}

/// Resolves absolute paths to [`WcRoot`]s, caching every root discovered so
/// repeated lookups under the same tree skip the filesystem walk.
pub struct Resolver {
    cache: Mutex<HashMap<PathBuf, Arc<WcRoot>>>,
    next_wc_id: AtomicI64,
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver {
            cache: Mutex::new(HashMap::new()),
            next_wc_id: AtomicI64::new(1),
        }
    }
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    /// Locates the working-copy root containing `abspath` and the path of
    /// `abspath` relative to it. Walks upward from `abspath` (which need
    /// not exist, or be a directory — the first iteration strips to its
    /// parent just like every other) until a cached or on-disk root is
    /// found.
    pub fn resolve(&self, abspath: &Path) -> WcdbResult<(Arc<WcRoot>, RelPath)> {
        let mut current = abspath.to_path_buf();
        let mut suffix: Vec<String> = Vec::new();

        loop {
            if let Some(root) = self.cache.lock().get(&current).cloned() {
                return Ok((root, build_relpath(&suffix)));
            }
            if has_admin_marker(&current) {
                let root = self.cache_new_root(current.clone());
                return Ok((root, build_relpath(&suffix)));
            }

            match current.file_name().map(|n| n.to_string_lossy().into_owned()) {
                Some(name) => {
                    suffix.push(name);
                    if !current.pop() {
                        return Err(WcdbError::NotWorkingCopy {
                            path: abspath.display().to_string(),
                        });
                    }
                }
                None => {
                    return Err(WcdbError::NotWorkingCopy {
                        path: abspath.display().to_string(),
                    });
                }
            }
        }
    }

    /// Creates a brand-new working copy root at `abspath`: writes the
    /// admin marker directory and registers an empty store. Mirrors
    /// `svn_wc__db_pdh_create_wcroot`, used by checkout/init rather than
    /// by ordinary path resolution.
    pub fn create_wcroot(&self, abspath: &Path) -> WcdbResult<Arc<WcRoot>> {
        if let Some(existing) = self.cache.lock().get(abspath).cloned() {
            return Ok(existing);
        }
        std::fs::create_dir_all(abspath.join(ADM_DIR))?;
        Ok(self.cache_new_root(abspath.to_path_buf()))
    }

    fn cache_new_root(&self, abspath: PathBuf) -> Arc<WcRoot> {
        let mut cache = self.cache.lock();
        if let Some(existing) = cache.get(&abspath) {
            return existing.clone();
        }
        let wc_id = WcId(self.next_wc_id.fetch_add(1, Ordering::SeqCst));
        let store = Store::new();
        crate::lock::init(&store);
        let root = Arc::new(WcRoot {
            abspath: abspath.clone(),
            wc_id,
            store,
            locks: Mutex::new(LockTable::new(wc_id)),
        });
        cache.insert(abspath, root.clone());
        root
    }
}

fn build_relpath(suffix_from_leaf_to_root: &[String]) -> RelPath {
    let mut segments = suffix_from_leaf_to_root.to_vec();
    segments.reverse();
    RelPath::new(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolves_a_path_directly_under_an_existing_wcroot() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".svn")).unwrap();
        std::fs::create_dir_all(dir.path().join("sub/dir")).unwrap();

        let resolver = Resolver::new();
        let (root, relpath) = resolver.resolve(&dir.path().join("sub/dir/file.txt")).unwrap();

        assert_eq!(root.abspath, dir.path());
        assert_eq!(relpath.as_str(), "sub/dir/file.txt");
    }

    #[test]
    fn resolving_the_wcroot_itself_yields_an_empty_relpath() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".svn")).unwrap();

        let resolver = Resolver::new();
        let (root, relpath) = resolver.resolve(dir.path()).unwrap();

        assert_eq!(root.abspath, dir.path());
        assert!(relpath.is_root());
    }

    #[test]
    fn repeated_resolution_under_the_same_root_returns_the_same_wc_id() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".svn")).unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();

        let resolver = Resolver::new();
        let (root1, _) = resolver.resolve(&dir.path().join("a")).unwrap();
        let (root2, _) = resolver.resolve(&dir.path().join("a/b")).unwrap();

        assert_eq!(root1.wc_id, root2.wc_id);
        assert!(Arc::ptr_eq(&root1, &root2));
    }

    #[test]
    fn path_with_no_wcroot_ancestor_is_not_a_working_copy() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("plain/dir")).unwrap();

        let resolver = Resolver::new();
        let err = resolver.resolve(&dir.path().join("plain/dir")).unwrap_err();
        assert!(matches!(err, WcdbError::NotWorkingCopy { .. }));
    }

    #[test]
    fn create_wcroot_writes_the_admin_marker_and_registers_the_root() {
        let dir = tempdir().unwrap();
        let resolver = Resolver::new();

        let root = resolver.create_wcroot(dir.path()).unwrap();

        assert!(dir.path().join(".svn").is_dir());
        let (resolved, relpath) = resolver.resolve(dir.path()).unwrap();
        assert!(Arc::ptr_eq(&root, &resolved));
        assert!(relpath.is_root());
    }
}
