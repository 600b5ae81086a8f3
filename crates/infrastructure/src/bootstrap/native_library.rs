//! Native storage accelerator discovery and loading
//!
//! Locates a platform-appropriate shared library by searching depth-first
//! from an anchor directory and loads the first one that links. The loaded
//! handle is kept in a process-wide registry: re-running the bootstrap is
//! idempotent, and re-running it against a different root first drops the
//! stale registration so the reload is not rejected as a duplicate.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

#[cfg(test)]
use mockall::automock;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{BootstrapError, StorageBootstrap};

/// Handle keeping a loaded library resident until process exit.
#[derive(Debug)]
pub(crate) struct LoadedLibrary {
    _library: Option<libloading::Library>,
}

impl LoadedLibrary {
    fn new(library: libloading::Library) -> Self {
        Self {
            _library: Some(library),
        }
    }

    #[cfg(test)]
    fn stub() -> Self {
        Self { _library: None }
    }
}

/// The dlopen step, separated so the search order is testable without real
/// shared objects on disk.
#[cfg_attr(test, automock)]
pub(crate) trait LibraryLoader: Send + Sync {
    fn try_load(&self, path: &Path) -> Result<LoadedLibrary, String>;
}

#[derive(Debug, Default)]
struct DlopenLoader;

impl LibraryLoader for DlopenLoader {
    // Loading arbitrary native code cannot be expressed safely; the caller
    // opted in by configuring an accelerator.
    #[allow(unsafe_code)]
    fn try_load(&self, path: &Path) -> Result<LoadedLibrary, String> {
        unsafe { libloading::Library::new(path) }
            .map(LoadedLibrary::new)
            .map_err(|e| e.to_string())
    }
}

type Registration = (PathBuf, LoadedLibrary);

fn global_registry() -> Arc<Mutex<Option<Registration>>> {
    static GLOBAL: OnceLock<Arc<Mutex<Option<Registration>>>> = OnceLock::new();
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(Mutex::new(None))))
}

/// Directory-walking bootstrap for a native storage accelerator.
pub struct NativeLibraryBootstrap {
    library_stem: String,
    search_root: Option<PathBuf>,
    loader: Box<dyn LibraryLoader>,
    registry: Arc<Mutex<Option<Registration>>>,
}

impl NativeLibraryBootstrap {
    /// Bootstrap for `lib<stem>.so` / `lib<stem>.dylib` / `<stem>.dll`,
    /// anchored at the running executable's directory.
    pub fn new(library_stem: impl Into<String>) -> Self {
        Self {
            library_stem: library_stem.into(),
            search_root: None,
            loader: Box::new(DlopenLoader),
            registry: global_registry(),
        }
    }

    /// Anchor the search at an explicit directory instead of the executable
    /// location.
    #[must_use]
    pub fn with_search_root(mut self, root: PathBuf) -> Self {
        self.search_root = Some(root);
        self
    }

    #[cfg(test)]
    fn with_loader_and_registry(
        mut self,
        loader: Box<dyn LibraryLoader>,
        registry: Arc<Mutex<Option<Registration>>>,
    ) -> Self {
        self.loader = loader;
        self.registry = registry;
        self
    }

    /// Platform file name for a library stem.
    pub fn platform_file_name(stem: &str) -> String {
        if cfg!(target_os = "windows") {
            format!("{stem}.dll")
        } else if cfg!(target_os = "macos") {
            format!("lib{stem}.dylib")
        } else {
            format!("lib{stem}.so")
        }
    }

    fn anchor(&self) -> Result<PathBuf, BootstrapError> {
        if let Some(root) = &self.search_root {
            return Ok(root.clone());
        }
        let exe = std::env::current_exe()
            .map_err(|e| BootstrapError::NoSearchRoot(e.to_string()))?;
        exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            BootstrapError::NoSearchRoot("executable has no parent directory".to_string())
        })
    }

    /// Walk upward from the anchor while the parent directory still carries
    /// the library stem in its name. This widens the search to the whole
    /// distribution directory when the anchor sits somewhere inside it.
    fn search_base(&self, anchor: &Path) -> PathBuf {
        let mut base = anchor.to_path_buf();
        while let Some(parent) = base.parent() {
            let parent_is_distribution = parent
                .file_name()
                .is_some_and(|name| name.to_string_lossy().contains(&self.library_stem));
            if parent_is_distribution {
                base = parent.to_path_buf();
            } else {
                break;
            }
        }
        base
    }

    /// Depth-first search: try the directory itself, then each subdirectory
    /// in name order. The first directory that loads wins.
    fn search(&self, dir: &Path, file_name: &str) -> Option<(PathBuf, LoadedLibrary)> {
        match self.loader.try_load(&dir.join(file_name)) {
            Ok(library) => return Some((dir.to_path_buf(), library)),
            Err(reason) => debug!(dir = %dir.display(), %reason, "no loadable library here"),
        }
        let mut subdirectories: Vec<PathBuf> = fs::read_dir(dir)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        subdirectories.sort();
        subdirectories
            .into_iter()
            .find_map(|subdir| self.search(&subdir, file_name))
    }
}

impl StorageBootstrap for NativeLibraryBootstrap {
    fn ensure_ready(&self) -> Result<(), BootstrapError> {
        let file_name = Self::platform_file_name(&self.library_stem);
        let anchor = self.anchor()?;
        let base = self.search_base(&anchor);

        let mut registration = self.registry.lock();
        if let Some((loaded_from, _)) = registration.as_ref() {
            if loaded_from.starts_with(&base) {
                debug!(dir = %loaded_from.display(), "storage library already loaded");
                return Ok(());
            }
            // A library of the same name was registered under a different
            // root; drop it so the reload is not rejected as a duplicate.
            info!(
                stale = %loaded_from.display(),
                "dropping stale storage library registration"
            );
            *registration = None;
        }

        match self.search(&base, &file_name) {
            Some((dir, library)) => {
                info!(dir = %dir.display(), library = %file_name, "storage library loaded");
                *registration = Some((dir, library));
                Ok(())
            },
            None => Err(BootstrapError::LibraryNotFound {
                library: file_name,
                root: base,
            }),
        }
    }
}

impl std::fmt::Debug for NativeLibraryBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibraryBootstrap")
            .field("library_stem", &self.library_stem)
            .field("search_root", &self.search_root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn fresh_registry() -> Arc<Mutex<Option<Registration>>> {
        Arc::new(Mutex::new(None))
    }

    fn bootstrap_with(
        root: &TempDir,
        loader: MockLibraryLoader,
        registry: &Arc<Mutex<Option<Registration>>>,
    ) -> NativeLibraryBootstrap {
        NativeLibraryBootstrap::new("mimic_accel")
            .with_search_root(root.path().to_path_buf())
            .with_loader_and_registry(Box::new(loader), Arc::clone(registry))
    }

    #[test]
    fn platform_file_name_matches_the_target() {
        let name = NativeLibraryBootstrap::platform_file_name("mimic_accel");
        if cfg!(target_os = "windows") {
            assert_eq!(name, "mimic_accel.dll");
        } else if cfg!(target_os = "macos") {
            assert_eq!(name, "libmimic_accel.dylib");
        } else {
            assert_eq!(name, "libmimic_accel.so");
        }
    }

    #[test]
    fn first_loadable_directory_wins() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("a")).unwrap();
        fs::create_dir(root.path().join("b")).unwrap();
        let target = root
            .path()
            .join("b")
            .join(NativeLibraryBootstrap::platform_file_name("mimic_accel"));

        let mut loader = MockLibraryLoader::new();
        loader.expect_try_load().returning(move |path| {
            if path == target {
                Ok(LoadedLibrary::stub())
            } else {
                Err("not here".to_string())
            }
        });

        let registry = fresh_registry();
        let bootstrap = bootstrap_with(&root, loader, &registry);
        bootstrap.ensure_ready().unwrap();

        let registration = registry.lock();
        let (dir, _) = registration.as_ref().unwrap();
        assert_eq!(dir, &root.path().join("b"));
    }

    #[test]
    fn search_visits_subdirectories_in_name_order() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("z")).unwrap();
        fs::create_dir(root.path().join("a")).unwrap();

        let visited = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&visited);
        let mut loader = MockLibraryLoader::new();
        loader.expect_try_load().returning(move |path| {
            seen.lock().push(path.to_path_buf());
            Err("nope".to_string())
        });

        let registry = fresh_registry();
        let bootstrap = bootstrap_with(&root, loader, &registry);
        let err = bootstrap.ensure_ready().unwrap_err();
        assert!(matches!(err, BootstrapError::LibraryNotFound { .. }));

        let visited = visited.lock();
        // Root first, then subdirectories sorted by name.
        assert_eq!(visited[0].parent().unwrap(), root.path());
        assert!(visited[1].starts_with(root.path().join("a")));
        assert!(visited[2].starts_with(root.path().join("z")));
    }

    #[test]
    fn rerun_under_the_same_root_is_idempotent() {
        let root = TempDir::new().unwrap();
        let mut loader = MockLibraryLoader::new();
        // Exactly one load for two ensure_ready calls.
        loader
            .expect_try_load()
            .times(1)
            .returning(|_| Ok(LoadedLibrary::stub()));

        let registry = fresh_registry();
        let bootstrap = bootstrap_with(&root, loader, &registry);
        bootstrap.ensure_ready().unwrap();
        bootstrap.ensure_ready().unwrap();
    }

    #[test]
    fn stale_registration_under_another_root_is_replaced() {
        let old_root = TempDir::new().unwrap();
        let new_root = TempDir::new().unwrap();
        let registry = fresh_registry();
        *registry.lock() = Some((old_root.path().to_path_buf(), LoadedLibrary::stub()));

        let mut loader = MockLibraryLoader::new();
        loader
            .expect_try_load()
            .times(1)
            .returning(|_| Ok(LoadedLibrary::stub()));

        let bootstrap = bootstrap_with(&new_root, loader, &registry);
        bootstrap.ensure_ready().unwrap();

        let registration = registry.lock();
        let (dir, _) = registration.as_ref().unwrap();
        assert!(dir.starts_with(new_root.path()));
    }

    #[test]
    fn exhausted_search_is_fatal_with_a_diagnostic() {
        let root = TempDir::new().unwrap();
        let mut loader = MockLibraryLoader::new();
        loader
            .expect_try_load()
            .returning(|_| Err("unresolved symbols".to_string()));

        let registry = fresh_registry();
        let bootstrap = bootstrap_with(&root, loader, &registry);
        let err = bootstrap.ensure_ready().unwrap_err();
        let BootstrapError::LibraryNotFound { library, root: reported } = err else {
            unreachable!("expected LibraryNotFound");
        };
        assert!(library.contains("mimic_accel"));
        assert_eq!(reported, root.path());
    }
}
