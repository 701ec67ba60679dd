//! Basis set registry.
//!
//! Basis files live in one data directory, one file per basis set, named
//! after the canonical basis name (`sto-3g.nw`, `6-31g_st_.nw`, ...). Each
//! set is parsed at most once per registry and then shared read-only.

use crate::error::{IntegralError, Result};
use basis::{parse_basis, BasisFormat, BasisSet};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Environment variable naming the basis data directory.
pub const DATA_PATH_ENV: &str = "ONEINT_DATA_PATH";

const ALIASES: [(&str, &str); 5] = [
    ("sto3g", "sto-3g"),
    ("631g", "6-31g"),
    ("6-31g(d)", "6-31g*"),
    ("631gs", "6-31g*"),
    ("ccpvdz", "cc-pvdz"),
];

type Slot = Arc<OnceCell<Arc<BasisSet>>>;

static GLOBAL: OnceCell<Arc<BasisRegistry>> = OnceCell::new();

pub struct BasisRegistry {
    data_dir: PathBuf,
    cache: Mutex<HashMap<String, Slot>>,
}

impl std::fmt::Debug for BasisRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasisRegistry")
            .field("data_dir", &self.data_dir)
            .field("cached", &self.cached_names())
            .finish()
    }
}

/// Resolves aliases and maps a user supplied name onto its file stem:
/// lowercase, `*` spelled `_st_`.
pub fn canonical_name(basis_name: &str) -> String {
    let lowered = basis_name.trim().to_lowercase();
    let resolved = match ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        Some((alias, target)) => {
            warn!("basis name '{}' resolved as alias of '{}'", alias, target);
            target.to_string()
        }
        None => lowered,
    };
    resolved.replace('*', "_st_")
}

impl BasisRegistry {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        if !data_dir.is_dir() {
            return Err(IntegralError::DataPathNotFound(data_dir));
        }
        Ok(Self {
            data_dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Registry rooted at `$ONEINT_DATA_PATH`.
    pub fn from_env() -> Result<Self> {
        let dir = std::env::var_os(DATA_PATH_ENV)
            .ok_or(IntegralError::DataPathUnset(DATA_PATH_ENV))?;
        Self::new(PathBuf::from(dir))
    }

    /// Process-wide registry. Built from the environment on first use unless
    /// [`BasisRegistry::install_global`] ran before.
    pub fn global() -> Result<&'static Arc<BasisRegistry>> {
        GLOBAL.get_or_try_init(|| Self::from_env().map(Arc::new))
    }

    /// Installs `registry` as the process-wide registry. Returns the registry
    /// already in place when one was installed or initialized earlier.
    pub fn install_global(registry: BasisRegistry) -> &'static Arc<BasisRegistry> {
        let candidate = Arc::new(registry);
        let installed = GLOBAL.get_or_init(|| Arc::clone(&candidate));
        if !Arc::ptr_eq(installed, &candidate) {
            debug!(
                "global basis registry already set at {}",
                installed.data_dir.display()
            );
        }
        installed
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Loads (or fetches from the cache) the basis set `basis_name`.
    ///
    /// Concurrent first requests for the same name parse the file once; the
    /// map lock is only held to look up the per-name slot.
    pub fn load(&self, basis_name: &str) -> Result<Arc<BasisSet>> {
        let key = canonical_name(basis_name);
        let slot = {
            let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(cache.entry(key.clone()).or_default())
        };
        let basis = slot.get_or_try_init(|| self.read_basis(&key))?;
        Ok(Arc::clone(basis))
    }

    pub fn is_cached(&self, basis_name: &str) -> bool {
        let key = canonical_name(basis_name);
        let cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(&key).is_some_and(|slot| slot.get().is_some())
    }

    /// Canonical names of the sets loaded so far, sorted.
    pub fn cached_names(&self) -> Vec<String> {
        let cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = cache
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn locate(&self, key: &str) -> Option<PathBuf> {
        BasisFormat::ALL
            .iter()
            .map(|format| self.data_dir.join(format!("{}.{}", key, format.extension())))
            .find(|path| path.is_file())
    }

    fn read_basis(&self, key: &str) -> Result<Arc<BasisSet>> {
        let not_found = || IntegralError::BasisNotFound {
            name: key.to_string(),
            search_dir: self.data_dir.clone(),
        };
        let path = self.locate(key).ok_or_else(not_found)?;
        let format = BasisFormat::from_path(&path).ok_or_else(not_found)?;

        let start = Instant::now();
        let text = fs::read_to_string(&path).map_err(|source| IntegralError::Io {
            path: path.clone(),
            source,
        })?;
        let basis = parse_basis(&text, format, key).map_err(|source| IntegralError::BasisParse {
            path: path.clone(),
            source,
        })?;

        info!(
            "loaded basis {} ({} elements, max l = {}) from {} in {:.3} ms",
            key,
            basis.num_elements(),
            basis.max_l(),
            path.display(),
            start.elapsed().as_secs_f64() * 1e3
        );
        Ok(Arc::new(basis))
    }
}
