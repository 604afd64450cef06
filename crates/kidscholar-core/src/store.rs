//! Client-side persistence for the learner profile.
//!
//! Storage is a flat string key/value space, one key per record. The profile
//! lives under a fixed namespace key; credentials written by older revisions
//! under separate keys are folded back into the profile on load.

use crate::error::{LearnError, Result};
use crate::profile::Profile;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Namespace key holding the serialized profile.
pub const PROFILE_KEY: &str = "kidscholar_profile";
/// Separate credential keys used by older revisions.
pub const LEGACY_API_KEY: &str = "openai_api_key";
pub const LEGACY_BASE_URL_KEY: &str = "openai_api_base_url";

/// Synchronous string storage keyed by name.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under `<config_dir>/kidscholar`.
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LearnError::config("Could not determine config directory"))?;
        Ok(Self::new(config_dir.join("kidscholar")))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Write a sibling temp file, then rename over the target.
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        debug!(key, path = %path.display(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage; nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| LearnError::storage("memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

/// Holds the current profile and keeps it in step with storage.
///
/// The store does not validate; the setup flow checks required fields
/// before calling [`ProfileStore::save`].
pub struct ProfileStore {
    storage: Box<dyn Storage>,
    current: Option<Profile>,
}

impl ProfileStore {
    /// Opens the store and loads whatever profile is persisted.
    pub fn open(storage: Box<dyn Storage>) -> Self {
        let mut store = Self {
            storage,
            current: None,
        };
        store.load();
        store
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.current.as_ref()
    }

    /// Reads the persisted profile into memory.
    ///
    /// Absent, unreadable or unparsable records all yield `None`.
    pub fn load(&mut self) -> Option<Profile> {
        let raw = match self.storage.get(PROFILE_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to read saved profile");
                None
            }
        };

        let loaded = raw.and_then(|raw| match serde_json::from_str::<Profile>(&raw) {
            Ok(profile) => Some(self.merge_legacy_credentials(profile)),
            Err(e) => {
                warn!(error = %e, "error parsing saved profile");
                None
            }
        });
        self.current = loaded.clone();
        loaded
    }

    /// Replaces the persisted profile wholesale.
    pub fn save(&mut self, profile: Profile) -> Result<()> {
        let raw = serde_json::to_string(&profile)?;
        self.storage.set(PROFILE_KEY, &raw)?;
        self.current = Some(profile);
        Ok(())
    }

    /// Removes the persisted profile and any legacy credential keys.
    pub fn clear(&mut self) -> Result<()> {
        self.current = None;
        self.storage.remove(PROFILE_KEY)?;
        self.storage.remove(LEGACY_API_KEY)?;
        self.storage.remove(LEGACY_BASE_URL_KEY)?;
        Ok(())
    }

    fn merge_legacy_credentials(&self, mut profile: Profile) -> Profile {
        if is_blank(&profile.api_key) {
            if let Some(key) = self.read_legacy(LEGACY_API_KEY) {
                profile.api_key = Some(key);
            }
        }
        if is_blank(&profile.api_base_url) {
            if let Some(url) = self.read_legacy(LEGACY_BASE_URL_KEY) {
                profile.api_base_url = Some(url);
            }
        }
        profile
    }

    fn read_legacy(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                warn!(key, error = %e, "failed to read legacy credential");
                None
            }
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
