use crate::menu::config::{AUDIO_PREFERENCE, KEY_PREMIUM_PURCHASED, SHARED_PREFS};
use crate::menu::types::{PreferenceRecord, SettingsError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key-value preference storage
///
/// Reads never fail: anything missing or unreadable comes back as the
/// caller's default. Writes are durable once they return `Ok`.
pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn get_int(&self, key: &str, default: i64) -> i64;
    fn put_bool(&self, key: &str, value: bool) -> Result<(), SettingsError>;
    fn put_int(&self, key: &str, value: i64) -> Result<(), SettingsError>;
}

/// Preferences kept as one JSON object on disk, with an in-memory copy
pub struct JsonPrefsStore {
    path: PathBuf,
    cache: Mutex<Option<Map<String, Value>>>,
}

impl JsonPrefsStore {
    /// Store for the `sharedPrefs` namespace inside `dir`
    pub fn open(dir: &Path) -> Result<Self, SettingsError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| SettingsError::Storage(format!("Failed to create app data dir: {}", e)))?;

        Ok(Self {
            path: dir.join(format!("{}.json", SHARED_PREFS)),
            cache: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<Map<String, Value>, SettingsError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| SettingsError::Storage(format!("Failed to read preferences: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| SettingsError::Storage(format!("Failed to parse preferences: {}", e)))
    }

    fn write_file(&self, prefs: &Map<String, Value>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(prefs)
            .map_err(|e| SettingsError::Storage(format!("Failed to serialize preferences: {}", e)))?;

        // Replace via rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| SettingsError::Storage(format!("Failed to write preferences: {}", e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| SettingsError::Storage(format!("Failed to replace preferences: {}", e)))
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());

        if cache.is_none() {
            match self.read_file() {
                Ok(prefs) => *cache = Some(prefs),
                Err(e) => {
                    log::warn!("{}, falling back to defaults", e);
                    return None;
                }
            }
        }

        cache.as_ref().and_then(|prefs| prefs.get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());

        let mut prefs = match cache.take() {
            Some(prefs) => prefs,
            None => self.read_file().unwrap_or_else(|e| {
                log::warn!("{}, starting from empty preferences", e);
                Map::new()
            }),
        };
        let previous = prefs.insert(key.to_string(), value);

        let written = self.write_file(&prefs);
        if written.is_err() {
            // Keep the cache in line with what is on disk
            match previous {
                Some(old) => prefs.insert(key.to_string(), old),
                None => prefs.remove(key),
            };
        }
        *cache = Some(prefs);
        written
    }
}

impl PreferenceStore for JsonPrefsStore {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.lookup(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.lookup(key).and_then(|v| v.as_i64()).unwrap_or(default)
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), SettingsError> {
        self.put(key, Value::Bool(value))
    }

    fn put_int(&self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.put(key, Value::from(value))
    }
}

/// Volatile store, used when the app data dir is unusable
#[derive(Default)]
pub struct MemoryPrefsStore {
    values: Mutex<Map<String, Value>>,
}

impl PreferenceStore for MemoryPrefsStore {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), SettingsError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), Value::Bool(value));
        Ok(())
    }

    fn put_int(&self, key: &str, value: i64) -> Result<(), SettingsError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), Value::from(value));
        Ok(())
    }
}

/// Typed view over the two menu preferences
#[derive(Clone)]
pub struct Entitlements {
    store: Arc<dyn PreferenceStore>,
}

impl Entitlements {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Sound effects are on unless explicitly stored as 0
    pub fn audio_enabled(&self) -> bool {
        self.store.get_int(AUDIO_PREFERENCE, 1) == 1
    }

    pub fn set_audio_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        self.store.put_int(AUDIO_PREFERENCE, if enabled { 1 } else { 0 })
    }

    pub fn premium_purchased(&self) -> bool {
        self.store.get_bool(KEY_PREMIUM_PURCHASED, false)
    }

    /// Record a confirmed premium purchase. There is no way to unset it.
    pub fn mark_premium_purchased(&self) -> Result<(), SettingsError> {
        self.store.put_bool(KEY_PREMIUM_PURCHASED, true)
    }

    pub fn record(&self) -> PreferenceRecord {
        PreferenceRecord {
            audio_enabled: self.audio_enabled(),
            premium_purchased: self.premium_purchased(),
        }
    }
}
