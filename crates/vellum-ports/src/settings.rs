//! Settings Port.
//!
//! A single JSON settings record at a fixed per-user location. Loading
//! merges over hard-coded defaults, so newly introduced fields are
//! populated even from an older file, and unknown keys are tolerated.
//! The in-memory cache is read-through (a miss triggers a full reload
//! before the first read) and `set` is immediately durable: the write to
//! disk and the cache update happen together, never debounced.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use vellum_core::Settings;

use crate::{PortError, PortResult};

/// The settings contract consumed by the command layer.
#[async_trait]
pub trait SettingsPort: Send + Sync {
    /// Reloads from disk, replacing the cache.
    async fn load(&self) -> PortResult<Settings>;

    /// Persists a full record, replacing the cache.
    async fn save(&self, settings: &Settings) -> PortResult<()>;

    /// Current record, served from cache when warm.
    async fn current(&self) -> PortResult<Settings>;

    /// Reads one dotted key, e.g. `"ui.theme"`.
    async fn get(&self, key: &str) -> PortResult<Value>;

    /// Writes one dotted key durably.
    async fn set(&self, key: &str, value: Value) -> PortResult<()>;
}

struct Cached {
    settings: Settings,
    /// Raw on-disk document; carries keys this build does not know about
    /// so a round-trip never drops them.
    raw: Value,
}

/// JSON-file-backed settings store.
pub struct JsonSettings {
    path: PathBuf,
    cache: Mutex<Option<Cached>>,
}

impl JsonSettings {
    /// Store at the default per-user location.
    pub fn at_default_path() -> PortResult<Self> {
        Ok(Self::at_path(Self::default_path()?))
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// `<config dir>/vellum/settings.json`
    pub fn default_path() -> PortResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(PortError::NoConfigDir)?;
        Ok(config_dir.join("vellum").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> PortResult<Value> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Value::Object(serde_json::Map::new()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_raw(&self, raw: &Value) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(raw)?;
        tokio::fs::write(&self.path, text).await?;
        Ok(())
    }

    fn parse(raw: &Value) -> Settings {
        // Missing keys default silently; unknown keys are ignored here
        // but preserved in the raw document.
        serde_json::from_value(raw.clone()).unwrap_or_default()
    }

    async fn reload_into(&self, cache: &mut Option<Cached>) -> PortResult<Settings> {
        let raw = self.read_raw().await?;
        let settings = Self::parse(&raw);
        *cache = Some(Cached {
            settings: settings.clone(),
            raw,
        });
        Ok(settings)
    }
}

#[async_trait]
impl SettingsPort for JsonSettings {
    async fn load(&self) -> PortResult<Settings> {
        let mut cache = self.cache.lock().await;
        self.reload_into(&mut cache).await
    }

    async fn save(&self, settings: &Settings) -> PortResult<()> {
        let mut cache = self.cache.lock().await;
        let mut raw = match cache.as_ref() {
            Some(cached) => cached.raw.clone(),
            None => self.read_raw().await?,
        };
        merge_value(&mut raw, serde_json::to_value(settings)?);
        self.write_raw(&raw).await?;
        *cache = Some(Cached {
            settings: settings.clone(),
            raw,
        });
        Ok(())
    }

    async fn current(&self) -> PortResult<Settings> {
        let mut cache = self.cache.lock().await;
        match cache.as_ref() {
            Some(cached) => Ok(cached.settings.clone()),
            None => self.reload_into(&mut cache).await,
        }
    }

    async fn get(&self, key: &str) -> PortResult<Value> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            self.reload_into(&mut cache).await?;
        }
        let cached = cache.as_ref().expect("cache warmed above");
        // Resolve against the full record (defaults included), not just
        // the raw file.
        let full = serde_json::to_value(&cached.settings)?;
        lookup(&full, key)
            .or_else(|| lookup(&cached.raw, key))
            .cloned()
            .ok_or_else(|| PortError::UnknownKey(key.to_string()))
    }

    async fn set(&self, key: &str, value: Value) -> PortResult<()> {
        let mut cache = self.cache.lock().await;
        let mut raw = match cache.as_ref() {
            Some(cached) => cached.raw.clone(),
            None => self.read_raw().await?,
        };
        insert(&mut raw, key, value);
        // Durable write and cache update together.
        self.write_raw(&raw).await?;
        *cache = Some(Cached {
            settings: Self::parse(&raw),
            raw,
        });
        Ok(())
    }
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = root;
    for part in key.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn insert(root: &mut Value, key: &str, value: Value) {
    let mut current = root;
    let parts: Vec<&str> = key.split('.').collect();
    for (i, part) in parts.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().expect("object ensured above");
        if i == parts.len() - 1 {
            map.insert((*part).to_string(), value);
            return;
        }
        current = map
            .entry((*part).to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

/// Deep-merges `incoming` over `base`, object keys recursively and
/// everything else by replacement.
fn merge_value(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (k, v) in incoming_map {
                match base_map.get_mut(&k) {
                    Some(existing) => merge_value(existing, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (base, incoming) => *base = incoming,
    }
}
