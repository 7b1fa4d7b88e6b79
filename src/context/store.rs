use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::source::SourceContext;
use crate::api::error::Error;

pub const SOURCE_CONTEXT_KEY: &str = "survey_source_context";

/// Persistence port: one JSON record per key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;
}

/// Stores each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(raw))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, value)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Last persisted context. Unreadable or corrupt records count as absent.
pub fn load_context<S: KeyValueStore + ?Sized>(store: &S) -> SourceContext {
    let raw = match store.get(SOURCE_CONTEXT_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return SourceContext::default(),
        Err(err) => {
            warn!("Unable to read stored source context: {err}");
            return SourceContext::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(ctx) => ctx,
        Err(err) => {
            warn!("Ignoring invalid stored source context: {err}");
            SourceContext::default()
        }
    }
}

pub fn save_context<S: KeyValueStore + ?Sized>(
    store: &mut S,
    ctx: &SourceContext,
) -> Result<(), Error> {
    let payload = serde_json::to_string(ctx)?;
    store.set(SOURCE_CONTEXT_KEY, &payload)?;
    debug!("Persisted source context");
    Ok(())
}
