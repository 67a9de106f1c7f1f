//! Upsert policy for the map catalogue
//!
//! Maps are keyed by their trimmed script name. An existing record is
//! overwritten in full; a new record is inserted and announced to listeners
//! (the in-memory index reloads on that event). Updates are not announced
//! since they never change the set of script names.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::map::CanonicalMap;

/// A map as persisted, with its row id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMap {
    pub id: i64,
    pub map: CanonicalMap,
}

/// Persistent map catalogue
pub trait MapStore {
    fn find_by_script_name(&self, script_name: &str) -> Result<Option<StoredMap>, StoreError>;
    fn insert(&mut self, map: &CanonicalMap) -> Result<i64, StoreError>;
    fn update(&mut self, id: i64, map: &CanonicalMap) -> Result<(), StoreError>;
    fn load_all(&self) -> Result<Vec<StoredMap>, StoreError>;
}

/// Emitted after the catalogue gains a new identity
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Inserted { id: i64, script_name: String },
}

/// Something that reacts to catalogue changes
pub trait StoreListener {
    fn on_event(&mut self, event: &StoreEvent, store: &dyn MapStore) -> Result<(), StoreError>;
}

/// What `MapSync::sync` did with a map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Inserted(i64),
    Updated(i64),
}

pub struct MapSync<S> {
    store: S,
    listeners: Vec<Box<dyn StoreListener>>,
}

impl<S: MapStore> MapSync<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            listeners: Vec::new(),
        }
    }

    pub fn with_listener(mut self, listener: impl StoreListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert or fully overwrite the record for `map.script_name`
    pub fn sync(&mut self, map: &CanonicalMap) -> Result<SyncOutcome, StoreError> {
        let map = trimmed(map);
        let map = map.as_ref();
        let script_name = map.script_name.as_str();

        match self.store.find_by_script_name(script_name)? {
            Some(existing) => {
                info!(script_name, id = existing.id, "Map already processed, updating");
                self.store.update(existing.id, map)?;
                Ok(SyncOutcome::Updated(existing.id))
            }
            None => {
                let id = self.store.insert(map)?;
                info!(script_name, id, "New map stored");

                let event = StoreEvent::Inserted {
                    id,
                    script_name: script_name.to_string(),
                };
                for listener in &mut self.listeners {
                    listener.on_event(&event, &self.store)?;
                }
                Ok(SyncOutcome::Inserted(id))
            }
        }
    }
}

/// The record as stored: identical to `map` but with a trimmed script name
fn trimmed(map: &CanonicalMap) -> Cow<'_, CanonicalMap> {
    let script_name = map.script_name.trim();
    if script_name.len() == map.script_name.len() {
        Cow::Borrowed(map)
    } else {
        Cow::Owned(CanonicalMap {
            script_name: script_name.to_string(),
            ..map.clone()
        })
    }
}

/// In-memory index of every stored map, keyed by script name
#[derive(Debug, Clone, Default)]
pub struct MapIndex {
    maps: Arc<RwLock<BTreeMap<String, CanonicalMap>>>,
}

impl MapIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload every map from the store
    pub fn refresh(&self, store: &dyn MapStore) -> Result<(), StoreError> {
        let loaded: BTreeMap<String, CanonicalMap> = store
            .load_all()?
            .into_iter()
            .map(|stored| (stored.map.script_name.clone(), stored.map))
            .collect();

        debug!(count = loaded.len(), "Map index refreshed");
        *self.maps.write().unwrap_or_else(|e| e.into_inner()) = loaded;
        Ok(())
    }

    pub fn get(&self, script_name: &str) -> Option<CanonicalMap> {
        self.maps
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(script_name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.maps.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn script_names(&self) -> Vec<String> {
        self.maps
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl StoreListener for MapIndex {
    fn on_event(&mut self, event: &StoreEvent, store: &dyn MapStore) -> Result<(), StoreError> {
        match event {
            StoreEvent::Inserted { .. } => self.refresh(store),
        }
    }
}
