//! Map pool generation from the curated map spreadsheet

pub mod classify;
pub mod serialize;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

use crate::error::PoolError;
use crate::sheets::MatrixReader;

pub use classify::{classify, ColumnLayout, MapRow, SizeClass, PRESETS};
pub use serialize::{serialize_pools, sheet_url};

/// File name the generated config is served and saved under
pub const MAP_LISTS_FILE_NAME: &str = "mapLists.conf";

/// Generator named in the banner of every generated config
pub const GENERATOR_NAME: &str = "spring-maps";

pub const CERTIFIED: &str = "certified";
pub const UNCERTIFIED: &str = "uncertified";
pub const SMALL: &str = "small";
pub const MEDIUM: &str = "medium";
pub const LARGE: &str = "large";
pub const EXTRA_LARGE: &str = "extraLarge";
pub const MISC: &str = "misc";

/// Pools every generated set starts with, in output order
pub const FIXED_POOLS: &[&str] = &[CERTIFIED, UNCERTIFIED, SMALL, MEDIUM, LARGE, EXTRA_LARGE, MISC];

/// Named pools of map names. Pools and their members keep insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapPoolSet {
    pools: Vec<(String, Vec<String>)>,
}

impl MapPoolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding the fixed pools, all empty
    pub fn with_fixed_pools() -> Self {
        let mut set = Self::new();
        for name in FIXED_POOLS {
            set.add_pool(name);
        }
        set
    }

    /// Add an empty pool unless one with that name exists
    pub fn add_pool(&mut self, name: &str) {
        if self.get(name).is_none() {
            self.pools.push((name.to_string(), Vec::new()));
        }
    }

    /// Append a map to a pool, creating the pool if needed
    pub fn push(&mut self, pool: &str, map: impl Into<String>) {
        let map = map.into();
        match self.pools.iter_mut().find(|(name, _)| name == pool) {
            Some((_, maps)) => maps.push(map),
            None => self.pools.push((pool.to_string(), vec![map])),
        }
    }

    pub fn get(&self, pool: &str) -> Option<&[String]> {
        self.pools
            .iter()
            .find(|(name, _)| name == pool)
            .map(|(_, maps)| maps.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.pools
            .iter()
            .map(|(name, maps)| (name.as_str(), maps.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl<N: Into<String>, M: Into<String>> FromIterator<(N, Vec<M>)> for MapPoolSet {
    fn from_iter<T: IntoIterator<Item = (N, Vec<M>)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (name, maps) in iter {
            let name = name.into();
            set.add_pool(&name);
            for map in maps {
                set.push(&name, map);
            }
        }
        set
    }
}

impl Serialize for MapPoolSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pools.len()))?;
        for (name, maps) in &self.pools {
            map.serialize_entry(name, maps)?;
        }
        map.end()
    }
}

/// Classified pools together with their rendered config text
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPools {
    pub map_pools: MapPoolSet,
    pub config_text: String,
}

/// Fetch the spreadsheet, classify every row and render `mapLists.conf`.
/// Fails as a whole; no partial config is produced.
pub fn generate_pools(
    reader: &dyn MatrixReader,
    sheet_id: &str,
    api_key: &str,
) -> Result<GeneratedPools, PoolError> {
    let grid = reader.load_grid(sheet_id, api_key)?;
    let map_pools = classify(&grid)?;
    let config_text = serialize_pools(&map_pools, &sheet_url(sheet_id))?;

    info!(
        pools = map_pools.len(),
        bytes = config_text.len(),
        "Map pools generated"
    );

    Ok(GeneratedPools {
        map_pools,
        config_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_pools_order() {
        let set = MapPoolSet::with_fixed_pools();
        let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, FIXED_POOLS);
        assert!(set.iter().all(|(_, maps)| maps.is_empty()));
    }

    #[test]
    fn test_push_keeps_order() {
        let mut set = MapPoolSet::new();
        set.push("b", "Map 2");
        set.push("a", "Map 1");
        set.push("b", "Map 3");
        set.add_pool("b");

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("b").unwrap(), ["Map 2", "Map 3"]);
        assert_eq!(set.iter().next().unwrap().0, "b");
    }

    #[test]
    fn test_serialize_json_in_order() {
        let set: MapPoolSet = vec![("small", vec!["A", "B"]), ("large", vec![])]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"small":["A","B"],"large":[]}"#);
    }
}
