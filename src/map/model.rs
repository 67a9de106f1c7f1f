use image::DynamicImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A team start position in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StartPos {
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub z: f64,
}

/// Metadata from `mapinfo.lua`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichMetadata {
    pub name: Option<String>,
    pub shortname: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub mapfile: Option<String>,
    pub modtype: Option<f64>,
    pub map_hardness: Option<f64>,
    pub gravity: Option<f64>,
    pub tidal_strength: Option<f64>,
    pub max_metal: Option<f64>,
    pub extractor_radius: Option<f64>,
    pub min_wind: Option<f64>,
    pub max_wind: Option<f64>,
    pub min_depth: Option<f64>,
    pub max_depth: Option<f64>,
    pub not_deformable: Option<bool>,
    pub void_water: Option<bool>,
    pub void_ground: Option<bool>,
    pub auto_show_metal: Option<bool>,
    /// Present when the file has a `teams` table, even an empty one
    pub start_positions: Option<Vec<StartPos>>,
    /// The whole table, kept as an opaque blob
    pub raw: Value,
}

/// Metadata from the legacy `.smd` file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyMetadata {
    pub description: Option<String>,
    pub map_hardness: Option<f64>,
    pub gravity: Option<f64>,
    pub tidal_strength: Option<f64>,
    pub max_metal: Option<f64>,
    pub extractor_radius: Option<f64>,
    pub min_wind: Option<f64>,
    pub max_wind: Option<f64>,
    pub start_positions: Vec<StartPos>,
}

/// Which metadata schemas an archive carried
#[derive(Debug, Clone, PartialEq)]
pub enum MapMetadata {
    Rich(RichMetadata),
    Legacy(LegacyMetadata),
    Both {
        rich: RichMetadata,
        legacy: LegacyMetadata,
    },
}

impl MapMetadata {
    pub fn from_parts(rich: Option<RichMetadata>, legacy: Option<LegacyMetadata>) -> Option<Self> {
        match (rich, legacy) {
            (Some(rich), Some(legacy)) => Some(MapMetadata::Both { rich, legacy }),
            (Some(rich), None) => Some(MapMetadata::Rich(rich)),
            (None, Some(legacy)) => Some(MapMetadata::Legacy(legacy)),
            (None, None) => None,
        }
    }

    pub fn rich(&self) -> Option<&RichMetadata> {
        match self {
            MapMetadata::Rich(rich) | MapMetadata::Both { rich, .. } => Some(rich),
            MapMetadata::Legacy(_) => None,
        }
    }

    pub fn legacy(&self) -> Option<&LegacyMetadata> {
        match self {
            MapMetadata::Legacy(legacy) | MapMetadata::Both { legacy, .. } => Some(legacy),
            MapMetadata::Rich(_) => None,
        }
    }
}

/// Raster layers extracted from an archive
#[derive(Debug, Clone)]
pub struct MapImagery {
    pub height: DynamicImage,
    pub metal: DynamicImage,
    pub type_map: DynamicImage,
    pub texture: DynamicImage,
}

/// Map size in SMF units (128 heightmap squares each)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width_units: u32,
    pub height_units: u32,
}

/// Everything the archive parser extracts from one map
#[derive(Debug, Clone)]
pub struct ParsedArchive {
    pub file_name: String,
    pub script_name: String,
    pub imagery: MapImagery,
    pub metadata: Option<MapMetadata>,
    pub physical_size: PhysicalSize,
}

/// The reconciled, storable description of a map
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalMap {
    pub file_name: String,
    pub script_name: String,
    pub description: Option<String>,
    pub map_hardness: Option<f64>,
    pub gravity: Option<f64>,
    pub tidal_strength: Option<f64>,
    pub max_metal: Option<f64>,
    pub extractor_radius: Option<f64>,
    pub min_wind: Option<f64>,
    pub max_wind: Option<f64>,
    pub start_positions: Option<Vec<StartPos>>,
    pub width: u32,
    pub height: u32,
    pub min_depth: Option<f64>,
    pub max_depth: Option<f64>,
    pub name: Option<String>,
    pub shortname: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub mapfile: Option<String>,
    pub modtype: Option<f64>,
    pub not_deformable: Option<bool>,
    pub void_water: Option<bool>,
    pub void_ground: Option<bool>,
    pub auto_show_metal: Option<bool>,
    pub map_info: Option<Value>,
}
