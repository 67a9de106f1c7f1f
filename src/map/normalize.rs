use super::model::{CanonicalMap, MapMetadata, ParsedArchive};

/// SMF reports size in 128-square units; map sizes are quoted in 64-square units
const SIZE_UNIT_FACTOR: u32 = 2;

/// Reconcile the rich and legacy schemas into one record.
///
/// Rich values win field by field; the legacy value is only used where the
/// rich schema is absent or leaves the field unset.
pub fn normalize(parsed: &ParsedArchive) -> CanonicalMap {
    let rich = parsed.metadata.as_ref().and_then(MapMetadata::rich);
    let legacy = parsed.metadata.as_ref().and_then(MapMetadata::legacy);

    macro_rules! resolve {
        ($field:ident) => {
            rich.and_then(|r| r.$field.clone())
                .or_else(|| legacy.and_then(|l| l.$field.clone()))
        };
    }

    macro_rules! rich_only {
        ($field:ident) => {
            rich.and_then(|r| r.$field.clone())
        };
    }

    let start_positions = rich
        .and_then(|r| r.start_positions.clone())
        .or_else(|| legacy.map(|l| l.start_positions.clone()));

    CanonicalMap {
        file_name: parsed.file_name.clone(),
        script_name: parsed.script_name.trim().to_string(),
        description: resolve!(description),
        map_hardness: resolve!(map_hardness),
        gravity: resolve!(gravity),
        tidal_strength: resolve!(tidal_strength),
        max_metal: resolve!(max_metal),
        extractor_radius: resolve!(extractor_radius),
        min_wind: resolve!(min_wind),
        max_wind: resolve!(max_wind),
        start_positions,
        width: parsed.physical_size.width_units * SIZE_UNIT_FACTOR,
        height: parsed.physical_size.height_units * SIZE_UNIT_FACTOR,
        min_depth: rich_only!(min_depth),
        max_depth: rich_only!(max_depth),
        name: rich_only!(name),
        shortname: rich_only!(shortname),
        author: rich_only!(author),
        version: rich_only!(version),
        mapfile: rich_only!(mapfile),
        modtype: rich_only!(modtype),
        not_deformable: rich_only!(not_deformable),
        void_water: rich_only!(void_water),
        void_ground: rich_only!(void_ground),
        auto_show_metal: rich_only!(auto_show_metal),
        map_info: rich.map(|r| r.raw.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::model::{
        LegacyMetadata, MapImagery, PhysicalSize, RichMetadata, StartPos,
    };
    use image::DynamicImage;
    use serde_json::json;

    fn archive(metadata: Option<MapMetadata>) -> ParsedArchive {
        ParsedArchive {
            file_name: "comet_catcher_redux".to_string(),
            script_name: "  Comet Catcher Redux v3.1 ".to_string(),
            imagery: MapImagery {
                height: DynamicImage::new_luma16(1, 1),
                metal: DynamicImage::new_luma8(1, 1),
                type_map: DynamicImage::new_luma8(1, 1),
                texture: DynamicImage::new_rgb8(1, 1),
            },
            metadata,
            physical_size: PhysicalSize {
                width_units: 6,
                height_units: 8,
            },
        }
    }

    fn rich() -> RichMetadata {
        RichMetadata {
            name: Some("Comet Catcher Redux".to_string()),
            description: Some("rich description".to_string()),
            version: Some("v3.1".to_string()),
            gravity: Some(100.0),
            map_hardness: Some(250.0),
            tidal_strength: Some(13.0),
            max_metal: Some(1.8),
            extractor_radius: Some(90.0),
            min_wind: Some(4.0),
            max_wind: Some(16.0),
            void_water: Some(true),
            start_positions: Some(vec![StartPos { x: 1.0, y: 0.0, z: 2.0 }]),
            raw: json!({ "name": "Comet Catcher Redux" }),
            ..Default::default()
        }
    }

    fn legacy() -> LegacyMetadata {
        LegacyMetadata {
            description: Some("legacy description".to_string()),
            map_hardness: Some(100.0),
            gravity: Some(130.0),
            tidal_strength: Some(20.0),
            max_metal: Some(2.0),
            extractor_radius: Some(500.0),
            min_wind: Some(5.0),
            max_wind: Some(25.0),
            start_positions: vec![
                StartPos { x: 10.0, y: 0.0, z: 20.0 },
                StartPos { x: 30.0, y: 0.0, z: 40.0 },
            ],
        }
    }

    #[test]
    fn test_rich_takes_precedence() {
        let map = normalize(&archive(MapMetadata::from_parts(Some(rich()), Some(legacy()))));
        assert_eq!(map.description.as_deref(), Some("rich description"));
        assert_eq!(map.gravity, Some(100.0));
        assert_eq!(map.map_hardness, Some(250.0));
        assert_eq!(map.tidal_strength, Some(13.0));
        assert_eq!(map.max_metal, Some(1.8));
        assert_eq!(map.extractor_radius, Some(90.0));
        assert_eq!(map.min_wind, Some(4.0));
        assert_eq!(map.max_wind, Some(16.0));
        assert_eq!(map.start_positions, Some(vec![StartPos { x: 1.0, y: 0.0, z: 2.0 }]));
        assert_eq!(map.void_water, Some(true));
        assert_eq!(map.map_info, Some(json!({ "name": "Comet Catcher Redux" })));
    }

    #[test]
    fn test_legacy_only() {
        let map = normalize(&archive(MapMetadata::from_parts(None, Some(legacy()))));
        let l = legacy();
        assert_eq!(map.description, l.description);
        assert_eq!(map.map_hardness, l.map_hardness);
        assert_eq!(map.gravity, l.gravity);
        assert_eq!(map.tidal_strength, l.tidal_strength);
        assert_eq!(map.max_metal, l.max_metal);
        assert_eq!(map.extractor_radius, l.extractor_radius);
        assert_eq!(map.min_wind, l.min_wind);
        assert_eq!(map.max_wind, l.max_wind);
        assert_eq!(map.start_positions, Some(l.start_positions));
        assert_eq!(map.name, None);
        assert_eq!(map.map_info, None);
    }

    #[test]
    fn test_unset_rich_field_falls_back() {
        let mut partial = rich();
        partial.gravity = None;
        partial.start_positions = None;
        let map = normalize(&archive(MapMetadata::from_parts(Some(partial), Some(legacy()))));
        assert_eq!(map.gravity, Some(130.0));
        assert_eq!(map.start_positions.map(|s| s.len()), Some(2));
        assert_eq!(map.map_hardness, Some(250.0));
    }

    #[test]
    fn test_empty_teams_table_is_kept() {
        let mut partial = rich();
        partial.start_positions = Some(Vec::new());
        let map = normalize(&archive(MapMetadata::from_parts(Some(partial), Some(legacy()))));
        assert_eq!(map.start_positions, Some(Vec::new()));
    }

    #[test]
    fn test_no_metadata() {
        let map = normalize(&archive(None));
        assert_eq!(map.description, None);
        assert_eq!(map.start_positions, None);
        assert_eq!(map.width, 12);
        assert_eq!(map.height, 16);
    }

    #[test]
    fn test_script_name_trimmed_and_deterministic() {
        let parsed = archive(MapMetadata::from_parts(Some(rich()), None));
        let first = normalize(&parsed);
        assert_eq!(first.script_name, "Comet Catcher Redux v3.1");
        assert_eq!(first, normalize(&parsed));
    }
}
