//! End-to-end ingestion of synthetic map archives into a temporary data
//! directory and SQLite database.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use spring_maps::error::IngestError;
use spring_maps::ingest::{IngestReport, MapIngestor};
use spring_maps::map::StartPos;
use spring_maps::parser::SdzParser;
use spring_maps::render::ASSET_FILES;
use spring_maps::sync::{MapIndex, MapStore, MapSync, SyncOutcome};
use spring_maps::writer::SqliteMapStore;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SMD: &str = "\
[MAP]
{
    Description=Legacy description;
    Gravity=130;
    MaxMetal=2.5;
    ExtractorRadius=400;
    [ATMOSPHERE]
    {
        MinWind=5;
        MaxWind=20;
    }
    [TEAM0]
    {
        StartPosX=100;
        StartPosZ=200;
    }
}
";

const MAPINFO: &str = "\
local mapinfo = {
    name = 'Tiny Lake',
    version = 'v1',
    description = 'Rich description',
    author = 'someone',
    gravity = 90,
    voidWater = true,
    teams = {
        [0] = { startPos = { x = 64, z = 64 } },
        [1] = { startPos = { x = 192, z = 192 } },
    },
}
return mapinfo
";

/// Minimal version 1 SMF: zeroed layers and a black DXT1 minimap
fn build_smf(map_x: u32, map_y: u32) -> Vec<u8> {
    let header_len = 80usize;
    let height_len = ((map_x + 1) * (map_y + 1) * 2) as usize;
    let layer_len = ((map_x / 2) * (map_y / 2)) as usize;
    let minimap_len = (1024 / 4) * (1024 / 4) * 8;

    let heightmap_ptr = header_len;
    let type_map_ptr = heightmap_ptr + height_len;
    let metal_map_ptr = type_map_ptr + layer_len;
    let minimap_ptr = metal_map_ptr + layer_len;

    let mut out = Vec::new();
    out.extend_from_slice(b"spring map file\0");
    for v in [1i32, 0, map_x as i32, map_y as i32, 8, 8, 32] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&0f32.to_le_bytes());
    out.extend_from_slice(&100f32.to_le_bytes());
    for v in [heightmap_ptr, type_map_ptr, 0, minimap_ptr, metal_map_ptr, 0, 0] {
        out.extend_from_slice(&(v as i32).to_le_bytes());
    }
    out.resize(minimap_ptr + minimap_len, 0);
    out
}

fn write_archive(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(file_name);
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
    path
}

struct Fixture {
    tmp: TempDir,
    index: MapIndex,
    ingestor: MapIngestor<SdzParser, SqliteMapStore>,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("in")).unwrap();

        let store = SqliteMapStore::open(&tmp.path().join("maps.db")).unwrap();
        let index = MapIndex::new();
        let sync = MapSync::new(store).with_listener(index.clone());
        let ingestor = MapIngestor::new(SdzParser::new(), sync, tmp.path().join("processed"));

        Self { tmp, index, ingestor }
    }

    fn input_dir(&self) -> PathBuf {
        self.tmp.path().join("in")
    }

    fn ingest(&mut self, path: &Path) -> Result<IngestReport, IngestError> {
        self.ingestor.ingest_with_report(path)
    }

    fn store(&self) -> &SqliteMapStore {
        self.ingestor.sync().store()
    }
}

#[test]
fn test_ingest_with_both_schemas() {
    let mut fx = Fixture::new();
    let smf = build_smf(256, 128);
    let archive = write_archive(
        &fx.input_dir(),
        "tiny_lake_v1.sdz",
        &[
            ("maps/tiny_lake.smf", smf.as_slice()),
            ("maps/tiny_lake.smd", SMD.as_bytes()),
            ("mapinfo.lua", MAPINFO.as_bytes()),
        ],
    );

    let report = fx.ingest(&archive).unwrap();
    assert_eq!(report.script_name, "Tiny Lake v1");
    assert_eq!(report.dest_dir, fx.tmp.path().join("processed/tiny_lake_v1"));
    assert!(matches!(report.outcome, SyncOutcome::Inserted(_)));

    for name in ASSET_FILES {
        assert!(report.dest_dir.join(name).is_file(), "missing {}", name);
    }
    let thumb = image::open(report.dest_dir.join("texture-thumb.jpg")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (250, 250));
    let lq = image::open(report.dest_dir.join("texture-lq.jpg")).unwrap();
    assert_eq!((lq.width(), lq.height()), (500, 250));

    let stored = fx.store().find_by_script_name("Tiny Lake v1").unwrap().unwrap();
    let map = stored.map;
    assert_eq!(map.file_name, "tiny_lake_v1");
    assert_eq!((map.width, map.height), (4, 2));
    assert_eq!(map.description.as_deref(), Some("Rich description"));
    assert_eq!(map.gravity, Some(90.0));
    assert_eq!(map.max_metal, Some(2.5));
    assert_eq!(map.extractor_radius, Some(400.0));
    assert_eq!(map.min_wind, Some(5.0));
    assert_eq!(map.author.as_deref(), Some("someone"));
    assert_eq!(map.void_water, Some(true));
    assert_eq!(
        map.start_positions,
        Some(vec![
            StartPos { x: 64.0, y: 0.0, z: 64.0 },
            StartPos { x: 192.0, y: 0.0, z: 192.0 },
        ])
    );
    assert!(map.map_info.is_some());

    assert_eq!(fx.index.script_names(), vec!["Tiny Lake v1".to_string()]);
}

#[test]
fn test_reingest_updates_in_place() {
    let mut fx = Fixture::new();
    let smf = build_smf(128, 128);
    let archive = write_archive(
        &fx.input_dir(),
        "tiny.sdz",
        &[("maps/tiny.smf", smf.as_slice()), ("mapinfo.lua", MAPINFO.as_bytes())],
    );

    let first = fx.ingest(&archive).unwrap();
    let SyncOutcome::Inserted(id) = first.outcome else {
        panic!("expected insert, got {:?}", first.outcome);
    };

    // stale file from an earlier render must not survive the replace
    fs::write(first.dest_dir.join("stale.txt"), b"old").unwrap();

    let second = fx.ingest(&archive).unwrap();
    assert_eq!(second.outcome, SyncOutcome::Updated(id));
    assert!(!second.dest_dir.join("stale.txt").exists());
    assert!(second.dest_dir.join("texture-hq.png").is_file());

    assert_eq!(fx.store().load_all().unwrap().len(), 1);
    assert_eq!(fx.index.len(), 1);
}

#[test]
fn test_script_name_trim_invariance() {
    let mut fx = Fixture::new();
    let smf = build_smf(128, 128);

    // mapinfo with an empty version yields "Dry Basin "
    let with_info = write_archive(
        &fx.input_dir(),
        "dry_a.sdz",
        &[
            ("maps/Dry Basin.smf", smf.as_slice()),
            ("mapinfo.lua", "return { name = 'Dry Basin', version = '' }".as_bytes()),
        ],
    );
    // no mapinfo falls back to the .smf name "Dry Basin"
    let smf_only = write_archive(&fx.input_dir(), "dry_b.sdz", &[("maps/Dry Basin.smf", smf.as_slice())]);

    let first = fx.ingest(&with_info).unwrap();
    assert_eq!(first.script_name, "Dry Basin");
    let second = fx.ingest(&smf_only).unwrap();
    assert!(matches!(second.outcome, SyncOutcome::Updated(_)));

    let all = fx.store().load_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].map.file_name, "dry_b");
    assert_eq!(all[0].map.description, None);
}

#[test]
fn test_corrupt_archive_fails_without_side_effects() {
    let mut fx = Fixture::new();
    let bogus = fx.input_dir().join("broken.sdz");
    fs::write(&bogus, b"definitely not a zip").unwrap();

    let err = fx.ingest(&bogus).unwrap_err();
    assert!(matches!(err, IngestError::Parse(_)));
    assert!(!fx.tmp.path().join("processed/broken").exists());
    assert!(fx.store().load_all().unwrap().is_empty());
    assert!(fx.index.is_empty());
}

#[test]
fn test_archive_without_smf_is_rejected() {
    let mut fx = Fixture::new();
    let archive = write_archive(
        &fx.input_dir(),
        "empty.sdz",
        &[("mapinfo.lua", MAPINFO.as_bytes())],
    );

    assert!(matches!(fx.ingest(&archive), Err(IngestError::Parse(_))));
}

#[test]
fn test_store_survives_reopen() {
    let mut fx = Fixture::new();
    let smf = build_smf(128, 128);
    let archive = write_archive(&fx.input_dir(), "a.sdz", &[("maps/Alpha.smf", smf.as_slice())]);
    fx.ingest(&archive).unwrap();

    let reopened = SqliteMapStore::open(&fx.tmp.path().join("maps.db")).unwrap();
    let index = MapIndex::new();
    index.refresh(&reopened).unwrap();
    assert!(index.get("Alpha").is_some());
}
