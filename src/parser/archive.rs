use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use super::mapinfo::parse_mapinfo;
use super::smd::parse_smd;
use super::smf::parse_smf;
use crate::error::ParseError;
use crate::map::{MapImagery, MapMetadata, ParsedArchive, PhysicalSize, RichMetadata};

/// Turns a map archive on disk into its layers and metadata
pub trait ArchiveParser {
    fn parse(&self, path: &Path) -> Result<ParsedArchive, ParseError>;
}

/// Parser for zip-packed (`.sdz`) Spring map archives
#[derive(Debug, Default, Clone, Copy)]
pub struct SdzParser;

impl SdzParser {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveParser for SdzParser {
    fn parse(&self, path: &Path) -> Result<ParsedArchive, ParseError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if extension.as_deref() == Some("sd7") {
            return Err(ParseError::UnsupportedArchive(
                "7z (.sd7) archives are not supported, repack as .sdz".to_string(),
            ));
        }

        let file = File::open(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let file_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        parse_zip(&mut archive, path, file_name)
    }
}

fn parse_zip<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
    file_name: String,
) -> Result<ParsedArchive, ParseError> {
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    let smf_name = names
        .iter()
        .find(|n| is_map_entry(n, ".smf"))
        .cloned()
        .ok_or(ParseError::MissingEntry("maps/*.smf"))?;
    let smf_stem = stem(&smf_name);

    // prefer the .smd sharing the .smf's name
    let smd_name = names
        .iter()
        .filter(|n| is_map_entry(n, ".smd"))
        .max_by_key(|n| stem(n).eq_ignore_ascii_case(&smf_stem))
        .cloned();
    let mapinfo_name = names
        .iter()
        .find(|n| n.eq_ignore_ascii_case("mapinfo.lua"))
        .cloned();

    debug!(smf = %smf_name, smd = ?smd_name, mapinfo = ?mapinfo_name, "Reading archive entries");

    let layers = parse_smf(&read_entry(archive, &smf_name, path)?)?;

    let legacy = match smd_name {
        Some(name) => {
            let bytes = read_entry(archive, &name, path)?;
            Some(parse_smd(&String::from_utf8_lossy(&bytes))?)
        }
        None => None,
    };

    let rich = match mapinfo_name {
        Some(name) => {
            let bytes = read_entry(archive, &name, path)?;
            read_mapinfo(&String::from_utf8_lossy(&bytes), path)
        }
        None => None,
    };

    let script_name = script_name(rich.as_ref(), &smf_stem);

    Ok(ParsedArchive {
        file_name,
        script_name,
        physical_size: PhysicalSize {
            width_units: layers.header.width_units(),
            height_units: layers.header.height_units(),
        },
        imagery: MapImagery {
            height: layers.height,
            metal: layers.metal,
            type_map: layers.type_map,
            texture: layers.texture,
        },
        metadata: MapMetadata::from_parts(rich, legacy),
    })
}

/// A mapinfo.lua that needs a real interpreter is skipped, not fatal
fn read_mapinfo(source: &str, path: &Path) -> Option<RichMetadata> {
    match parse_mapinfo(source) {
        Ok(rich) => Some(rich),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring mapinfo.lua");
            None
        }
    }
}

/// `"<name> <version>"` when mapinfo names the map, else the .smf file name
fn script_name(rich: Option<&RichMetadata>, smf_stem: &str) -> String {
    match rich.and_then(|r| r.name.as_deref()) {
        Some(name) => format!(
            "{} {}",
            name,
            rich.and_then(|r| r.version.as_deref()).unwrap_or_default()
        ),
        None => smf_stem.to_string(),
    }
}

fn is_map_entry(name: &str, extension: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("maps/") && lower.ends_with(extension)
}

fn stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    path: &Path,
) -> Result<Vec<u8>, ParseError> {
    let mut entry = archive.by_name(name)?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf).map_err(|source| ParseError::Io {
        path: PathBuf::from(path).join(name),
        source,
    })?;
    Ok(buf)
}
