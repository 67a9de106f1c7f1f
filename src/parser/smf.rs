//! Spring Map File (SMF) header and raster layers

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

use super::dxt::{decode_dxt1, dxt1_len};
use crate::error::ParseError;

const MAGIC: &[u8; 16] = b"spring map file\0";
const HEADER_LEN: usize = 80;
const MINIMAP_SIZE: u32 = 1024;

/// Heightmap squares per reported size unit
pub const SQUARES_PER_UNIT: u32 = 128;

/// Largest accepted `mapx`/`mapy`, 128 size units
pub const MAX_DIMENSION: u32 = SQUARES_PER_UNIT * 128;

/// The parts of the SMF header this tool uses
#[derive(Debug, Clone, PartialEq)]
pub struct SmfHeader {
    pub version: i32,
    pub map_x: u32,
    pub map_y: u32,
    pub min_height: f32,
    pub max_height: f32,
    pub heightmap_ptr: usize,
    pub type_map_ptr: usize,
    pub minimap_ptr: usize,
    pub metal_map_ptr: usize,
}

/// Decoded raster layers of a map
#[derive(Debug, Clone)]
pub struct SmfLayers {
    pub header: SmfHeader,
    pub height: DynamicImage,
    pub type_map: DynamicImage,
    pub metal: DynamicImage,
    pub texture: DynamicImage,
}

impl SmfHeader {
    pub fn width_units(&self) -> u32 {
        self.map_x / SQUARES_PER_UNIT
    }

    pub fn height_units(&self) -> u32 {
        self.map_y / SQUARES_PER_UNIT
    }
}

pub fn parse_header(bytes: &[u8]) -> Result<SmfHeader, ParseError> {
    if bytes.len() < HEADER_LEN {
        return Err(ParseError::Smf(format!(
            "file is {} bytes, shorter than the header",
            bytes.len()
        )));
    }
    if &bytes[..16] != MAGIC {
        return Err(ParseError::Smf("bad magic".to_string()));
    }

    let version = read_i32(bytes, 16);
    if version != 1 {
        return Err(ParseError::Smf(format!("unsupported version {}", version)));
    }

    let map_x = read_dimension(bytes, 24, "mapx")?;
    let map_y = read_dimension(bytes, 28, "mapy")?;

    Ok(SmfHeader {
        version,
        map_x,
        map_y,
        min_height: read_f32(bytes, 44),
        max_height: read_f32(bytes, 48),
        heightmap_ptr: read_ptr(bytes, 52, "heightmap")?,
        type_map_ptr: read_ptr(bytes, 56, "type map")?,
        minimap_ptr: read_ptr(bytes, 64, "minimap")?,
        metal_map_ptr: read_ptr(bytes, 68, "metal map")?,
    })
}

/// Parse the header and decode the height, type, metal and minimap layers
pub fn parse_smf(bytes: &[u8]) -> Result<SmfLayers, ParseError> {
    let header = parse_header(bytes)?;
    let (mx, my) = (header.map_x, header.map_y);

    let (hw, hh) = (mx + 1, my + 1);
    let raw = section(bytes, header.heightmap_ptr, byte_len(hw, hh, 2, "heightmap")?, "heightmap")?;
    let samples: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let height = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(hw, hh, samples)
        .ok_or_else(|| ParseError::Smf("heightmap size mismatch".to_string()))?;

    let (lw, lh) = (mx / 2, my / 2);
    let type_map = gray_layer(bytes, header.type_map_ptr, lw, lh, "type map")?;
    let metal = gray_layer(bytes, header.metal_map_ptr, lw, lh, "metal map")?;

    let raw = section(
        bytes,
        header.minimap_ptr,
        dxt1_len(MINIMAP_SIZE, MINIMAP_SIZE),
        "minimap",
    )?;
    let minimap = decode_dxt1(raw, MINIMAP_SIZE, MINIMAP_SIZE)
        .ok_or_else(|| ParseError::Smf("minimap is truncated".to_string()))?;

    // The minimap is always square; stretch it back to the map's proportions
    let (tw, th) = texture_size(mx, my);
    let texture = if (tw, th) == (MINIMAP_SIZE, MINIMAP_SIZE) {
        minimap
    } else {
        imageops::resize(&minimap, tw, th, FilterType::Triangle)
    };

    Ok(SmfLayers {
        header,
        height: DynamicImage::ImageLuma16(height),
        type_map: DynamicImage::ImageLuma8(type_map),
        metal: DynamicImage::ImageLuma8(metal),
        texture: DynamicImage::ImageRgb8(texture),
    })
}

fn texture_size(map_x: u32, map_y: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| {
        (u64::from(MINIMAP_SIZE) * u64::from(short) / u64::from(long)).max(1) as u32
    };
    if map_x >= map_y {
        (MINIMAP_SIZE, scale(map_y, map_x))
    } else {
        (scale(map_x, map_y), MINIMAP_SIZE)
    }
}

/// Size in bytes of a `width`×`height` layer, or an error if it cannot be addressed
fn byte_len(width: u32, height: u32, bytes_per_sample: usize, what: &str) -> Result<usize, ParseError> {
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .and_then(|n| n.checked_mul(bytes_per_sample))
        .ok_or_else(|| ParseError::Smf(format!("{} of {}x{} is too large", what, width, height)))
}

fn gray_layer(
    bytes: &[u8],
    ptr: usize,
    width: u32,
    height: u32,
    what: &str,
) -> Result<GrayImage, ParseError> {
    let raw = section(bytes, ptr, byte_len(width, height, 1, what)?, what)?;
    GrayImage::from_raw(width, height, raw.to_vec())
        .ok_or_else(|| ParseError::Smf(format!("{} size mismatch", what)))
}

fn section<'a>(bytes: &'a [u8], ptr: usize, len: usize, what: &str) -> Result<&'a [u8], ParseError> {
    ptr.checked_add(len)
        .and_then(|end| bytes.get(ptr..end))
        .ok_or_else(|| {
            ParseError::Smf(format!(
                "{} ({} bytes at offset {}) runs past end of file",
                what, len, ptr
            ))
        })
}

fn read_dimension(bytes: &[u8], offset: usize, what: &str) -> Result<u32, ParseError> {
    let value = read_i32(bytes, offset);
    if value <= 0 || value as u32 % SQUARES_PER_UNIT != 0 {
        return Err(ParseError::Smf(format!(
            "{} = {} is not a positive multiple of {}",
            what, value, SQUARES_PER_UNIT
        )));
    }
    if value as u32 > MAX_DIMENSION {
        return Err(ParseError::Smf(format!(
            "{} = {} exceeds the maximum of {}",
            what, value, MAX_DIMENSION
        )));
    }
    Ok(value as u32)
}

fn read_ptr(bytes: &[u8], offset: usize, what: &str) -> Result<usize, ParseError> {
    let value = read_i32(bytes, offset);
    usize::try_from(value).map_err(|_| ParseError::Smf(format!("negative {} pointer", what)))
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Build a minimal, valid SMF file with flat layers
#[cfg(test)]
pub(crate) fn build_test_smf(map_x: u32, map_y: u32) -> Vec<u8> {
    let height_len = ((map_x + 1) * (map_y + 1) * 2) as usize;
    let layer_len = ((map_x / 2) * (map_y / 2)) as usize;
    let minimap_len = dxt1_len(MINIMAP_SIZE, MINIMAP_SIZE);

    let heightmap_ptr = HEADER_LEN;
    let type_map_ptr = heightmap_ptr + height_len;
    let metal_map_ptr = type_map_ptr + layer_len;
    let minimap_ptr = metal_map_ptr + layer_len;

    let mut out = Vec::with_capacity(minimap_ptr + minimap_len);
    out.extend_from_slice(MAGIC);
    for v in [1i32, 0, map_x as i32, map_y as i32, 8, 8, 32] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&0f32.to_le_bytes());
    out.extend_from_slice(&100f32.to_le_bytes());
    for v in [heightmap_ptr, type_map_ptr, 0, minimap_ptr, metal_map_ptr, 0, 0] {
        out.extend_from_slice(&(v as i32).to_le_bytes());
    }
    out.resize(minimap_ptr + minimap_len, 0);
    // a little metal so the layer is not blank
    out[metal_map_ptr] = 255;
    out
}
