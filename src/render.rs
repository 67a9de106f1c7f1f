//! Preview image generation
//!
//! Every asset is written into a staging directory next to the destination
//! and swapped into place once all of them succeeded, so a failed render
//! never leaves a half-written asset directory behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::RenderError;
use crate::map::MapImagery;

pub const MEDIUM_WIDTH: u32 = 1000;
pub const MEDIUM_QUALITY: u8 = 90;
pub const LOW_WIDTH: u32 = 500;
pub const LOW_QUALITY: u8 = 80;
pub const THUMB_SIZE: u32 = 250;
pub const THUMB_QUALITY: u8 = 80;

/// File names of every generated asset
pub const ASSET_FILES: &[&str] = &[
    "height.png",
    "metal.png",
    "type.png",
    "texture-hq.png",
    "texture-mq.jpg",
    "texture-lq.jpg",
    "texture-thumb.jpg",
];

/// Render all preview assets into `dest_dir`, replacing what is there.
///
/// `texture-hq.png` is the texture at the resolution it was decoded at; for
/// SMF archives that is the embedded minimap, at most 1024 px on its long side.
/// On failure `dest_dir` is left as it was.
pub fn render_assets(imagery: &MapImagery, dest_dir: &Path) -> Result<(), RenderError> {
    let parent = dest_dir.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| RenderError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(parent)
        .map_err(|source| RenderError::Io {
            path: parent.to_path_buf(),
            source,
        })?;

    write_assets(imagery, staging.path())?;

    if dest_dir.exists() {
        fs::remove_dir_all(dest_dir).map_err(|source| RenderError::Io {
            path: dest_dir.to_path_buf(),
            source,
        })?;
    }
    fs::rename(staging.path(), dest_dir).map_err(|source| RenderError::Io {
        path: dest_dir.to_path_buf(),
        source,
    })?;

    debug!(dest = %dest_dir.display(), "Assets written");
    Ok(())
}

fn write_assets(imagery: &MapImagery, dir: &Path) -> Result<(), RenderError> {
    write_png(&imagery.height, &dir.join("height.png"))?;
    write_png(&imagery.metal, &dir.join("metal.png"))?;
    write_png(&imagery.type_map, &dir.join("type.png"))?;

    let texture = &imagery.texture;
    write_png(texture, &dir.join("texture-hq.png"))?;
    write_jpeg(
        &fit_width(texture, MEDIUM_WIDTH),
        &dir.join("texture-mq.jpg"),
        MEDIUM_QUALITY,
    )?;
    write_jpeg(
        &fit_width(texture, LOW_WIDTH),
        &dir.join("texture-lq.jpg"),
        LOW_QUALITY,
    )?;
    write_jpeg(
        &texture.resize_to_fill(THUMB_SIZE, THUMB_SIZE, FilterType::Triangle),
        &dir.join("texture-thumb.jpg"),
        THUMB_QUALITY,
    )?;

    Ok(())
}

/// Downscale to at most `max_width` wide, keeping the aspect ratio
pub fn fit_width(img: &DynamicImage, max_width: u32) -> DynamicImage {
    if img.width() <= max_width {
        return img.clone();
    }
    let height = (img.height() as u64 * max_width as u64 / img.width() as u64).max(1) as u32;
    img.resize_exact(max_width, height, FilterType::Triangle)
}

fn write_png(img: &DynamicImage, path: &Path) -> Result<(), RenderError> {
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|source| encode_error(path, source))
}

fn write_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), RenderError> {
    let file = File::create(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(&img.to_rgb8())
        .map_err(|source| encode_error(path, source))?;
    writer.flush().map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn encode_error(path: &Path, source: image::ImageError) -> RenderError {
    RenderError::Encode {
        path: PathBuf::from(path),
        source,
    }
}
