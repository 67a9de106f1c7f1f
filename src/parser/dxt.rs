use image::{Rgb, RgbImage};

/// Bytes per 4x4 DXT1 block
const BLOCK_SIZE: usize = 8;

/// Number of bytes a DXT1 surface of the given size occupies
pub fn dxt1_len(width: u32, height: u32) -> usize {
    (width.div_ceil(4) * height.div_ceil(4)) as usize * BLOCK_SIZE
}

/// Decode a DXT1 (BC1) surface. Transparent texels decode as black.
pub fn decode_dxt1(data: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    if data.len() < dxt1_len(width, height) {
        return None;
    }

    let blocks_x = width.div_ceil(4);
    let mut img = RgbImage::new(width, height);

    for (i, block) in data.chunks_exact(BLOCK_SIZE).enumerate() {
        let bx = (i as u32 % blocks_x) * 4;
        let by = (i as u32 / blocks_x) * 4;
        if by >= height {
            break;
        }

        let c0 = u16::from_le_bytes([block[0], block[1]]);
        let c1 = u16::from_le_bytes([block[2], block[3]]);
        let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
        let palette = block_palette(c0, c1);

        for texel in 0..16u32 {
            let x = bx + texel % 4;
            let y = by + texel / 4;
            if x < width && y < height {
                let index = (indices >> (texel * 2)) & 0b11;
                img.put_pixel(x, y, palette[index as usize]);
            }
        }
    }

    Some(img)
}

fn block_palette(c0: u16, c1: u16) -> [Rgb<u8>; 4] {
    let a = rgb565(c0);
    let b = rgb565(c1);

    let mix = |wa: u16, wb: u16| {
        let total = wa + wb;
        Rgb([
            ((a[0] as u16 * wa + b[0] as u16 * wb) / total) as u8,
            ((a[1] as u16 * wa + b[1] as u16 * wb) / total) as u8,
            ((a[2] as u16 * wa + b[2] as u16 * wb) / total) as u8,
        ])
    };

    if c0 > c1 {
        [Rgb(a), Rgb(b), mix(2, 1), mix(1, 2)]
    } else {
        [Rgb(a), Rgb(b), mix(1, 1), Rgb([0, 0, 0])]
    }
}

fn rgb565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1f) as u8;
    let g = ((c >> 5) & 0x3f) as u8;
    let b = (c & 0x1f) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}
