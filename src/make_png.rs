//! Wrapping a `.tic` cartridge into a TIC-80 PNG with the cartridge
//! bytes hidden in the pixel data.

use std::io::Write;

use crate::palette;
use crate::png_io::{self, Image};
use crate::stego;

const COVER_W: u32 = 256;
const COVER_H: u32 = 256;

fn deflate(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::new(9));
    enc.write_all(data)
        .map_err(|e| format!("zlib deflate failed: {}", e))?;
    enc.finish().map_err(|e| format!("zlib deflate failed: {}", e))
}

/// Walk the chunk stream of a `.tic` file.
fn tic_chunks(tic: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos + 4 > tic.len() {
            return None;
        }
        let t = tic[pos];
        let n = usize::from(tic[pos + 1])
            | (usize::from(tic[pos + 2]) << 8)
            | (usize::from(tic[pos + 3]) << 16);
        let start = pos + 4;
        let end = (start + n).min(tic.len());
        pos = end;
        Some((t, &tic[start..end]))
    })
}

pub fn tic_to_png(tic: &[u8]) -> Result<Vec<u8>, String> {
    let comp = deflate(tic)?;

    // flat cover in the TIC-80 default background color
    let mut cover = Image {
        width: COVER_W,
        height: COVER_H,
        pixels: Vec::with_capacity((COVER_W * COVER_H * 4) as usize),
    };
    for _ in 0..COVER_W * COVER_H {
        cover
            .pixels
            .extend_from_slice(&[palette::SWEETIE16[0], palette::SWEETIE16[1], palette::SWEETIE16[2], 0xFF]);
    }

    // pick up the palette, the bank-0 screen, and a possible cover chunk
    let mut pal: &[u8] = &palette::SWEETIE16;
    let mut screen: Option<&[u8]> = None;
    let mut have_cover = false;
    for (t, payload) in tic_chunks(tic) {
        match t & 0x1F {
            12 if payload.len() >= 48 => pal = &payload[..48],
            18 if t >> 5 == 0 && screen.is_none() => screen = Some(payload),
            3 => {
                // deprecated embedded cover PNG, blit at (8,8)
                if let Ok(img) = png_io::decode_png(payload) {
                    blit(&mut cover, &img, 8, 8);
                    have_cover = true;
                }
            }
            _ => {}
        }
    }

    // no cover chunk: render the screen, two 4-bit pixels per byte,
    // low nibble on the left
    if !have_cover {
        if let Some(lbl) = screen {
            let mut n = 0;
            'rows: for j in 0..136usize {
                for i in 0..120usize {
                    if n >= lbl.len() {
                        break 'rows;
                    }
                    let o = (((j + 8) * COVER_W as usize) + 8 + i * 2) * 4;
                    let lo = usize::from(lbl[n] & 0xF) * 3;
                    let hi = usize::from(lbl[n] >> 4) * 3;
                    cover.pixels[o..o + 3].copy_from_slice(&pal[lo..lo + 3]);
                    cover.pixels[o + 4..o + 7].copy_from_slice(&pal[hi..hi + 3]);
                    n += 1;
                }
            }
        }
    }

    stego::embed(&comp, &mut cover.pixels)?;
    png_io::encode_png(&cover)
}

fn blit(dst: &mut Image, src: &Image, x: usize, y: usize) {
    let dw = dst.width as usize;
    let dh = dst.height as usize;
    let sw = src.width as usize;
    for j in 0..src.height as usize {
        if y + j >= dh {
            break;
        }
        let w = sw.min(dw - x);
        let d = ((y + j) * dw + x) * 4;
        let s = j * sw * 4;
        dst.pixels[d..d + w * 4].copy_from_slice(&src.pixels[s..s + w * 4]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use std::io::Read;

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        flate2::read::ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    /// Minimal .tic: palette chunk plus a tiny code chunk.
    fn sample_tic() -> Vec<u8> {
        let mut tic = vec![12u8, 96, 0, 0];
        tic.extend_from_slice(&palette::PICO_PAL);
        tic.extend_from_slice(&palette::PICO_PAL);
        let code = b"x=1\0";
        tic.extend_from_slice(&[5, code.len() as u8, 0, 0]);
        tic.extend_from_slice(code);
        tic
    }

    #[test]
    fn test_payload_roundtrips_through_pixels() {
        let tic = sample_tic();
        let png = tic_to_png(&tic).unwrap();
        let img = png_io::decode_png(&png).unwrap();
        assert_eq!(img.width, 256);
        assert_eq!(img.height, 256);
        let raw = stego::extract(&img.pixels).unwrap();
        assert_eq!(inflate(&raw), tic);
    }

    #[test]
    fn test_screen_chunk_rendered_with_palette() {
        // screen byte 0x10: left pixel index 0, right pixel index 1
        let mut tic = sample_tic();
        tic.extend_from_slice(&[18, 1, 0, 0, 0x10]);
        let png = tic_to_png(&tic).unwrap();
        let img = png_io::decode_png(&png).unwrap();
        let o = ((8 * 256) + 8) * 4;
        // low bits carry the payload, compare the stable high bits
        let close = |a: u8, b: u8| a >> 2 == b >> 2 || a.abs_diff(b) <= 3;
        assert!(close(img.pixels[o], palette::PICO_PAL[0]));
        assert!(close(img.pixels[o + 4], palette::PICO_PAL[3]));
        assert!(close(img.pixels[o + 5], palette::PICO_PAL[4]));
    }

    #[test]
    fn test_size_cap() {
        // 1 MB of incompressible data will not fit 1..8 bits per
        // channel byte of a 256x256 cover
        let mut state = 0x1234_5678u32;
        let big: Vec<u8> = (0..config::OUT_MAX)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        assert!(tic_to_png(&big).is_err());
    }
}
