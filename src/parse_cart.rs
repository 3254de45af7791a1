//! Parsing of PICO-8 cartridges, both the `.p8` text format and the
//! classic `.p8.png` image format, plus recognition of TIC-80 PNG
//! cartridges handed to us by mistake.

use std::io::Read;

use crate::charset;
use crate::config;
use crate::convert_lua;
use crate::decompress_code;
use crate::palette;
use crate::png_io;
use crate::stego;

/// Section data lifted out of a PICO-8 cartridge. `code` already holds
/// the converted TIC-80 Lua, shim included.
#[derive(Default)]
pub struct Cartridge {
    pub code: Option<String>,
    /// 128x128 4-bit sprite sheet, 8192 bytes, low nibble first.
    pub gfx: Option<Vec<u8>>,
    /// 128x64 byte map plus the sprite-aliased lower half, 8192 bytes.
    pub map: Option<Vec<u8>>,
    /// One flag byte per sprite, 256 bytes.
    pub flags: Option<Vec<u8>>,
    /// 64 sound effects of 68 bytes each.
    pub sfx: Option<Vec<u8>>,
    /// 64 music tracks of 4 bytes each.
    pub music: Option<Vec<u8>>,
    /// 240x136 4-bit screen with the label centered, 16320 bytes.
    pub label: Option<Vec<u8>>,
}

pub enum ParseOutcome {
    /// A PICO-8 cartridge to convert.
    Cartridge(Box<Cartridge>),
    /// The input was already a TIC-80 cartridge wrapped in a PNG; this is
    /// the extracted `.tic` byte stream.
    Native(Vec<u8>),
}

fn hex(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

pub fn parse(buf: &[u8]) -> Result<ParseOutcome, String> {
    if buf.starts_with(b"pico-8 cartridge") {
        return Ok(ParseOutcome::Cartridge(Box::new(parse_text(buf))));
    }
    if buf.starts_with(b"\x89PNG") {
        return parse_image(buf);
    }
    Err("unrecognized cartridge format".to_string())
}

/// Decode the `.p8` text format. Sections are introduced by `__name__`
/// marker lines; the first occurrence of each section wins.
fn parse_text(buf: &[u8]) -> Cartridge {
    let text = String::from_utf8_lossy(buf);
    let lines: Vec<&str> = text.lines().collect();
    let mut cart = Cartridge::default();

    let mut i = 0;
    while i < lines.len() && !lines[i].starts_with("__") {
        i += 1;
    }
    while i < lines.len() {
        let marker = lines[i].trim_end();
        let start = i + 1;
        let mut end = start;
        while end < lines.len() && !lines[end].starts_with("__") {
            end += 1;
        }
        let body = &lines[start..end];
        match marker {
            "__lua__" => {
                if cart.code.is_none() {
                    let mut src = body.join("\n");
                    src.push('\n');
                    // .p8 text already stores the code as UTF-8
                    cart.code = Some(convert_lua::convert_code_default(&src));
                }
            }
            "__gfx__" => {
                if cart.gfx.is_none() {
                    // one large 128x128 4-bit sheet, low nibble first
                    let gfx = read_hex_pairs(body, config::GFX_SIZE, |a, b| hex(a) | (hex(b) << 4));
                    if let Some(map) = cart.map.as_mut() {
                        map[4096..].copy_from_slice(&gfx[4096..]);
                    }
                    cart.gfx = Some(gfx);
                }
            }
            "__gff__" => {
                if cart.flags.is_none() {
                    cart.flags =
                        Some(read_hex_pairs(body, config::FLAGS_SIZE, |a, b| (hex(a) << 4) | hex(b)));
                }
            }
            "__label__" => {
                if cart.label.is_none() {
                    cart.label = Some(read_label(body));
                }
            }
            "__map__" => {
                if cart.map.is_none() {
                    let mut map = vec![0u8; config::MAP_SIZE];
                    // 8 bit per map entry, big endian pairs
                    let half = read_hex_pairs(body, 4096, |a, b| (hex(a) << 4) | hex(b));
                    map[..4096].copy_from_slice(&half);
                    // lower half of the map is shared with the upper sprites
                    if let Some(gfx) = cart.gfx.as_deref() {
                        map[4096..].copy_from_slice(&gfx[4096..]);
                    }
                    cart.map = Some(map);
                }
            }
            "__music__" => {
                if cart.music.is_none() {
                    cart.music = Some(read_music(body));
                }
            }
            "__sfx__" => {
                if cart.sfx.is_none() {
                    cart.sfx = Some(read_sfx(body));
                }
            }
            _ => {
                eprintln!("pico2tic: unknown chunk '{}'", marker);
            }
        }
        i = end;
    }
    cart
}

/// Read a stream of hex digit pairs from section body lines, combining
/// each pair with `pack`. Whitespace is skipped; short input leaves the
/// tail zeroed.
fn read_hex_pairs(body: &[&str], size: usize, pack: impl Fn(u8, u8) -> u8) -> Vec<u8> {
    let mut out = vec![0u8; size];
    let mut digits = body
        .iter()
        .flat_map(|l| l.bytes())
        .filter(|b| !b.is_ascii_whitespace());
    for slot in out.iter_mut() {
        let (a, b) = match (digits.next(), digits.next()) {
            (Some(a), Some(b)) => (a, b),
            _ => break,
        };
        *slot = pack(a, b);
    }
    out
}

/// The label is 128 rows of 128 pixels (64 bytes), centered on the
/// 240x136 screen.
fn read_label(body: &[&str]) -> Vec<u8> {
    let mut lbl = vec![0u8; config::LABEL_SIZE];
    let pixels = read_hex_pairs(body, 128 * 64, |a, b| hex(a) | (hex(b) << 4));
    for (k, &px) in pixels.iter().enumerate() {
        let (j, i) = (k / 64, k % 64);
        lbl[(j + 4) * 120 + 28 + i] = px;
    }
    lbl
}

/// Music rows: a flags pair, a space, then four big-endian pairs. One
/// flag bit lands in the MSB of each of the four bytes.
fn read_music(body: &[&str]) -> Vec<u8> {
    let mut mus = vec![0u8; config::MUSIC_SIZE];
    let mut i = 0;
    for line in body {
        let b = line.trim().as_bytes();
        if b.len() < 2 || i >= mus.len() {
            break;
        }
        let f = (hex(b[0]) << 4) | hex(b[1]);
        let mut pos = 2;
        while pos < b.len() && b[pos] == b' ' {
            pos += 1;
        }
        for j in 0..4 {
            if pos + 2 > b.len() || i >= mus.len() {
                break;
            }
            mus[i] = ((hex(b[pos]) & 7) << 4) | hex(b[pos + 1]) | (((f >> j) & 1) << 7);
            i += 1;
            pos += 2;
        }
    }
    mus
}

/// Sound effect rows: four header pairs (flags, speed, loop start, loop
/// end), then up to 32 five-digit notes. Each of the 64 slots holds the
/// 32 packed 16-bit notes followed by the four header bytes, 68 bytes.
fn read_sfx(body: &[&str]) -> Vec<u8> {
    let mut snd = vec![0u8; config::SFX_SIZE];
    for (slot, line) in body.iter().enumerate() {
        let b = line.trim().as_bytes();
        let base = slot * 68;
        if b.len() < 8 || base + 68 > snd.len() {
            break;
        }
        snd[base + 64] = (hex(b[0]) << 4) | hex(b[1]);
        snd[base + 65] = (hex(b[2]) << 4) | hex(b[3]);
        snd[base + 66] = (hex(b[4]) << 4) | hex(b[5]);
        snd[base + 67] = (hex(b[6]) << 4) | hex(b[7]);
        let mut pos = 8;
        for k in 0..32 {
            if pos + 5 > b.len() {
                break;
            }
            // digits 0..1 pitch, 2 waveform, 3 volume, 4 effect; the
            // waveform's 4th bit selects a custom instrument
            let note: u16 = (u16::from(hex(b[pos + 1])) << 4)
                | u16::from(hex(b[pos]) & 0x3f)
                | (u16::from(hex(b[pos + 2]) & 7) << 6)
                | (u16::from(hex(b[pos + 3]) & 7) << 9)
                | (u16::from(hex(b[pos + 4]) & 7) << 12)
                | (u16::from((hex(b[pos + 2]) >> 3) & 1) << 15);
            snd[base + k * 2..base + k * 2 + 2].copy_from_slice(&note.to_le_bytes());
            pos += 5;
        }
    }
    snd
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| format!("zlib inflate failed: {}", e))?;
    Ok(out)
}

fn parse_image(buf: &[u8]) -> Result<ParseOutcome, String> {
    let img = png_io::decode_png(buf)?;

    if img.width == 256 && img.height == 256 {
        // a TIC-80 PNG cartridge: cartridge chunk first, then the
        // steganographic fallback
        let raw = match png_io::find_chunk(buf, b"caRt") {
            Some(chunk) => chunk.to_vec(),
            None => stego::extract(&img.pixels)
                .map_err(|_| "unrecognized cartridge format".to_string())?,
        };
        let mut tic = inflate(&raw)?;
        if tic.len() > config::OUT_MAX {
            tic.truncate(config::OUT_MAX);
        }
        return Ok(ParseOutcome::Native(tic));
    }

    if img.width != 160 || img.height != 205 {
        return Err(format!(
            "unrecognized cartridge image size {}x{}",
            img.width, img.height
        ));
    }

    // classic format: one byte per pixel in the low channel bits
    let w = img.width as usize;
    let mut raw = vec![0u8; w * img.height as usize];
    for (f, px) in img.pixels.chunks_exact(4).enumerate() {
        raw[f] = ((px[0] & 3) << 4) | ((px[1] & 3) << 2) | (px[2] & 3) | ((px[3] & 3) << 6);
    }

    let mut cart = Cartridge::default();

    // no stored label; quantize the 128x128 screenshot area at (16,24)
    // of the cartridge picture back to palette indices
    let mut lbl = vec![0u8; config::LABEL_SIZE];
    for j in 0..128 {
        for i in 0..64 {
            let at = |x: usize| {
                let o = ((j + 24) * w + x) * 4;
                palette::palette_index(img.pixels[o], img.pixels[o + 1], img.pixels[o + 2])
            };
            lbl[(j + 4) * 120 + 28 + i] = (at(i * 2 + 17) << 4) | at(i * 2 + 16);
        }
    }
    cart.label = Some(lbl);

    cart.gfx = Some(raw[..config::GFX_SIZE].to_vec());
    let mut map = vec![0u8; config::MAP_SIZE];
    map[..4096].copy_from_slice(&raw[0x2000..0x3000]);
    // lower half of the map is shared with the upper sprites
    map[4096..].copy_from_slice(&raw[0x1000..0x2000]);
    cart.map = Some(map);
    cart.flags = Some(raw[0x3000..0x3000 + config::FLAGS_SIZE].to_vec());
    cart.music = Some(raw[0x3100..0x3100 + config::MUSIC_SIZE].to_vec());
    cart.sfx = Some(raw[0x3200..0x3200 + config::SFX_SIZE].to_vec());

    let mut code = vec![0u8; config::LUA_MAX + 1];
    match decompress_code::decompress_code_section(&raw[0x4300..], &mut code) {
        Ok(()) if code[0] != 0 => {
            let utf8 = charset::to_utf8_string(&code, config::LUA_MAX);
            cart.code = Some(convert_lua::convert_code_default(&utf8));
        }
        _ => {
            eprintln!("pico2tic: unable to decompress Lua");
        }
    }

    Ok(ParseOutcome::Cartridge(Box::new(cart)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEXT_HEADER: &str = "pico-8 cartridge // http://www.pico-8.com\nversion 42\n";

    fn parse_text_cart(body: &str) -> Cartridge {
        let src = format!("{}{}", TEXT_HEADER, body);
        match parse(src.as_bytes()).unwrap() {
            ParseOutcome::Cartridge(c) => *c,
            ParseOutcome::Native(_) => panic!("expected cartridge"),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(parse(b"garbage data").is_err());
    }

    #[test]
    fn test_text_lua_section() {
        let cart = parse_text_cart("__lua__\nx+=1\n");
        let code = cart.code.unwrap();
        assert!(code.contains("x=x+1"));
        assert!(code.starts_with("-- Converted from a PICO-8 cartridge --"));
        assert!(cart.gfx.is_none());
    }

    #[test]
    fn test_text_gfx_low_nibble_first() {
        let cart = parse_text_cart("__gfx__\n12345678\n");
        let gfx = cart.gfx.unwrap();
        assert_eq!(gfx.len(), config::GFX_SIZE);
        assert_eq!(&gfx[..4], &[0x21, 0x43, 0x65, 0x87]);
        assert!(gfx[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_text_gff_high_nibble_first() {
        let cart = parse_text_cart("__gff__\n8001\n");
        let flags = cart.flags.unwrap();
        assert_eq!(&flags[..2], &[0x80, 0x01]);
    }

    #[test]
    fn test_text_map_aliases_gfx() {
        let mut gfx_rows = String::from("__gfx__\n");
        // 8192 bytes of 0x11: 128 rows of 128 '1' digits
        for _ in 0..128 {
            gfx_rows.push_str(&"1".repeat(128));
            gfx_rows.push('\n');
        }
        let cart = parse_text_cart(&format!("{}__map__\n2345\n", gfx_rows));
        let map = cart.map.unwrap();
        assert_eq!(&map[..2], &[0x23, 0x45]);
        // upper gfx half mirrored into the lower map half
        assert!(map[4096..].iter().all(|&b| b == 0x11));
    }

    #[test]
    fn test_text_first_section_wins() {
        let cart = parse_text_cart("__gff__\n01\n__gff__\nff\n");
        assert_eq!(cart.flags.unwrap()[0], 0x01);
    }

    #[test]
    fn test_text_music_row() {
        let cart = parse_text_cart("__music__\n01 41424344\n");
        let mus = cart.music.unwrap();
        // flag bit 0 set -> MSB of the first byte only
        assert_eq!(&mus[..4], &[0xC1, 0x42, 0x43, 0x44]);
    }

    #[test]
    fn test_text_sfx_row() {
        // header 01 10 00 02, then one note: pitch digits "10",
        // waveform 2, volume 5, effect 3
        let cart = parse_text_cart("__sfx__\n0110000210253\n");
        let snd = cart.sfx.unwrap();
        let note = u16::from_le_bytes([snd[0], snd[1]]);
        assert_eq!(note & 0x3f, 0x01); // pitch: second digit high
        assert_eq!((note >> 6) & 7, 2); // waveform
        assert_eq!((note >> 9) & 7, 5); // volume
        assert_eq!((note >> 12) & 7, 3); // effect
        assert_eq!(note >> 15, 0);
        // the four header bytes land at the end of the 68-byte slot
        assert_eq!(&snd[64..68], &[0x01, 0x10, 0x00, 0x02]);
    }

    #[test]
    fn test_text_label_centered() {
        let cart = parse_text_cart("__label__\nff\n");
        let lbl = cart.label.unwrap();
        assert_eq!(lbl.len(), config::LABEL_SIZE);
        assert_eq!(lbl[4 * 120 + 28], 0xff);
        assert_eq!(lbl[0], 0);
    }

    #[test]
    fn test_tic_png_with_cart_chunk() {
        // build a 256x256 PNG and splice in a caRt chunk holding a
        // zlib-compressed payload
        let img = png_io::Image {
            width: 256,
            height: 256,
            pixels: vec![0u8; 256 * 256 * 4],
        };
        let png = png_io::encode_png(&img).unwrap();
        let payload = b"\x11\x00\x00\x00tic-data";
        let mut enc =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(payload).unwrap();
        let comp = enc.finish().unwrap();

        // insert the chunk right after IHDR (8-byte signature + 25 bytes)
        let mut spliced = png[..33].to_vec();
        spliced.extend_from_slice(&(comp.len() as u32).to_be_bytes());
        spliced.extend_from_slice(b"caRt");
        spliced.extend_from_slice(&comp);
        let mut crc = flate2::Crc::new();
        crc.update(b"caRt");
        crc.update(&comp);
        spliced.extend_from_slice(&crc.sum().to_be_bytes());
        spliced.extend_from_slice(&png[33..]);

        match parse(&spliced).unwrap() {
            ParseOutcome::Native(tic) => assert_eq!(tic, payload),
            ParseOutcome::Cartridge(_) => panic!("expected native"),
        }
    }

    #[test]
    fn test_tic_png_without_payload_rejected() {
        let img = png_io::Image {
            width: 256,
            height: 256,
            pixels: vec![0u8; 256 * 256 * 4],
        };
        let png = png_io::encode_png(&img).unwrap();
        assert!(parse(&png).is_err());
    }

    #[test]
    fn test_classic_image_sections() {
        // encode a synthetic 160x205 cartridge: raw byte k at pixel k
        let mut raw = vec![0u8; 160 * 205];
        raw[0] = 0x21; // first gfx byte
        raw[0x3000] = 0x80; // first flag byte
        // code section: plain text
        let code = b"x=1\n";
        raw[0x4300..0x4300 + code.len()].copy_from_slice(code);

        let mut pixels = vec![0u8; 160 * 205 * 4];
        for (k, &b) in raw.iter().enumerate() {
            pixels[k * 4] = (b >> 4) & 3;
            pixels[k * 4 + 1] = (b >> 2) & 3;
            pixels[k * 4 + 2] = b & 3;
            pixels[k * 4 + 3] = (b >> 6) & 3;
        }
        let png = png_io::encode_png(&png_io::Image {
            width: 160,
            height: 205,
            pixels,
        })
        .unwrap();

        let cart = match parse(&png).unwrap() {
            ParseOutcome::Cartridge(c) => *c,
            ParseOutcome::Native(_) => panic!("expected cartridge"),
        };
        assert_eq!(cart.gfx.as_deref().unwrap()[0], 0x21);
        assert_eq!(cart.flags.as_deref().unwrap()[0], 0x80);
        assert!(cart.code.unwrap().ends_with("x=1\n"));
        assert!(cart.label.is_some());
    }

    #[test]
    fn test_classic_image_wrong_size_rejected() {
        let png = png_io::encode_png(&png_io::Image {
            width: 100,
            height: 100,
            pixels: vec![0u8; 100 * 100 * 4],
        })
        .unwrap();
        assert!(parse(&png).is_err());
    }
}
