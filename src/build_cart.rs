//! Assembly of a `.tic` cartridge from parsed PICO-8 sections.
//!
//! A `.tic` file is a sequence of chunks, each with a one-byte type (the
//! top three bits select a bank) and a 24-bit little-endian length. The
//! code chunk goes last so players load everything else first.

use crate::config;
use crate::palette;
use crate::parse_cart::Cartridge;

pub const CHUNK_TILES: u8 = 1;
pub const CHUNK_MAP: u8 = 4;
pub const CHUNK_CODE: u8 = 5;
pub const CHUNK_FLAGS: u8 = 6;
pub const CHUNK_SAMPLES: u8 = 9;
pub const CHUNK_WAVEFORM: u8 = 10;
pub const CHUNK_PALETTE: u8 = 12;
pub const CHUNK_MUSIC: u8 = 14;
pub const CHUNK_DEFAULT: u8 = 17;
pub const CHUNK_SCREEN: u8 = 18;

/// Payload size of one code bank; larger code is split across banks.
const CODE_BANK_SIZE: usize = 65535;

pub struct TicBuilder {
    out: Vec<u8>,
}

impl TicBuilder {
    pub fn new() -> Self {
        Self { out: Vec::new() }
    }

    /// Append one chunk, bounds-checked against the output cap.
    pub fn chunk(&mut self, type_: u8, payload: &[u8]) -> Result<(), String> {
        if payload.len() > 0xFF_FFFF {
            return Err(format!("chunk payload of {} bytes too large", payload.len()));
        }
        if self.out.len() + 4 + payload.len() > config::OUT_MAX {
            return Err("output cartridge exceeds size limit".to_string());
        }
        let n = payload.len() as u32;
        self.out.push(type_);
        self.out.push(n as u8);
        self.out.push((n >> 8) as u8);
        self.out.push((n >> 16) as u8);
        self.out.extend_from_slice(payload);
        Ok(())
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

impl Default for TicBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full cartridge. Sections the source did not carry are
/// skipped; palette, waveforms and the default chunk are always present.
pub fn assemble(cart: &Cartridge) -> Result<Vec<u8>, String> {
    let mut b = TicBuilder::new();

    // cover image first, bank 0
    if let Some(lbl) = cart.label.as_deref() {
        b.chunk(CHUNK_SCREEN, lbl)?;
    }

    // without this zero-length chunk the palette and waveforms are ignored
    b.chunk(CHUNK_DEFAULT, &[])?;

    // same palette for the scanline and overlay banks
    let mut pal = [0u8; 96];
    pal[..48].copy_from_slice(&palette::PICO_PAL);
    pal[48..].copy_from_slice(&palette::PICO_PAL);
    b.chunk(CHUNK_PALETTE, &pal)?;

    let mut wave = palette::PICO_WAVE;
    if let Some(sfx) = cart.sfx.as_deref() {
        for i in 0..7 {
            let s = &sfx[i * 68..(i + 1) * 68];
            palette::generate_waveform(&mut wave[128 + i * 16..128 + (i + 1) * 16], s, s[64], s[65]);
        }
    }
    b.chunk(CHUNK_WAVEFORM, &wave)?;

    if let Some(gfx) = cart.gfx.as_deref() {
        b.chunk(CHUNK_TILES, &relayout_tiles(gfx))?;
    }

    if let Some(map) = cart.map.as_deref() {
        // PICO-8 map is 128x64, copied into the top left of the 240x136 one
        let mut payload = vec![0u8; 240 * 136];
        for j in 0..64 {
            payload[j * 240..j * 240 + 128].copy_from_slice(&map[j * 128..(j + 1) * 128]);
        }
        b.chunk(CHUNK_MAP, &payload)?;
    }

    if let Some(flags) = cart.flags.as_deref() {
        let mut payload = vec![0u8; 512];
        payload[..256].copy_from_slice(flags);
        b.chunk(CHUNK_FLAGS, &payload)?;
    }

    if let Some(sfx) = cart.sfx.as_deref() {
        b.chunk(CHUNK_SAMPLES, &pack_samples(sfx))?;
    }

    if cart.music.is_some() {
        // track data mapping is unresolved, reserve the chunk
        b.chunk(CHUNK_MUSIC, &[0u8; 408])?;
    }

    if let Some(code) = cart.code.as_deref() {
        if !code.is_empty() {
            write_code_banks(&mut b, code)?;
        }
    }

    Ok(b.finish())
}

/// PICO-8 keeps sprites as one 128x128 sheet; TIC-80 wants an array of
/// 256 separate 8x8 4-bit images, 32 bytes each.
fn relayout_tiles(gfx: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; config::GFX_SIZE];
    for e in 0..256 {
        let mut s = 512 * (e >> 4) + 4 * (e & 15);
        for j in 0..8 {
            out[e * 32 + j * 4..e * 32 + (j + 1) * 4].copy_from_slice(&gfx[s..s + 4]);
            s += 64;
        }
    }
    out
}

/// Repack 64 sound effects of 68 bytes into TIC-80 samples of 66 bytes.
/// The volume scale is inverted, the custom-waveform bit moves next to
/// the low waveform bits, and loop points are halved to fit four bits.
fn pack_samples(sfx: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 4224];
    for j in 0..64 {
        let src = &sfx[j * 68..(j + 1) * 68];
        let dst = &mut out[j * 66..(j + 1) * 66];
        for i in 0..30 {
            let sn = u16::from_le_bytes([src[i * 2], src[i * 2 + 1]]);
            let dn = ((7 - ((sn >> 9) & 7)) << 1)
                | ((((sn >> 15) << 3) | ((sn >> 6) & 7)) << 4)
                | ((sn & 7) << 13);
            dst[i * 2..(i + 1) * 2].copy_from_slice(&dn.to_le_bytes());
        }
        dst[60] |= (src[65] & 7) << 4; // speed
        let e = i32::from(src[67].min(30) >> 1); // loop end
        let s = i32::from(src[66].min(30) >> 1); // loop start
        let d = (((e - s) << 4) | s) as u8;
        dst[62] = d;
        dst[63] = d;
        dst[64] = d;
        dst[65] = d;
    }
    out
}

/// Write the code, NUL terminated, split into 64k banks when needed.
/// Bank numbers count down so the final chunk is plain type 5.
fn write_code_banks(b: &mut TicBuilder, code: &str) -> Result<(), String> {
    let mut bytes = code.as_bytes().to_vec();
    bytes.push(0);
    let mut remaining = bytes.len();
    let mut i = 0;
    let mut bank = remaining / CODE_BANK_SIZE;
    while remaining > CODE_BANK_SIZE {
        b.chunk(
            ((bank as u8) << 5) | CHUNK_CODE,
            &bytes[i * CODE_BANK_SIZE..(i + 1) * CODE_BANK_SIZE],
        )?;
        remaining -= CODE_BANK_SIZE;
        i += 1;
        bank -= 1;
        if i > 7 {
            return Err("too many code banks, only 8 supported".to_string());
        }
    }
    if remaining > 0 {
        b.chunk(CHUNK_CODE, &bytes[i * CODE_BANK_SIZE..])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk the chunk stream into (type, payload) pairs.
    fn chunks(tic: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let mut out = Vec::new();
        let mut pos = 0;
        while pos + 4 <= tic.len() {
            let t = tic[pos];
            let n = usize::from(tic[pos + 1])
                | (usize::from(tic[pos + 2]) << 8)
                | (usize::from(tic[pos + 3]) << 16);
            out.push((t, tic[pos + 4..pos + 4 + n].to_vec()));
            pos += 4 + n;
        }
        out
    }

    #[test]
    fn test_minimal_cartridge_layout() {
        let cart = Cartridge {
            code: Some("x=1".to_string()),
            gfx: Some(vec![0u8; config::GFX_SIZE]),
            ..Default::default()
        };
        let tic = assemble(&cart).unwrap();
        let types: Vec<u8> = chunks(&tic).iter().map(|(t, _)| *t).collect();
        assert_eq!(
            types,
            vec![CHUNK_DEFAULT, CHUNK_PALETTE, CHUNK_WAVEFORM, CHUNK_TILES, CHUNK_CODE]
        );
    }

    #[test]
    fn test_palette_and_waveform_payloads() {
        let cart = Cartridge::default();
        let tic = assemble(&cart).unwrap();
        let parts = chunks(&tic);
        let pal = &parts.iter().find(|(t, _)| *t == CHUNK_PALETTE).unwrap().1;
        assert_eq!(pal.len(), 96);
        assert_eq!(&pal[..48], &palette::PICO_PAL);
        assert_eq!(&pal[48..], &palette::PICO_PAL);
        let wave = &parts.iter().find(|(t, _)| *t == CHUNK_WAVEFORM).unwrap().1;
        assert_eq!(wave.as_slice(), &palette::PICO_WAVE);
    }

    #[test]
    fn test_code_chunk_nul_terminated() {
        let cart = Cartridge {
            code: Some("print(1)".to_string()),
            ..Default::default()
        };
        let tic = assemble(&cart).unwrap();
        let code = chunks(&tic).pop().unwrap();
        assert_eq!(code.0, CHUNK_CODE);
        assert_eq!(code.1, b"print(1)\0");
    }

    #[test]
    fn test_code_banks_split_and_tagged() {
        // a bit over one bank of code
        let cart = Cartridge {
            code: Some("-".repeat(70000)),
            ..Default::default()
        };
        let tic = assemble(&cart).unwrap();
        let parts = chunks(&tic);
        let banks: Vec<&(u8, Vec<u8>)> =
            parts.iter().filter(|(t, _)| t & 0x1F == CHUNK_CODE).collect();
        assert_eq!(banks.len(), 2);
        assert_eq!(banks[0].0, (1 << 5) | CHUNK_CODE);
        assert_eq!(banks[0].1.len(), 65535);
        assert_eq!(banks[1].0, CHUNK_CODE);
        assert_eq!(banks[1].1.len(), 70000 + 1 - 65535);
        assert_eq!(*banks[1].1.last().unwrap(), 0);
    }

    #[test]
    fn test_tile_relayout() {
        // mark the top-left pixel pair of sprite 1 (sheet offset 4)
        let mut gfx = vec![0u8; config::GFX_SIZE];
        gfx[4] = 0xAB;
        // and sprite 16 starts a new sheet row (offset 512)
        gfx[512] = 0xCD;
        let cart = Cartridge {
            gfx: Some(gfx),
            ..Default::default()
        };
        let tic = assemble(&cart).unwrap();
        let tiles = chunks(&tic).into_iter().find(|(t, _)| *t == CHUNK_TILES).unwrap().1;
        assert_eq!(tiles[32], 0xAB); // sprite 1, first row
        assert_eq!(tiles[16 * 32], 0xCD); // sprite 16, first row
    }

    #[test]
    fn test_map_copied_to_top_left() {
        let mut map = vec![0u8; config::MAP_SIZE];
        map[0] = 5; // (0,0)
        map[128] = 7; // start of row 1
        let cart = Cartridge {
            map: Some(map),
            ..Default::default()
        };
        let tic = assemble(&cart).unwrap();
        let payload = chunks(&tic).into_iter().find(|(t, _)| *t == CHUNK_MAP).unwrap().1;
        assert_eq!(payload.len(), 240 * 136);
        assert_eq!(payload[0], 5);
        assert_eq!(payload[240], 7);
        assert_eq!(payload[128], 0); // gap between copied rows stays clear
    }

    #[test]
    fn test_sample_packing() {
        let mut sfx = vec![0u8; config::SFX_SIZE];
        // slot 0, note 0: pitch 5, waveform 3, volume 7, custom bit set
        let note: u16 = 5 | (3 << 6) | (7 << 9) | (1 << 15);
        sfx[..2].copy_from_slice(&note.to_le_bytes());
        sfx[65] = 4; // speed
        sfx[66] = 8; // loop start
        sfx[67] = 20; // loop end
        let cart = Cartridge {
            sfx: Some(sfx),
            ..Default::default()
        };
        let tic = assemble(&cart).unwrap();
        let smp = chunks(&tic).into_iter().find(|(t, _)| *t == CHUNK_SAMPLES).unwrap().1;
        assert_eq!(smp.len(), 4224);
        let dn = u16::from_le_bytes([smp[0], smp[1]]);
        assert_eq!((dn >> 1) & 7, 0); // volume 7 inverts to 0
        assert_eq!((dn >> 4) & 0xF, 0b1011); // custom bit plus waveform 3
        assert_eq!(dn >> 13, 5); // pitch low bits
        assert_eq!(smp[60] >> 4, 4); // speed
        // loop start 4, length 6, packed into one byte
        assert_eq!(smp[62], (6 << 4) | 4);
        assert_eq!(smp[63], smp[62]);
    }

    #[test]
    fn test_label_written_first() {
        let cart = Cartridge {
            label: Some(vec![0u8; config::LABEL_SIZE]),
            ..Default::default()
        };
        let tic = assemble(&cart).unwrap();
        let parts = chunks(&tic);
        assert_eq!(parts[0].0, CHUNK_SCREEN);
        assert_eq!(parts[0].1.len(), config::LABEL_SIZE);
        assert_eq!(parts[1].0, CHUNK_DEFAULT);
        assert!(parts[1].1.is_empty());
    }
}
