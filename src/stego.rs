//! Payload embedding in PNG pixel data, TIC-80 style.
//!
//! A compressed cartridge is hidden in the low bits of an RGBA cover
//! image. The first eight channel bytes carry a fixed-width header in
//! their low four bits: an 8-bit per-byte bit width and a 24-bit payload
//! size, both little-endian. The payload follows from channel byte eight,
//! `bits` low bits per byte.

use crate::bitstream::{bitcpy, ceildiv};

/// Channel bytes reserved for the header.
pub const HEADER_SIZE: usize = 8;
const HEADER_BITS_PER_BYTE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StegoHeader {
    /// Payload bits carried per channel byte, 1..=8.
    pub bits: u8,
    /// Payload size in bytes, 24-bit.
    pub size: u32,
}

fn read_header(pixels: &[u8]) -> Option<StegoHeader> {
    if pixels.len() < HEADER_SIZE {
        return None;
    }
    let mut raw = [0u8; 4];
    for i in 0..HEADER_SIZE {
        bitcpy(&mut raw, i * HEADER_BITS_PER_BYTE, pixels, i << 3, HEADER_BITS_PER_BYTE);
    }
    Some(StegoHeader {
        bits: raw[0],
        size: u32::from(raw[1]) | (u32::from(raw[2]) << 8) | (u32::from(raw[3]) << 16),
    })
}

fn write_header(pixels: &mut [u8], hdr: StegoHeader) {
    let raw = [
        hdr.bits,
        hdr.size as u8,
        (hdr.size >> 8) as u8,
        (hdr.size >> 16) as u8,
    ];
    for i in 0..HEADER_SIZE {
        bitcpy(pixels, i << 3, &raw, i * HEADER_BITS_PER_BYTE, HEADER_BITS_PER_BYTE);
    }
}

/// Extract an embedded payload from RGBA channel bytes. Fails when the
/// header is missing or inconsistent with the pixel count, which is how
/// a plain image without a payload is recognized.
pub fn extract(pixels: &[u8]) -> Result<Vec<u8>, String> {
    let hdr = read_header(pixels).ok_or("image too small for an embedded payload")?;
    let bits = usize::from(hdr.bits);
    let size = hdr.size as usize;
    let capacity = (pixels.len() * bits / 8).saturating_sub(HEADER_SIZE);
    if bits < 1 || bits > 8 || size == 0 || size > capacity {
        return Err("no embedded payload header".to_string());
    }
    // groups of `bits` bits, so the last group can spill past `size`
    let spill = (size * 8) % bits;
    let mut raw = vec![0u8; size + if spill > 0 { 1 } else { 0 }];
    for i in 0..ceildiv(size * 8, bits) {
        bitcpy(&mut raw, i * bits, &pixels[HEADER_SIZE..], i << 3, bits);
    }
    raw.truncate(size);
    Ok(raw)
}

/// Embed `payload` into the low bits of `pixels`, choosing the smallest
/// per-byte bit width that fits.
pub fn embed(payload: &[u8], pixels: &mut [u8]) -> Result<(), String> {
    if pixels.len() <= HEADER_SIZE {
        return Err("cover image too small".to_string());
    }
    let size = payload.len();
    let bits = ceildiv(size * 8, pixels.len() - HEADER_SIZE).clamp(1, 8);
    if size > (pixels.len() * bits / 8).saturating_sub(HEADER_SIZE) {
        return Err(format!(
            "payload of {} bytes does not fit in the cover image",
            size
        ));
    }
    write_header(
        pixels,
        StegoHeader {
            bits: bits as u8,
            size: size as u32,
        },
    );
    // pad the source so the final group never reads past the payload
    let mut padded = payload.to_vec();
    padded.resize(size + HEADER_SIZE, 0);
    for i in 0..ceildiv(size * 8, bits) {
        bitcpy(&mut pixels[HEADER_SIZE..], i << 3, &padded, i * bits, bits);
    }
    Ok(())
}
