//! Fixed palettes, the default waveform bank, and nearest-color matching.

/// The default PICO-8 palette, 16 RGB triplets.
pub static PICO_PAL: [u8; 48] = [
    0x00, 0x00, 0x00, 0x1D, 0x2B, 0x53, 0x7E, 0x25, 0x53, 0x00, 0x87, 0x51, 0xAB, 0x52, 0x36, 0x5F,
    0x57, 0x4F, 0xC2, 0xC3, 0xC7, 0xFF, 0xF1, 0xE8, 0xFF, 0x00, 0x4D, 0xFF, 0xA3, 0x00, 0xFF, 0xEC,
    0x27, 0x00, 0xE4, 0x36, 0x29, 0xAD, 0xFF, 0x83, 0x76, 0x9C, 0xFF, 0x77, 0xA8, 0xFF, 0xCC, 0xAA,
];

/// TIC-80's default Sweetie-16 palette, used for cover image backgrounds.
pub static SWEETIE16: [u8; 48] = [
    0x1a, 0x1c, 0x2c, 0x5d, 0x27, 0x5d, 0xb1, 0x3e, 0x53, 0xef, 0x7d, 0x57, 0xff, 0xcd, 0x75, 0xa7,
    0xf0, 0x70, 0x38, 0xb7, 0x64, 0x25, 0x71, 0x79, 0x29, 0x36, 0x6f, 0x3b, 0x5d, 0xc9, 0x41, 0xa6,
    0xf6, 0x73, 0xef, 0xf7, 0xf4, 0xf4, 0xf4, 0x94, 0xb0, 0xc2, 0x56, 0x6c, 0x86, 0x33, 0x3c, 0x57,
];

/// Waveform bank matching the PICO-8 instruments. Each waveform is 16
/// bytes of packed 4-bit samples, 32 samples total. Slots 0..7 hold the
/// built-in instruments; 8..15 are left silent for generated custom waves.
#[rustfmt::skip]
pub static PICO_WAVE: [u8; 256] = [
    0xef, 0xde, 0xbc, 0x9a, 0x78, 0x56, 0x34, 0x22, 0x21, 0x32, 0x54, 0x76, 0x98, 0xba, 0xdc, 0xee, // sine
    0x32, 0x43, 0x44, 0x55, 0x66, 0x77, 0x88, 0x88, 0x98, 0xa9, 0xba, 0xcb, 0xcc, 0xdd, 0xbe, 0x58, // triangle
    0x88, 0x98, 0xa9, 0xba, 0xbb, 0xcc, 0xdd, 0xee, 0x21, 0x32, 0x43, 0x54, 0x55, 0x66, 0x77, 0x88, // sawtooth
    0xbb, 0xbb, 0xbb, 0xbb, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55, 0xbb, 0xbb, 0xbb, 0xbb, // square
    0xcc, 0xcc, 0xcc, 0xcc, 0xcc, 0x44, 0x44, 0x44, 0x44, 0x44, 0x44, 0x44, 0x44, 0x44, 0x44, 0x44, // pulse
    0xbc, 0x9a, 0x88, 0x56, 0x54, 0x66, 0x87, 0x88, 0x89, 0x88, 0x67, 0x56, 0x54, 0x86, 0x98, 0xba, // organ
    0x35, 0x59, 0x7d, 0x69, 0x83, 0xc6, 0x35, 0xda, 0x72, 0x42, 0xd3, 0x5c, 0x42, 0x8e, 0xcb, 0x2b, // noise
    0xab, 0x9a, 0x88, 0x78, 0x67, 0x55, 0x34, 0x23, 0x22, 0x33, 0x54, 0x65, 0x77, 0x88, 0x98, 0xaa, // phaser
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Map an RGB color to the nearest PICO-8 palette index.
///
/// The low two bits of each channel carry cartridge data in classic
/// images, so they are masked off before the exact-match check. Ties go
/// to the lower index.
pub fn palette_index(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r & !3, g & !3, b & !3);
    let mut best = 0u8;
    let mut best_dist = u32::MAX;
    for i in 0..16 {
        let pr = PICO_PAL[i * 3];
        let pg = PICO_PAL[i * 3 + 1];
        let pb = PICO_PAL[i * 3 + 2];
        if (pr & !3) == r && (pg & !3) == g && (pb & !3) == b {
            return i as u8;
        }
        let dr = u32::from(r.abs_diff(pr));
        let dg = u32::from(g.abs_diff(pg));
        let db = u32::from(b.abs_diff(pb));
        let d = dr * dr + dg * dg + db * db;
        if d < best_dist {
            best_dist = d;
            best = i as u8;
        }
    }
    best
}

/// Render one 16-byte custom waveform slot from a sound effect.
///
/// Proper synthesis (volume envelope, effects, detune) is not implemented;
/// the slot is written as silence, which players treat as a flat wave.
pub fn generate_waveform(out: &mut [u8], _sfx: &[u8], _flags: u8, _speed: u8) {
    for b in out.iter_mut().take(16) {
        *b = 0;
    }
}
