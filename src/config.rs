//! Fixed size limits shared by the conversion pipeline.
//!
//! Every buffer in the pipeline is pre-sized to one of these maxima; the
//! decode routines bound-check against them before writing, never after.

/// Application version
pub const VERSION: &str = "0.9";

/// Biggest Lua code we can handle (the TIC-80 addressable code space:
/// 8 banks of 64 KB).
pub const LUA_MAX: usize = 524_288;

/// Output cartridge buffer size.
pub const OUT_MAX: usize = 1024 * 1024;

/// Sprite sheet: 128 x 128 pixels at 4 bits per pixel.
pub const GFX_SIZE: usize = 8192;

/// Map: 128 x 64 cells, one byte each. The lower half aliases the upper
/// half of the sprite sheet in the PICO-8 layout.
pub const MAP_SIZE: usize = 8192;

/// Sprite flags: one byte per sprite.
pub const FLAGS_SIZE: usize = 256;

/// Music: 64 patterns of 4 bytes.
pub const MUSIC_SIZE: usize = 256;

/// Sound effects: 64 slots of 68 bytes (32 two-byte notes + 4 scalars).
pub const SFX_SIZE: usize = 4352;

/// Cover image: 240 x 136 pixels at 4 bits per pixel.
pub const LABEL_SIZE: usize = 16320;

/// Raw (uncompressed) code section size inside a classic cartridge image.
pub const RAW_CODE_SIZE: usize = 0x3D00;
