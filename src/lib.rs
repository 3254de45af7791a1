//! PICO-8 to TIC-80 Cartridge Converter Library
//!
//! This library provides the core functionality for converting PICO-8
//! cartridges (.p8 text format or .p8.png images) to TIC-80 .tic chunk
//! containers, and for wrapping .tic files back into PNG cartridges.

pub mod bitstream;
pub mod build_cart;
pub mod charset;
pub mod config;
pub mod convert_cart;
pub mod convert_lua;
pub mod decompress_code;
pub mod lua_shim;
pub mod make_png;
pub mod palette;
pub mod parse_cart;
pub mod png_io;
pub mod stego;
pub mod tokenizer;
