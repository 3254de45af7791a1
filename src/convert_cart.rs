//! Cartridge converter main API
//!
//! Drives the whole conversion: reads the input file, picks the
//! direction by extension, and writes the result.

use std::fs;
use std::path::Path;

use crate::build_cart;
use crate::make_png;
use crate::parse_cart::{self, ParseOutcome};

pub struct ConvertCart;

impl ConvertCart {
    pub fn new() -> Self {
        Self
    }

    /// Convert one cartridge file.
    ///
    /// `.tic` inputs get wrapped into a TIC-80 PNG; everything else is
    /// treated as a PICO-8 cartridge (text or image) and converted to a
    /// `.tic` file.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(String)` with a user-friendly error message on failure
    pub fn convert(&self, input_path: &str, output_path: &str) -> Result<(), String> {
        let buf = fs::read(input_path)
            .map_err(|e| format!("Unable to read '{}': {}", input_path, e))?;
        if buf.is_empty() {
            return Err(format!("Unable to read '{}': empty file", input_path));
        }

        let out = if input_path.to_lowercase().ends_with(".tic") {
            make_png::tic_to_png(&buf)?
        } else {
            pico8_to_tic(&buf)?
        };

        fs::write(output_path, &out)
            .map_err(|e| format!("Unable to write '{}': {}", output_path, e))?;
        Ok(())
    }
}

impl Default for ConvertCart {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a PICO-8 cartridge byte stream into a `.tic` byte stream.
pub fn pico8_to_tic(buf: &[u8]) -> Result<Vec<u8>, String> {
    match parse_cart::parse(buf)? {
        // already a TIC-80 cartridge hiding in a PNG, just unwrap it
        ParseOutcome::Native(tic) => Ok(tic),
        ParseOutcome::Cartridge(cart) => build_cart::assemble(&cart),
    }
}

/// Default output file name for an input path: known extensions
/// (`.p8.png`, `.p8`, `.tic`, `.tic.png`) are stripped, then `.tic` is
/// put in their place. For `.tic` inputs the output is a PNG, so `.png`
/// is appended on top.
pub fn default_output_name(input: &str) -> String {
    let mut name = input.to_string();
    for ext in [".png", ".p8", ".tic"] {
        if name.to_lowercase().ends_with(ext) {
            name.truncate(name.len() - ext.len());
        }
    }
    // replace whatever extension is left on the file name itself
    let stem_end = match Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::len)
    {
        Some(n) => name.len() - n - 1,
        None => name.len(),
    };
    name.truncate(stem_end);
    name.push_str(".tic");
    if input.to_lowercase().ends_with(".tic") {
        name.push_str(".png");
    }
    name
}
