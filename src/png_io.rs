//! PNG decoding and encoding, plus raw chunk access for the private
//! `caRt` chunk some TIC-80 exports carry.

/// A decoded image, always expanded to RGBA8.
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub fn decode_png(png_bytes: &[u8]) -> Result<Image, String> {
    let mut decoder = png::Decoder::new(png_bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| format!("PNG decode error: {}", e))?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let frame_info = reader
        .next_frame(&mut buf)
        .map_err(|e| format!("PNG frame error: {}", e))?;
    let buf = &buf[..frame_info.buffer_size()];

    let (width, height) = (frame_info.width, frame_info.height);
    let pixels = match frame_info.color_type {
        png::ColorType::Rgba => buf.to_vec(),
        png::ColorType::Rgb => {
            // expand to RGBA with opaque alpha
            let mut out = Vec::with_capacity((width * height * 4) as usize);
            for px in buf.chunks_exact(3) {
                out.extend_from_slice(px);
                out.push(0xFF);
            }
            out
        }
        other => return Err(format!("unsupported PNG color type {:?}", other)),
    };
    Ok(Image {
        width,
        height,
        pixels,
    })
}

pub fn encode_png(img: &Image) -> Result<Vec<u8>, String> {
    let mut png_bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_bytes, img.width, img.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| format!("PNG encode error: {}", e))?;
        writer
            .write_image_data(&img.pixels)
            .map_err(|e| format!("PNG encode error: {}", e))?;
    }
    Ok(png_bytes)
}

/// Scan the raw PNG byte stream for the first chunk with the given tag
/// and return its payload. Used for the private `caRt` chunk, which the
/// png crate's decoder does not surface.
pub fn find_chunk<'a>(png_bytes: &'a [u8], tag: &[u8; 4]) -> Option<&'a [u8]> {
    let mut pos = 8; // past the PNG signature
    while pos + 12 <= png_bytes.len() {
        let n = u32::from_be_bytes([
            png_bytes[pos],
            png_bytes[pos + 1],
            png_bytes[pos + 2],
            png_bytes[pos + 3],
        ]) as usize;
        if png_bytes[pos + 4..pos + 8] == tag[..] {
            let start = pos + 8;
            if start + n <= png_bytes.len() {
                return Some(&png_bytes[start..start + n]);
            }
            return None;
        }
        pos += n + 12;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_roundtrip() {
        let img = Image {
            width: 4,
            height: 2,
            pixels: (0..32).collect(),
        };
        let bytes = encode_png(&img).unwrap();
        let back = decode_png(&bytes).unwrap();
        assert_eq!(back.width, 4);
        assert_eq!(back.height, 2);
        assert_eq!(back.pixels, img.pixels);
    }

    #[test]
    fn test_rgb_expands_to_rgba() {
        let mut png_bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_bytes, 2, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3, 4, 5, 6]).unwrap();
        }
        let img = decode_png(&png_bytes).unwrap();
        assert_eq!(img.pixels, vec![1, 2, 3, 0xFF, 4, 5, 6, 0xFF]);
    }

    #[test]
    fn test_find_chunk() {
        let img = Image {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 0xFF],
        };
        let bytes = encode_png(&img).unwrap();
        // every PNG has an IHDR of 13 bytes right after the signature
        let ihdr = find_chunk(&bytes, b"IHDR").unwrap();
        assert_eq!(ihdr.len(), 13);
        assert!(find_chunk(&bytes, b"caRt").is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_png(b"not a png at all").is_err());
    }
}
