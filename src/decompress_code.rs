//! Decompressors for the two code-section compression schemes found in
//! classic PICO-8 cartridge images, plus the dispatcher that picks one
//! based on the leading tag bytes.

use crate::bitstream::BitCursor;
use crate::config;

/// Tag of the old fixed-alphabet scheme: `:c:` followed by a NUL.
const TAG_MINI: [u8; 4] = [b':', b'c', b':', 0];
/// Tag of the newer bitstream scheme: a NUL followed by `pxa`.
const TAG_PXA: [u8; 4] = [0, b'p', b'x', b'a'];

/// 60-character alphabet of the old scheme. Index 0 is the escape for a
/// raw byte; indices 1..59 map directly to these characters.
const MINI_ALPHABET: &[u8; 60] =
    b"^\n 0123456789abcdefghijklmnopqrstuvwxyz!#%(){}[]<>+=/*:;.,~_";

/// Compression scheme of a code section, decided by its first four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeFormat {
    /// No tag: the section is plain source text.
    Raw,
    /// Old fixed-alphabet scheme.
    Mini,
    /// Newer move-to-front bitstream scheme.
    Pxa,
}

pub fn code_format(data: &[u8]) -> CodeFormat {
    if data.len() >= 4 {
        if data[..4] == TAG_MINI {
            return CodeFormat::Mini;
        }
        if data[..4] == TAG_PXA {
            return CodeFormat::Pxa;
        }
    }
    CodeFormat::Raw
}

/// Decompress an old-format code section into `out`. The declared length is
/// validated against the output capacity before anything is written.
///
/// Returns the number of bytes produced, which can slightly exceed the
/// declared length when the final back-reference overshoots it.
pub fn decompress_mini(input: &[u8], out: &mut [u8]) -> Result<usize, String> {
    if input.len() < 8 {
        return Err("compressed code section is truncated".to_string());
    }
    let len = (usize::from(input[4]) << 8) | usize::from(input[5]);
    // bytes 6..8 hold the compressed length, unused by the decoder
    if len > out.len() {
        return Err(format!(
            "declared code length {} exceeds capacity {}",
            len,
            out.len()
        ));
    }
    for b in out.iter_mut() {
        *b = 0;
    }

    let mut src = 8;
    let mut dst = 0;
    while dst < len {
        let ctl = usize::from(
            *input
                .get(src)
                .ok_or("unexpected end of compressed code section")?,
        );
        src += 1;
        if ctl == 0 {
            // escaped raw byte
            out[dst] = *input
                .get(src)
                .ok_or("unexpected end of compressed code section")?;
            src += 1;
            dst += 1;
        } else if ctl < 60 {
            out[dst] = MINI_ALPHABET[ctl];
            dst += 1;
        } else {
            let next = usize::from(
                *input
                    .get(src)
                    .ok_or("unexpected end of compressed code section")?,
            );
            src += 1;
            let offset = (ctl - 60) * 16 + (next & 15);
            let count = next / 16 + 2;
            if offset > dst {
                return Err("back-reference before start of output".to_string());
            }
            for _ in 0..count {
                if dst >= out.len() {
                    return Err("back-reference overruns output capacity".to_string());
                }
                out[dst] = out[dst - offset];
                dst += 1;
            }
        }
    }
    Ok(dst)
}

/// Decompress a `pxa`-format code section into `out`.
///
/// `out` is assumed zeroed by the caller; the decoder keeps it
/// NUL-terminated as it goes so a partial decode still yields a valid
/// C string prefix.
pub fn decompress_pxa(input: &[u8], out: &mut [u8]) -> Result<(), String> {
    if input.len() < 8 {
        return Err("compressed code section is truncated".to_string());
    }
    let mut cur = BitCursor::new(input);
    let mut hdr = [0u8; 8];
    for h in hdr.iter_mut() {
        *h = cur.val(8) as u8;
    }
    let raw_len = (usize::from(hdr[4]) << 8) | usize::from(hdr[5]);
    let comp_len = (usize::from(hdr[6]) << 8) | usize::from(hdr[7]);

    // move-to-front table, initially the identity permutation
    let mut literal = [0u8; 256];
    for (i, l) in literal.iter_mut().enumerate() {
        *l = i as u8;
    }

    let mut dst = 0;
    while cur.byte_pos() < comp_len && dst < raw_len && dst < out.len() {
        if cur.bit() == 0 {
            // copy block: distance field first
            let dist_bits = (3 - cur.chain(1, 2)) * 5;
            let dist = cur.val(dist_bits) as usize;
            if dist == 0 && dist_bits == 10 {
                // sentinel: a NUL-terminated run of raw bytes follows
                while dst < raw_len && dst < out.len() {
                    let b = cur.val(8) as u8;
                    out[dst] = b;
                    if b == 0 {
                        break; // terminator is written but not counted
                    }
                    dst += 1;
                }
            } else {
                let offset = dist + 1;
                if offset > dst {
                    return Err("back-reference before start of output".to_string());
                }
                let mut count = cur.chain(3, 100_000) as usize + 3;
                while count > 0 && dst < out.len() {
                    out[dst] = out[dst - offset];
                    dst += 1;
                    count -= 1;
                }
            }
        } else {
            // literal: unary doubling prefix selects the rank width
            let mut rank = 0usize;
            let mut extra = 0;
            let mut safety = 0;
            loop {
                if cur.bit() != 1 || safety >= 16 {
                    break;
                }
                safety += 1;
                rank += 1 << (4 + extra);
                extra += 1;
            }
            rank += cur.val(4 + extra) as usize;
            if rank > 255 {
                return Err("corrupt literal rank".to_string());
            }
            let c = literal[rank];
            out[dst] = c;
            dst += 1;
            if dst < out.len() {
                out[dst] = 0;
            }
            for i in (1..=rank).rev() {
                literal[i] = literal[i - 1];
            }
            literal[0] = c;
        }
    }
    Ok(())
}

/// Decompress a raw code section (0x3D00 bytes at offset 0x4300 of the
/// cartridge image) into `out`, dispatching on the tag bytes. `out` must
/// be zeroed on entry; on failure it is left zeroed so the caller sees an
/// empty code section.
pub fn decompress_code_section(input: &[u8], out: &mut [u8]) -> Result<(), String> {
    match code_format(input) {
        CodeFormat::Mini => {
            decompress_mini(input, out)?;
            Ok(())
        }
        CodeFormat::Pxa => {
            let res = decompress_pxa(input, out);
            if res.is_err() {
                for b in out.iter_mut() {
                    *b = 0;
                }
            }
            res
        }
        CodeFormat::Raw => {
            let n = input.len().min(config::RAW_CODE_SIZE).min(out.len().saturating_sub(1));
            out[..n].copy_from_slice(&input[..n]);
            out[n] = 0;
            Ok(())
        }
    }
}
