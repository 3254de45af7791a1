//! Bit-level primitives shared by the code decompressor and the
//! steganography codec.
//!
//! Both PICO-8's "pxa" code compression and the TIC-80 PNG payload number
//! bits from the least significant end of each byte, so everything here is
//! LSB-first.

/// Sequential LSB-first bit reader over a byte buffer.
///
/// One cursor is created per decode call; there is no shared state between
/// decodes. Reads past the end of the buffer yield zero bits, which matches
/// the decoder loops that terminate on byte position, not on exhaustion.
pub struct BitCursor<'a> {
    data: &'a [u8],
    byte_pos: usize,
    mask: u8,
}

impl<'a> BitCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            mask: 1,
        }
    }

    /// Byte position of the cursor (the byte the next bit comes from).
    pub fn byte_pos(&self) -> usize {
        self.byte_pos
    }

    /// Read a single bit.
    pub fn bit(&mut self) -> u32 {
        let ret = match self.data.get(self.byte_pos) {
            Some(&b) => u32::from(b & self.mask != 0),
            None => 0,
        };
        if self.mask == 0x80 {
            self.mask = 1;
            self.byte_pos += 1;
        } else {
            self.mask <<= 1;
        }
        ret
    }

    /// Read `bits` bits, least significant first.
    pub fn val(&mut self, bits: u32) -> u32 {
        let mut val = 0;
        for i in 0..bits {
            if self.bit() != 0 {
                val |= 1 << i;
            }
        }
        val
    }

    /// Read a chained value: fields of `link_bits` bits are summed while
    /// each field is saturated, up to `max_bits` bits total.
    pub fn chain(&mut self, link_bits: u32, max_bits: u32) -> u32 {
        let max_link_val = (1 << link_bits) - 1;
        let mut val = 0;
        let mut vv = max_link_val;
        let mut bits_read = 0;

        while vv == max_link_val {
            vv = self.val(link_bits);
            bits_read += link_bits;
            val += vv;
            if bits_read >= max_bits {
                return val; // next link is implicitly 0
            }
        }
        val
    }
}

/// Copy `size` bits from bit offset `from` in `src` to bit offset `to` in
/// `dst`. Bit `n` lives in byte `n >> 3`, at position `n & 7` counted from
/// the least significant bit.
pub fn bitcpy(dst: &mut [u8], to: usize, src: &[u8], from: usize, size: usize) {
    for i in 0..size {
        let s = from + i;
        let d = to + i;
        if src[s >> 3] & (1 << (s & 7)) != 0 {
            dst[d >> 3] |= 1 << (d & 7);
        } else {
            dst[d >> 3] &= !(1 << (d & 7));
        }
    }
}

/// Ceiling division, used when converting between bit and byte counts.
pub fn ceildiv(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}
