//! PICO-8 code point to UTF-8 remapping.
//!
//! PICO-8 source stores one glyph per byte in a private charset. Values
//! below 16 are control codes and pass through unchanged; everything else
//! maps through this table. Glyphs 0x80..0x9F have no single Unicode
//! equivalent, so some get multi-character ASCII fallbacks.

/// UTF-8 replacement strings for byte values 16..=255.
#[rustfmt::skip]
const PICO_UTF8: [&str; 240] = [
    // 16-31: special characters
    "▮","■","□","⁙","⁘","‖","◀","▶","「","」","¥","•","、","。","゛","゜",
    // 32-127: standard ASCII
    " ","!","\"","#","$","%","&","'","(",")","*","+",",","-",".","/",
    "0","1","2","3","4","5","6","7","8","9",":",";","<","=",">","?",
    "@","A","B","C","D","E","F","G","H","I","J","K","L","M","N","O",
    "P","Q","R","S","T","U","V","W","X","Y","Z","[","\\","]","^","_",
    "`","a","b","c","d","e","f","g","h","i","j","k","l","m","n","o",
    "p","q","r","s","t","u","v","w","x","y","z","{","|","}","~","○",
    // 128-159: glyphs, with ASCII fallbacks where Unicode has no match
    "█","▒","^.^","↓","░","✽","●","♥","☉",":)","⌂","←",":I","♪","(O)","◆",
    "…","→","★","⧗","↑","ˇ","∧","(X)","▤","▥","あ","い","う","え","お","か",
    // 160-255: hiragana and katakana
    "き","く","け","こ","さ","し","す","せ","そ","た","ち","つ","て","と","な","に",
    "ぬ","ね","の","は","ひ","ふ","へ","ほ","ま","み","む","め","も","や","ゆ","よ",
    "ら","り","る","れ","ろ","わ","を","ん","っ","ゃ","ゅ","ょ","ア","イ","ウ","エ",
    "オ","カ","キ","ク","ケ","コ","サ","シ","ス","セ","ソ","タ","チ","ツ","テ","ト",
    "ナ","ニ","ヌ","ネ","ノ","ハ","ヒ","フ","ヘ","ホ","マ","ミ","ム","メ","モ","ヤ",
    "ユ","ヨ","ラ","リ","ル","レ","ロ","ワ","ヲ","ン","ッ","ャ","ュ","ョ","◜","◝",
];

/// Remap `src` into UTF-8, stopping at the first NUL or when fewer than
/// six bytes of room remain (the widest replacement is a 3-byte sequence
/// per source byte, so a whole glyph always fits). A terminating NUL is
/// written; the returned count excludes it.
pub fn remap_to_utf8(dst: &mut [u8], src: &[u8]) -> usize {
    let end = dst.len().saturating_sub(6);
    let mut pos = 0;
    for &b in src {
        if b == 0 || pos >= end {
            break;
        }
        if b < 16 {
            dst[pos] = b;
            pos += 1;
        } else {
            let rep = PICO_UTF8[usize::from(b) - 16].as_bytes();
            dst[pos..pos + rep.len()].copy_from_slice(rep);
            pos += rep.len();
        }
    }
    dst[pos] = 0;
    pos
}

/// Remap a NUL-terminated code buffer into an owned string, capped at
/// `maxlen` output bytes.
pub fn to_utf8_string(src: &[u8], maxlen: usize) -> String {
    let mut buf = vec![0u8; maxlen + 1];
    let n = remap_to_utf8(&mut buf, src);
    buf.truncate(n);
    // every table entry is valid UTF-8 and control codes are ASCII
    String::from_utf8(buf).unwrap_or_default()
}
