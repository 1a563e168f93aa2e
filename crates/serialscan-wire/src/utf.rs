//! Modified UTF-8 decoding.
//!
//! The serialization format encodes strings in a UTF-8 variant that writes
//! U+0000 as the two-byte sequence `C0 80` and never uses four-byte
//! sequences (code points above the BMP appear as two three-byte surrogate
//! halves). Three byte-pattern classes are accepted:
//!
//! | Pattern                          | Bytes |
//! |----------------------------------|-------|
//! | `0xxxxxxx`                       | 1     |
//! | `110xxxxx 10xxxxxx`              | 2     |
//! | `1110xxxx 10xxxxxx 10xxxxxx`     | 3     |
//!
//! Any other leading pattern, or a continuation byte failing the
//! `10xxxxxx` check, is malformed.

/// Decode a modified-UTF-8 byte sequence into a `String`.
///
/// Surrogate halves (which the encoding represents as standalone three-byte
/// sequences) are not reassembled into supplementary code points; each half
/// decodes to U+FFFD. The scanner only uses decoded strings as labels, so
/// lossy handling there is acceptable; structural validity is still enforced
/// byte-for-byte.
///
/// # Errors
///
/// Returns the index of the offending byte when the input is malformed.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, usize> {
    let mut out = String::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let start = pos;
        let b1 = bytes[pos];
        pos += 1;
        match b1 >> 4 {
            // 1 byte format: 0xxxxxxx
            0..=7 => out.push(char::from(b1)),

            // 2 byte format: 110xxxxx 10xxxxxx
            12 | 13 => {
                let &b2 = bytes.get(pos).ok_or(start)?;
                pos += 1;
                if b2 & 0xC0 != 0x80 {
                    return Err(start);
                }
                let cp = (u32::from(b1 & 0x1F) << 6) | u32::from(b2 & 0x3F);
                out.push(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER));
            }

            // 3 byte format: 1110xxxx 10xxxxxx 10xxxxxx
            14 => {
                if pos + 2 > bytes.len() {
                    return Err(start);
                }
                let (b2, b3) = (bytes[pos], bytes[pos + 1]);
                pos += 2;
                if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                    return Err(start);
                }
                let cp = (u32::from(b1 & 0x0F) << 12)
                    | (u32::from(b2 & 0x3F) << 6)
                    | u32::from(b3 & 0x3F);
                out.push(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER));
            }

            // 10xxxxxx (bare continuation), 1111xxxx
            _ => return Err(start),
        }
    }
    Ok(out)
}
