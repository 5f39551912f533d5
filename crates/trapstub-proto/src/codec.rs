//! Checksum, hex and binary-escape helpers for RSP payloads.

use crate::buffer::PacketBuffer;
use crate::error::StubError;

/// Escape marker for binary payload data.
pub const ESCAPE: u8 = b'}';

/// Value XORed into an escaped byte.
const ESCAPE_XOR: u8 = 0x20;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Calculates the GDB checksum for the given data.
///
/// The checksum is the sum of all bytes modulo 256.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, &x| acc.wrapping_add(x))
}

/// Encode bytes as lowercase hex, two characters per byte.
pub fn bytes_to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode hex text (either case) into bytes.
///
/// Odd-length input or any character outside `[0-9a-fA-F]` is a
/// [`StubError::Syntax`] error.
pub fn hex_to_bytes(text: &[u8]) -> Result<Vec<u8>, StubError> {
    hex::decode(text).map_err(|e| StubError::Syntax(format!("bad hex text: {e}")))
}

/// The two lowercase hex digits carried in a frame trailer.
pub fn checksum_digits(sum: u8) -> [u8; 2] {
    [
        HEX_DIGITS[usize::from(sum >> 4)],
        HEX_DIGITS[usize::from(sum & 0x0f)],
    ]
}

/// Parse a frame trailer back into a checksum value.
pub fn parse_checksum(digits: [u8; 2]) -> Result<u8, StubError> {
    let mut out = [0u8; 1];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| StubError::Syntax(format!("bad checksum digits: {e}")))?;
    Ok(out[0])
}

/// Whether `byte` collides with RSP framing and must be escaped in
/// binary data.
pub fn needs_escape(byte: u8) -> bool {
    matches!(byte, b'$' | b'#' | b'}' | b'*')
}

/// Number of payload bytes `byte` occupies once escaped.
pub fn escaped_len(byte: u8) -> usize {
    if needs_escape(byte) {
        2
    } else {
        1
    }
}

/// Append `byte` to `out`, escaping it when necessary.
pub fn escape_into(byte: u8, out: &mut PacketBuffer) -> Result<(), StubError> {
    if needs_escape(byte) {
        out.extend_from_slice(&[ESCAPE, byte ^ ESCAPE_XOR])
    } else {
        out.push(byte)
    }
}
