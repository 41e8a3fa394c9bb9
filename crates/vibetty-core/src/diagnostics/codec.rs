//! Text codec for logging raw terminal traffic.
//!
//! Every logged transfer is rendered twice:
//!
//! ```text
//! SEND [6 bytes]: 1b 5b 31 3b 35 41
//! SEND readable: ESC[1;5A
//! ```
//!
//! # Hex form
//!
//! Each byte becomes two lowercase hex digits, separated by single spaces, in
//! the original order.  [`decode_hex`] reverses it exactly, so the hex form is a
//! lossless record of what went over the wire.
//!
//! # Readable form
//!
//! Each byte is read as one character (Latin-1, so byte `0xE9` is `é`):
//!
//! | Byte                         | Rendering                  |
//! |------------------------------|----------------------------|
//! | `0x1B`                       | `ESC`                      |
//! | `0x00`–`0x1F` (except ESC)   | `^` + char(code + 64)      |
//! | `0x7F`                       | `^¿` (127 + 64 = 0xBF)     |
//! | anything else                | the character itself       |
//!
//! The readable form is lossy on purpose: `^A` could be the control byte `0x01`
//! or the two printable bytes `^` and `A`.  Use the hex form when exactness
//! matters.
//!
//! These rules must stay bit-exact; existing log tooling greps for them.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ESC: u8 = 0x1B;
const DEL: u8 = 0x7F;

/// Which way the bytes travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Keyboard input sent to the remote host.
    Sent,
    /// Output received from the remote host.
    Received,
}

impl Direction {
    /// The four-letter tag used at the start of each log line.
    pub fn tag(self) -> &'static str {
        match self {
            Direction::Sent => "SEND",
            Direction::Received => "RECV",
        }
    }
}

/// One logged byte transfer, rendered for humans.  Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub direction: Direction,
    /// Number of raw bytes the record describes.
    pub length: usize,
    /// Space-separated lowercase hex, two digits per byte.
    pub hex: String,
    /// Control-escaped readable rendering.
    pub printable: String,
    /// Set only by [`encode_byte`]; the hex line then says `[1 byte]`.
    /// Buffer records always say `[n bytes]`, even for a single byte.
    #[serde(default)]
    pub single_byte: bool,
}

impl DiagnosticRecord {
    /// `SEND [3 bytes]: 1b 5b 41`
    pub fn hex_line(&self) -> String {
        let unit = if self.single_byte { "byte" } else { "bytes" };
        format!("{} [{} {}]: {}", self.direction.tag(), self.length, unit, self.hex)
    }

    /// `SEND readable: ESC[A`
    pub fn readable_line(&self) -> String {
        format!("{} readable: {}", self.direction.tag(), self.printable)
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.hex_line())?;
        write!(f, "{}", self.readable_line())
    }
}

/// Error returned by [`decode_hex`] for text that is not a hex-form record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexDecodeError {
    /// A whitespace-separated token was not exactly two hex digits.
    #[error("invalid hex token {token:?} at position {index}")]
    InvalidToken { index: usize, token: String },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Renders `bytes` as a [`DiagnosticRecord`].
///
/// # Examples
///
/// ```rust
/// use vibetty_core::diagnostics::codec::{encode, Direction};
///
/// let record = encode(&[0x01, 0x41], Direction::Received);
/// assert_eq!(record.hex, "01 41");
/// assert_eq!(record.printable, "^AA");
/// ```
pub fn encode(bytes: &[u8], direction: Direction) -> DiagnosticRecord {
    let mut hex = String::with_capacity(bytes.len() * 3);
    let mut printable = String::with_capacity(bytes.len());

    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 {
            hex.push(' ');
        }
        // Writing to a String cannot fail.
        let _ = write!(hex, "{b:02x}");
        push_printable(&mut printable, b);
    }

    DiagnosticRecord { direction, length: bytes.len(), hex, printable, single_byte: false }
}

/// Renders a single byte with the same rules as [`encode`].
///
/// Unlike a one-byte buffer, the record's hex line reads `[1 byte]`.
pub fn encode_byte(byte: u8, direction: Direction) -> DiagnosticRecord {
    DiagnosticRecord { single_byte: true, ..encode(std::slice::from_ref(&byte), direction) }
}

/// Parses the hex form produced by [`encode`] back into bytes.
///
/// Tokens may be separated by any amount of whitespace; an empty string
/// decodes to an empty buffer.
///
/// # Errors
///
/// Returns [`HexDecodeError::InvalidToken`] for any token that is not exactly
/// two hex digits.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, HexDecodeError> {
    hex.split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            // from_str_radix alone would accept a leading '+'.
            if token.len() != 2 || !token.bytes().all(|c| c.is_ascii_hexdigit()) {
                return Err(HexDecodeError::InvalidToken { index, token: token.to_string() });
            }
            u8::from_str_radix(token, 16)
                .map_err(|_| HexDecodeError::InvalidToken { index, token: token.to_string() })
        })
        .collect()
}

/// Readable rendering of one byte.
pub fn printable(byte: u8) -> String {
    let mut out = String::new();
    push_printable(&mut out, byte);
    out
}

fn push_printable(out: &mut String, b: u8) {
    match b {
        ESC => out.push_str("ESC"),
        // b + 64 never exceeds 0xBF here.
        0x00..=0x1F | DEL => {
            out.push('^');
            out.push(char::from(b + 64));
        }
        _ => out.push(char::from(b)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
