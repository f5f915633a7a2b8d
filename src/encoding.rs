//! Canonical byte encoding shared by hashing and signing.
//!
//! Records are encoded as JSON with object keys in lexicographic order, `", "`
//! between items, `": "` between a key and its value, and every character
//! outside printable ASCII written as a lowercase `\uXXXX` escape (UTF-16
//! surrogate pairs above the BMP). Floats use the shortest round-trip digits,
//! switching to exponent form (`1e-05`, `1.5e+16`) below `1e-4` and from
//! `1e16` up, and always carry a fraction or exponent (`3.0`). Non-finite
//! floats have no encoding and are rejected by the callers that hash or sign
//! them. Two encoders that follow these rules agree byte-for-byte, which is
//! what lets a verifier re-derive a signer's input.

use crate::error::{ChainError, Result};
use serde::Serialize;
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};
use std::io::{self, Write};

#[derive(Debug, Default, Clone, Copy)]
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match float_repr(value) {
            Some(text) => writer.write_all(text.as_bytes()),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("cannot encode float {}", value),
            )),
        }
    }
}

/// Shortest round-trip text for a finite float, exponent form outside
/// `[1e-4, 1e16)`.
fn float_repr(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    // Position of the decimal point relative to the first digit.
    let point = exponent + 1;

    let body = if point <= -4 || point > 16 {
        let (first, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{}", rest)
        };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{}{}e{}{:02}", first, fraction, exp_sign, exponent.abs())
    } else if point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else {
        let point = point as usize;
        if point >= digits.len() {
            format!("{}{}.0", digits, "0".repeat(point - digits.len()))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };
    Some(format!("{}{}", sign, body))
}

/// Reject NaN and infinities before they reach the encoder, which would
/// otherwise collapse them all to `null`.
pub fn require_finite(value: f64, field: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ChainError::EncodingError(format!(
            "{} must be a finite number, got {}",
            field, value
        )))
    }
}

/// Encode `value` canonically. Struct fields are routed through
/// `serde_json::Value`, whose map keeps keys sorted, so declaration order of
/// the Rust type never leaks into the bytes.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    let mut out = Vec::with_capacity(256);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
