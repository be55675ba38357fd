//! Format-preserving scramble engine.
//!
//! A fixed, deterministic, shape-preserving substitution: digits rotate
//! by five, letters rotate by thirteen, and whole numbers go through an
//! affine map re-emplaced into the original template. This is not
//! cryptographic FPE; reversibility is provided by the mapping vault,
//! not by the scramble itself.

use sha2::{Digest, Sha256};

use crate::shape;

/// Derive the 128-bit engine key from a session seed.
///
/// Retained for a drop-in FF1/FF3-1 replacement; the fixed scramble
/// below does not consume it.
pub fn derive_key(seed: Option<&str>) -> [u8; 16] {
    let digest = Sha256::digest(seed.unwrap_or("").as_bytes());
    let mut key = [0u8; 16];
    key.copy_from_slice(&digest[..16]);
    key
}

/// Per-character scramble: digit `d` → `(d + 5) mod 10`, letters ROT13
/// within their case, everything else passes through.
pub fn scramble_char(c: char) -> char {
    if c.is_ascii_digit() {
        (b'0' + ((c as u8 - b'0' + 5) % 10)) as char
    } else if c.is_ascii_uppercase() {
        (b'A' + ((c as u8 - b'A' + 13) % 26)) as char
    } else if c.is_ascii_lowercase() {
        (b'a' + ((c as u8 - b'a' + 13) % 26)) as char
    } else {
        c
    }
}

/// Character-level scramble of an entire string.
pub fn scramble_string(value: &str) -> String {
    value.chars().map(scramble_char).collect()
}

/// Affine scramble of the digits of a formatted numeric value:
/// `n → (n·7919 + 12345) mod 10^L`, re-emplaced into the original
/// template. Falls back to the per-digit map when the digit count
/// exceeds what fits in the modulus arithmetic.
pub fn scramble_numeric(value: &str) -> Option<String> {
    let digits = shape::extract_digits(value);
    if digits.is_empty() {
        return None;
    }
    let fresh = if digits.len() <= 30 {
        let n: u128 = digits.parse().ok()?;
        let modulus = 10u128.pow(digits.len() as u32);
        let scrambled = (n.wrapping_mul(7919).wrapping_add(12345)) % modulus;
        format!("{:0width$}", scrambled, width = digits.len())
    } else {
        digits.chars().map(scramble_char).collect()
    };
    Some(shape::emplace_digits(value, &fresh))
}

/// Card-number scramble: the affine map, with the final digit replaced
/// by the Luhn check digit of the scrambled body so the output is a
/// well-formed PAN.
pub fn scramble_card(value: &str) -> Option<String> {
    let scrambled = scramble_numeric(value)?;
    let digits = shape::extract_digits(&scrambled);
    if digits.len() < 2 {
        return Some(scrambled);
    }
    let body = &digits[..digits.len() - 1];
    let fresh = format!("{}{}", body, shape::luhn_check_digit(body));
    Some(shape::emplace_digits(value, &fresh))
}
