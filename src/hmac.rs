//! Keyed-hash engine: one-way, vault-free pseudonyms.
//!
//! Projects hex-nibble windows of `SHA-256("<seed|'default'>:<column>:
//! <value>")` into the original value's shape. Outputs are deterministic
//! proofs-of-pseudonym, never stored and never reversible.

use sha2::{Digest, Sha256};

use crate::detect::DataType;
use crate::shape;

/// Stable column name under which domains are digested so identical
/// domains yield identical anonymized domains across columns.
pub const DOMAIN_COLUMN: &str = "__domain__";

pub struct HmacEngine {
    seed: Option<String>,
    preserve_domain: bool,
}

/// An endless nibble supply chained off an initial digest. Values longer
/// than one digest extend by re-hashing rather than exposing any part of
/// the plaintext.
struct Nibbles {
    digest: [u8; 32],
    idx: usize,
    counter: u64,
}

impl Nibbles {
    fn new(digest: [u8; 32]) -> Self {
        Self {
            digest,
            idx: 0,
            counter: 0,
        }
    }

    fn next(&mut self) -> u8 {
        if self.idx >= 64 {
            let mut hasher = Sha256::new();
            hasher.update(self.digest);
            hasher.update(self.counter.to_be_bytes());
            self.digest.copy_from_slice(&hasher.finalize());
            self.counter += 1;
            self.idx = 0;
        }
        let byte = self.digest[self.idx / 2];
        let nibble = if self.idx % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0f
        };
        self.idx += 1;
        nibble
    }

    fn digit(&mut self) -> char {
        (b'0' + self.next() % 10) as char
    }

    fn lower(&mut self) -> char {
        (b'a' + self.next() % 26) as char
    }

    fn upper(&mut self) -> char {
        (b'A' + self.next() % 26) as char
    }

    fn hex(&mut self) -> char {
        char::from_digit(self.next() as u32, 16).unwrap_or('0')
    }
}

impl HmacEngine {
    pub fn new(seed: Option<String>, preserve_domain: bool) -> Self {
        Self {
            seed,
            preserve_domain,
        }
    }

    fn digest_for(&self, column: &str, value: &str) -> Nibbles {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_deref().unwrap_or("default").as_bytes());
        hasher.update(b":");
        hasher.update(column.as_bytes());
        hasher.update(b":");
        hasher.update(value.as_bytes());
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Nibbles::new(digest)
    }

    /// Project a value into its own shape. Pure; never touches a vault.
    pub fn transform(&self, value: &str, data_type: DataType, column: &str) -> String {
        match data_type {
            DataType::Email => self.email(value, column),
            DataType::Domain => self.domain(value, column),
            DataType::Uuid => {
                let mut nibbles = self.digest_for(column, value);
                value
                    .chars()
                    .map(|c| if c == '-' { '-' } else { nibbles.hex() })
                    .collect()
            }
            DataType::Phone | DataType::NumericId | DataType::CreditCard | DataType::Abn => {
                let digits = shape::extract_digits(value);
                let mut nibbles = self.digest_for(column, value);
                let fresh: String = (0..digits.len()).map(|_| nibbles.digit()).collect();
                shape::emplace_digits(value, &fresh)
            }
            _ => {
                let mut nibbles = self.digest_for(column, value);
                project_by_class(value, &mut nibbles)
            }
        }
    }

    fn email(&self, value: &str, column: &str) -> String {
        let Some((local, domain)) = value.split_once('@') else {
            let mut nibbles = self.digest_for(column, value);
            return project_by_class(value, &mut nibbles);
        };
        let mut nibbles = self.digest_for(column, value);
        let local_part = project_by_class(local, &mut nibbles);
        let domain_part = if self.preserve_domain {
            self.domain(domain, DOMAIN_COLUMN)
        } else {
            synth_domain(domain, &mut nibbles)
        };
        format!("{}@{}", local_part, domain_part)
    }

    fn domain(&self, value: &str, column: &str) -> String {
        if self.preserve_domain {
            // A dedicated digest keyed only by the domain itself, so the
            // same domain maps identically in every column.
            let mut nibbles = self.digest_for(DOMAIN_COLUMN, value);
            synth_domain(value, &mut nibbles)
        } else {
            let mut nibbles = self.digest_for(column, value);
            synth_domain(value, &mut nibbles)
        }
    }
}

/// Lowercase labels of the original label lengths; TLD preserved with
/// `.com` as the fallback for TLD-less inputs.
fn synth_domain(original: &str, nibbles: &mut Nibbles) -> String {
    let (labels, tld) = shape::split_tld(original);
    let fresh: Vec<String> = labels
        .iter()
        .map(|label| (0..label.chars().count()).map(|_| nibbles.lower()).collect())
        .collect();
    let tld = if tld.is_empty() { "com" } else { tld };
    format!("{}.{}", fresh.join("."), tld)
}

/// Per-position class-preserving projection: digits stay digits, letters
/// stay letters of the same case, everything else is verbatim.
fn project_by_class(original: &str, nibbles: &mut Nibbles) -> String {
    original
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                nibbles.digit()
            } else if c.is_uppercase() {
                nibbles.upper()
            } else if c.is_lowercase() {
                nibbles.lower()
            } else {
                c
            }
        })
        .collect()
}
