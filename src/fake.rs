//! Synthetic value generators for the fake engine.
//!
//! Every generator is a pure function over a caller-supplied PRNG (see
//! `rng::value_rng`), so a given `(seed, value, attempt)` always yields
//! the same candidate. Pool-based generation keeps outputs plausible;
//! shape primitives keep them structurally identical to the original.

use chrono::{Duration, Utc};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::shape;

pub const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Iris", "Jack", "Karen",
    "Leo", "Mia", "Noah", "Olivia",
];

pub const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Wilson", "Anderson", "Taylor", "Thomas", "Moore",
];

const DOMAIN_WORDS: &[&str] = &[
    "meadow", "harbor", "lantern", "summit", "willow", "cobalt", "ember", "quarry", "sable",
    "tundra", "verdant", "zephyr", "anchor", "birch", "cinder",
];

const WORDS: &[&str] = &[
    "apple", "ballad", "canyon", "drift", "ember", "fable", "grove", "harvest", "island", "jumble",
    "kettle", "lumen", "mantle", "nectar", "orchid", "pebble", "quill", "ripple", "saddle",
    "thicket",
];

const STREET_NAMES: &[&str] = &[
    "Acacia", "Banksia", "Clarendon", "Dorset", "Elm", "Fairview", "Grandview", "Hawthorn",
    "Jacaranda", "Kingsway",
];

const STREET_TYPES: &[&str] = &["Street", "Road", "Avenue", "Lane", "Parade", "Court"];

const CITIES: &[&str] = &[
    "Brighton", "Clayton", "Eastwood", "Fernhill", "Greenvale", "Huntley", "Kingsford",
    "Lakewood", "Merton", "Northgate",
];

const STATES: &[&str] = &["NSW", "VIC", "QLD", "SA", "WA", "TAS"];

fn pick<'a>(rng: &mut ChaCha20Rng, pool: &[&'a str]) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

fn random_lower(rng: &mut ChaCha20Rng) -> char {
    (b'a' + rng.gen_range(0..26u8)) as char
}

fn random_digit(rng: &mut ChaCha20Rng) -> char {
    (b'0' + rng.gen_range(0..10u8)) as char
}

/// Truncate or pad (with random lowercase letters) to exactly `len` chars.
fn fit_to_length(candidate: &str, len: usize, rng: &mut ChaCha20Rng) -> String {
    let mut out: String = shape::truncate_chars(candidate, len).to_string();
    while out.chars().count() < len {
        out.push(random_lower(rng));
    }
    out
}

/// A synthetic username, e.g. `carol.davis42`.
pub fn username(rng: &mut ChaCha20Rng) -> String {
    format!(
        "{}.{}{}",
        pick(rng, FIRST_NAMES).to_lowercase(),
        pick(rng, LAST_NAMES).to_lowercase(),
        rng.gen_range(0..100u32),
    )
}

/// Replacement for an email local part: same length, same case pattern.
pub fn email_local(original_local: &str, rng: &mut ChaCha20Rng) -> String {
    let candidate = fit_to_length(&username(rng), original_local.chars().count(), rng);
    shape::preserve_case(original_local, &candidate)
}

/// A synthetic domain preserving the original's label lengths and TLD.
pub fn domain(original_domain: &str, rng: &mut ChaCha20Rng) -> String {
    let (labels, tld) = shape::split_tld(original_domain);
    let fake_labels: Vec<String> = labels
        .iter()
        .map(|label| fit_to_length(pick(rng, DOMAIN_WORDS), label.chars().count(), rng))
        .collect();
    if tld.is_empty() {
        fake_labels.join(".")
    } else {
        format!("{}.{}", fake_labels.join("."), tld.to_lowercase())
    }
}

/// Fresh digits behind the original phone formatting. `None` when the
/// value holds no digits at all.
pub fn phone(original: &str, rng: &mut ChaCha20Rng) -> Option<String> {
    let digits = shape::extract_digits(original);
    if digits.is_empty() {
        return None;
    }
    let fresh: String = (0..digits.len()).map(|_| random_digit(rng)).collect();
    Some(shape::emplace_digits(original, &fresh))
}

/// Pool-drawn name preserving word count, per-word length, and case.
/// Single-character tokens (initials) pass through unchanged.
pub fn name(original: &str, rng: &mut ChaCha20Rng) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut used_first = false;
    for word in original.split_whitespace() {
        if word.chars().count() == 1 {
            out.push(word.to_string());
            continue;
        }
        let pool = if used_first { LAST_NAMES } else { FIRST_NAMES };
        used_first = true;
        let candidate = fit_to_length(pick(rng, pool), word.chars().count(), rng);
        out.push(shape::preserve_case(word, &candidate));
    }
    out.join(" ")
}

/// A fresh random (but seed-deterministic) UUIDv4.
pub fn uuid_v4(rng: &mut ChaCha20Rng) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// A random date in the last 50 years, rendered in the original's format.
/// `None` when the original matches no known date shape.
pub fn date(original: &str, rng: &mut ChaCha20Rng) -> Option<String> {
    let fmt = date_format(original)?;
    let days_back = rng.gen_range(0..50 * 365i64);
    let day = Utc::now().date_naive() - Duration::days(days_back);
    Some(day.format(fmt).to_string())
}

fn date_format(value: &str) -> Option<&'static str> {
    let v = value.trim();
    let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let shaped = |a: usize, sep: char, b: usize, c: usize| -> bool {
        let parts: Vec<&str> = v.split(sep).collect();
        parts.len() == 3
            && is_digits(parts[0])
            && is_digits(parts[1])
            && is_digits(parts[2])
            && parts[0].len() == a
            && parts[1].len() == b
            && parts[2].len() == c
    };
    if shaped(4, '-', 2, 2) {
        Some("%Y-%m-%d")
    } else if shaped(2, '/', 2, 4) {
        Some("%d/%m/%Y")
    } else if shaped(2, '-', 2, 4) {
        Some("%d-%m-%Y")
    } else if shaped(4, '/', 2, 2) {
        Some("%Y/%m/%d")
    } else if is_digits(v) && v.len() == 8 {
        Some("%Y%m%d")
    } else {
        None
    }
}

/// Same-length digit string; the first digit is never zero.
pub fn numeric_id(original: &str, rng: &mut ChaCha20Rng) -> Option<String> {
    let v = original.trim();
    if v.is_empty() || !v.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut out = String::with_capacity(v.len());
    out.push((b'1' + rng.gen_range(0..9u8)) as char);
    for _ in 1..v.len() {
        out.push(random_digit(rng));
    }
    Some(out)
}

/// A Luhn-valid number of the same digit count, re-emplaced into the
/// original separator pattern.
pub fn credit_card(original: &str, rng: &mut ChaCha20Rng) -> Option<String> {
    let digits = shape::extract_digits(original);
    if digits.len() < 2 {
        return None;
    }
    let mut body = String::with_capacity(digits.len() - 1);
    body.push((b'1' + rng.gen_range(0..9u8)) as char);
    for _ in 2..digits.len() {
        body.push(random_digit(rng));
    }
    let check = shape::luhn_check_digit(&body);
    let fresh = format!("{}{}", body, check);
    Some(shape::emplace_digits(original, &fresh))
}

/// A syntactically valid IBAN keeping the original country prefix and
/// overall shape (whitespace grouping included).
pub fn iban(original: &str, rng: &mut ChaCha20Rng) -> Option<String> {
    let compact: Vec<char> = original.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 4 || !compact[0].is_ascii_alphabetic() || !compact[1].is_ascii_alphabetic()
    {
        return None;
    }
    let mut fresh = String::with_capacity(compact.len());
    fresh.push(compact[0].to_ascii_uppercase());
    fresh.push(compact[1].to_ascii_uppercase());
    fresh.push(random_digit(rng));
    fresh.push(random_digit(rng));
    for _ in 4..compact.len() {
        // Uppercase alphanumeric, digits weighted like real BBANs
        if rng.gen_bool(0.7) {
            fresh.push(random_digit(rng));
        } else {
            fresh.push((b'A' + rng.gen_range(0..26u8)) as char);
        }
    }
    // Re-flow the original whitespace grouping
    let mut supply = fresh.chars();
    Some(
        original
            .chars()
            .map(|c| {
                if c.is_whitespace() {
                    c
                } else {
                    supply.next().unwrap_or(c)
                }
            })
            .collect(),
    )
}

/// A synthetic postal address. No shape preservation beyond being one.
pub fn address(rng: &mut ChaCha20Rng) -> String {
    format!(
        "{} {} {}, {} {} {}",
        rng.gen_range(1..400u32),
        pick(rng, STREET_NAMES),
        pick(rng, STREET_TYPES),
        pick(rng, CITIES),
        pick(rng, STATES),
        rng.gen_range(1000..8000u32),
    )
}

/// Word-pool replacement for prose; non-alphabetic tokens fall back to
/// per-character class-preserving substitution.
pub fn free_text(original: &str, rng: &mut ChaCha20Rng) -> String {
    let words: Vec<&str> = original.split_whitespace().collect();
    if words.len() > 1 {
        let out: Vec<String> = words
            .iter()
            .map(|word| {
                if word.chars().all(|c| c.is_alphabetic()) {
                    let candidate = fit_to_length(pick(rng, WORDS), word.chars().count(), rng);
                    shape::preserve_case(word, &candidate)
                } else {
                    substitute_by_class(word, rng)
                }
            })
            .collect();
        out.join(" ")
    } else {
        substitute_by_class(original, rng)
    }
}

/// Per-character substitution: digit→digit, upper→upper, lower→lower,
/// everything else verbatim.
pub fn substitute_by_class(value: &str, rng: &mut ChaCha20Rng) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                random_digit(rng)
            } else if c.is_uppercase() {
                (b'A' + rng.gen_range(0..26u8)) as char
            } else if c.is_lowercase() {
                random_lower(rng)
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::value_rng;

    fn rng_for(value: &str) -> ChaCha20Rng {
        value_rng(Some("test-seed"), value, 0)
    }

    #[test]
    fn test_email_local_length_and_case() {
        let local = "John.Smith";
        let out = email_local(local, &mut rng_for(local));
        assert_eq!(out.chars().count(), local.chars().count());
        assert_eq!(out.chars().next().unwrap().is_uppercase(), true);
        assert_eq!(out.chars().nth(4).unwrap(), '.');
    }

    #[test]
    fn test_domain_preserves_label_lengths_and_tld() {
        let out = domain("mail.acme.com", &mut rng_for("mail.acme.com"));
        let parts: Vec<&str> = out.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 4);
        assert_eq!(parts[1].len(), 4);
        assert_eq!(parts[2], "com");
    }

    #[test]
    fn test_phone_keeps_formatting() {
        let original = "+61-421-555-829";
        let out = phone(original, &mut rng_for(original)).unwrap();
        assert_eq!(out.len(), original.len());
        for (o, n) in original.chars().zip(out.chars()) {
            if !o.is_ascii_digit() {
                assert_eq!(o, n);
            }
        }
        assert!(phone("no digits at all", &mut rng_for("x")).is_none());
    }

    #[test]
    fn test_name_preserves_structure() {
        let out = name("John Q Smith", &mut rng_for("John Q Smith"));
        let tokens: Vec<&str> = out.split(' ').collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].len(), 4);
        assert_eq!(tokens[1], "Q");
        assert_eq!(tokens[2].len(), 5);
        assert!(tokens[0].chars().next().unwrap().is_uppercase());
        assert!(tokens[0][1..].chars().all(|c| c.is_lowercase()));
    }

    #[test]
    fn test_uuid_v4_shape() {
        let out = uuid_v4(&mut rng_for("x"));
        let u = uuid::Uuid::parse_str(&out).unwrap();
        assert_eq!(u.get_version_num(), 4);
    }

    #[test]
    fn test_uuid_deterministic_per_seed() {
        assert_eq!(uuid_v4(&mut rng_for("x")), uuid_v4(&mut rng_for("x")));
    }

    #[test]
    fn test_date_formats() {
        assert!(date("2021-04-01", &mut rng_for("a"))
            .unwrap()
            .chars()
            .nth(4)
            .map(|c| c == '-')
            .unwrap());
        let dmy = date("01/04/2021", &mut rng_for("b")).unwrap();
        assert_eq!(dmy.len(), 10);
        assert_eq!(dmy.chars().nth(2).unwrap(), '/');
        assert_eq!(date("20210401", &mut rng_for("c")).unwrap().len(), 8);
        assert!(date("not a date", &mut rng_for("d")).is_none());
    }

    #[test]
    fn test_numeric_id_length_and_leading_digit() {
        let out = numeric_id("004217", &mut rng_for("004217")).unwrap();
        assert_eq!(out.len(), 6);
        assert_ne!(out.chars().next().unwrap(), '0');
        assert!(numeric_id("12ab", &mut rng_for("x")).is_none());
    }

    #[test]
    fn test_credit_card_luhn_and_format() {
        let original = "4111-1111-1111-1111";
        let out = credit_card(original, &mut rng_for(original)).unwrap();
        assert_eq!(out.len(), original.len());
        assert_eq!(out.chars().filter(|c| *c == '-').count(), 3);
        assert!(crate::shape::luhn_valid(&crate::shape::extract_digits(&out)));
    }

    #[test]
    fn test_iban_prefix_and_length() {
        let original = "GB82 WEST 1234 5698 7654 32";
        let out = iban(original, &mut rng_for(original)).unwrap();
        assert_eq!(out.len(), original.len());
        assert!(out.starts_with("GB"));
        let compact: String = out.chars().filter(|c| !c.is_whitespace()).collect();
        assert!(compact[2..4].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_address_is_nonempty() {
        let out = address(&mut rng_for("x"));
        assert!(out.contains(','));
        assert!(out.split_whitespace().count() >= 5);
    }

    #[test]
    fn test_free_text_word_shape() {
        let out = free_text("Confidential project Alpha", &mut rng_for("v"));
        let tokens: Vec<&str> = out.split(' ').collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].len(), "Confidential".len());
        assert!(tokens[0].chars().next().unwrap().is_uppercase());
    }

    #[test]
    fn test_substitute_by_class() {
        let out = substitute_by_class("AB-12_cd", &mut rng_for("v"));
        assert_eq!(out.len(), 8);
        assert!(out.chars().take(2).all(|c| c.is_ascii_uppercase()));
        assert_eq!(out.chars().nth(2).unwrap(), '-');
        assert!(out[3..5].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(out.chars().nth(5).unwrap(), '_');
        assert!(out[6..].chars().all(|c| c.is_ascii_lowercase()));
    }
}
