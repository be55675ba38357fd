//! Engine property tests: determinism, shape preservation, injectivity,
//! and domain grouping across fresh engine instances.

use std::sync::Arc;

use cloak::detect::DataType;
use cloak::engine::Transformer;
use cloak::profile::{AnonymizationMode, Profile};
use cloak::vault::MappingVault;
use tempfile::TempDir;

fn profile(mode: AnonymizationMode, seed: &str) -> Profile {
    Profile::new("test", mode).with_seed(seed)
}

fn transform(t: &Transformer, value: &str, data_type: DataType, column: &str) -> String {
    t.transform(Some(value), data_type, column)
        .unwrap()
        .unwrap()
}

/// Determinism: two independently constructed engines with the same
/// seed produce identical outputs for every mode.
#[test]
fn determinism_across_engine_instances() {
    let cases = [
        ("john.smith@acme.com", DataType::Email, "email"),
        ("+61-421-555-829", DataType::Phone, "phone"),
        ("John Q Smith", DataType::Name, "name"),
        ("4111-1111-1111-1111", DataType::CreditCard, "cc"),
        ("2021-04-01", DataType::Date, "joined"),
        ("00421733", DataType::NumericId, "ref"),
        ("GB82WEST12345698765432", DataType::Iban, "iban"),
        ("some plain text", DataType::FreeText, "notes"),
    ];
    for mode in [
        AnonymizationMode::Fake,
        AnonymizationMode::Fpe,
        AnonymizationMode::Hmac,
        AnonymizationMode::Hybrid,
    ] {
        let a = Transformer::from_profile(&profile(mode, "s1"), None);
        let b = Transformer::from_profile(&profile(mode, "s1"), None);
        for (value, data_type, column) in cases {
            assert_eq!(
                transform(&a, value, data_type, column),
                transform(&b, value, data_type, column),
                "mode {} value {:?}",
                mode,
                value
            );
        }
    }
}

/// Shape preservation: same length, and non-alphanumeric positions
/// byte-for-byte, for the shape-bearing types.
#[test]
fn shape_preservation() {
    let cases = [
        ("+61 421 555 829", DataType::Phone),
        ("00421733", DataType::NumericId),
        ("4111-1111-1111-1111", DataType::CreditCard),
        ("GB82WEST12345698765432", DataType::Iban),
        ("2021-04-01", DataType::Date),
        ("john.smith@acme.com", DataType::Email),
    ];
    for mode in [
        AnonymizationMode::Fake,
        AnonymizationMode::Fpe,
        AnonymizationMode::Hmac,
        AnonymizationMode::Hybrid,
    ] {
        let t = Transformer::from_profile(&profile(mode, "s1"), None);
        for (value, data_type) in cases {
            let out = transform(&t, value, data_type, "c");
            assert_eq!(out.len(), value.len(), "mode {} value {:?}", mode, value);
            for (o, n) in value.chars().zip(out.chars()) {
                if !o.is_ascii_alphanumeric() {
                    assert_eq!(o, n, "mode {} value {:?} output {:?}", mode, value, out);
                }
            }
        }
    }
}

/// Name shape: word count, per-token length, whitespace positions.
#[test]
fn name_token_shape() {
    for mode in [AnonymizationMode::Fake, AnonymizationMode::Hmac] {
        let t = Transformer::from_profile(&profile(mode, "s1"), None);
        let out = transform(&t, "John Q Smith", DataType::Name, "name");
        let tokens: Vec<&str> = out.split(' ').collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].len(), 4);
        assert_eq!(tokens[1].len(), 1);
        assert_eq!(tokens[2].len(), 5);
    }
}

/// Scenario: emails under preserve_domain share one anonymized domain
/// per original domain; local parts keep their lengths and `@` index.
#[test]
fn scenario_email_preserve_domain() {
    let dir = TempDir::new().unwrap();
    let vault = Arc::new(MappingVault::open(&dir.path().join("v.db"), Some("pw")).unwrap());
    let mut p = profile(AnonymizationMode::Fake, "s1");
    p.preserve_domain = true;
    let t = Transformer::from_profile(&p, Some(vault));

    let a = transform(&t, "john.smith@acme.com", DataType::Email, "email");
    let b = transform(&t, "jane@acme.com", DataType::Email, "email");
    let c = transform(&t, "bob@example.org", DataType::Email, "email");

    let split = |s: &str| {
        let (l, d) = s.split_once('@').unwrap();
        (l.to_string(), d.to_string())
    };
    let (la, da) = split(&a);
    let (lb, db) = split(&b);
    let (_, dc) = split(&c);

    assert_eq!(da, db, "same original domain, same anonymized domain");
    assert_ne!(da, dc, "different original domains stay distinct");
    assert_eq!(la.len(), "john.smith".len());
    assert_eq!(lb.len(), "jane".len());
    assert_eq!(a.find('@'), "john.smith@acme.com".find('@'));
}

/// Scenario: credit card under FPE keeps the dashed grouping, is
/// Luhn-valid, and differs from the input.
#[test]
fn scenario_credit_card_fpe() {
    let t = Transformer::from_profile(&profile(AnonymizationMode::Fpe, "s1"), None);
    let out = transform(&t, "4111-1111-1111-1111", DataType::CreditCard, "cc");

    let groups: Vec<&str> = out.split('-').collect();
    assert_eq!(groups.len(), 4);
    for group in &groups {
        assert_eq!(group.len(), 4);
        assert!(group.chars().all(|c| c.is_ascii_digit()));
    }
    assert!(cloak::shape::luhn_valid(&cloak::shape::extract_digits(&out)));
    assert_ne!(out, "4111-1111-1111-1111");
}

/// Scenario: a fake name keeps the `First I Last` structure.
#[test]
fn scenario_fake_name() {
    let t = Transformer::from_profile(&profile(AnonymizationMode::Fake, "s1"), None);
    let out = transform(&t, "John Q Smith", DataType::Name, "name");
    let tokens: Vec<&str> = out.split(' ').collect();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1], "Q");
    for token in [tokens[0], tokens[2]] {
        let mut chars = token.chars();
        assert!(chars.next().unwrap().is_ascii_uppercase());
        assert!(chars.all(|c| c.is_ascii_lowercase()));
    }
    assert_eq!(tokens[0].len(), 4);
    assert_eq!(tokens[2].len(), 5);
}

/// Scenario: HMAC is repeatable across engine instances and leaves an
/// attached vault untouched.
#[test]
fn scenario_hmac_stateless() {
    let dir = TempDir::new().unwrap();
    let vault = Arc::new(MappingVault::open(&dir.path().join("v.db"), Some("pw")).unwrap());

    let a = Transformer::from_profile(&profile(AnonymizationMode::Hmac, "s1"), Some(vault.clone()));
    let out1 = transform(&a, "alice@x.io", DataType::Email, "email");
    let b = Transformer::from_profile(&profile(AnonymizationMode::Hmac, "s1"), Some(vault.clone()));
    let out2 = transform(&b, "alice@x.io", DataType::Email, "email");

    assert_eq!(out1, out2);
    assert_eq!(vault.statistics().unwrap().total, 0);
    assert!(vault.reverse(&out1, "email", Some("s1")).unwrap().is_none());
}

/// Injectivity: distinct originals in one column never collide while a
/// vault is attached.
#[test]
fn injectivity_under_vault() {
    let dir = TempDir::new().unwrap();
    let vault = Arc::new(MappingVault::open(&dir.path().join("v.db"), Some("pw")).unwrap());
    let t = Transformer::from_profile(&profile(AnonymizationMode::Fake, "s1"), Some(vault));

    // Two-letter tokens squeeze the name pool hard enough that raw
    // candidates collide and the retry path has to fire.
    let originals: Vec<String> = (b'A'..=b'Z')
        .map(|c| format!("{}x Ay", c as char))
        .collect();
    let mut outputs = Vec::new();
    for original in &originals {
        outputs.push(transform(&t, original, DataType::Name, "name"));
    }
    let mut deduped = outputs.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), originals.len(), "outputs must be pairwise distinct");
}

/// Different seeds produce different outputs (spot check).
#[test]
fn seeds_diverge() {
    for mode in [
        AnonymizationMode::Fake,
        AnonymizationMode::Fpe,
        AnonymizationMode::Hmac,
    ] {
        let a = Transformer::from_profile(&profile(mode, "s1"), None);
        let b = Transformer::from_profile(&profile(mode, "s2"), None);
        let va = transform(&a, "John Smith", DataType::Name, "name");
        let vb = transform(&b, "John Smith", DataType::Name, "name");
        if mode == AnonymizationMode::Fpe {
            // The fixed scramble ignores the seed by design; only the
            // vault binding differs per seed.
            assert_eq!(va, vb);
        } else {
            assert_ne!(va, vb, "mode {}", mode);
        }
    }
}
