//! Vault round trips: reversibility, idempotent upserts, referential
//! integrity across sessions, and at-rest confidentiality.

use std::fs;
use std::sync::Arc;

use cloak::detect::DataType;
use cloak::engine::Transformer;
use cloak::profile::{AnonymizationMode, Profile};
use cloak::vault::{MappingVault, RULE_VERSION};
use tempfile::TempDir;

fn profile(mode: AnonymizationMode, seed: &str) -> Profile {
    Profile::new("test", mode).with_seed(seed)
}

fn transform(t: &Transformer, value: &str, data_type: DataType, column: &str) -> String {
    t.transform(Some(value), data_type, column)
        .unwrap()
        .unwrap()
}

/// Reversibility: everything a reversible engine emits can be mapped
/// back through the vault.
#[test]
fn reverse_round_trip() {
    let dir = TempDir::new().unwrap();
    let vault = Arc::new(MappingVault::open(&dir.path().join("v.db"), Some("pw")).unwrap());
    let t = Transformer::from_profile(&profile(AnonymizationMode::Fake, "s1"), Some(vault.clone()));

    let cases = [
        ("john.smith@acme.com", DataType::Email, "email"),
        ("John Q Smith", DataType::Name, "name"),
        ("2021-04-01", DataType::Date, "joined"),
    ];
    for (value, data_type, column) in cases {
        let anonymized = transform(&t, value, data_type, column);
        let original = vault.reverse(&anonymized, column, Some("s1")).unwrap();
        assert_eq!(original.as_deref(), Some(value), "column {}", column);
    }
}

/// Scenario: a phone anonymized under HYBRID reverses to the original.
#[test]
fn scenario_hybrid_phone_reverse() {
    let dir = TempDir::new().unwrap();
    let vault = Arc::new(MappingVault::open(&dir.path().join("v.db"), Some("pw")).unwrap());
    let t =
        Transformer::from_profile(&profile(AnonymizationMode::Hybrid, "s1"), Some(vault.clone()));

    let anonymized = transform(&t, "+61-421-555-829", DataType::Phone, "phone");
    assert_ne!(anonymized, "+61-421-555-829");
    let original = vault.reverse(&anonymized, "phone", Some("s1")).unwrap();
    assert_eq!(original.as_deref(), Some("+61-421-555-829"));
}

/// Idempotent upsert: the second store for the same fingerprint wins.
#[test]
fn upsert_last_write_wins() {
    let dir = TempDir::new().unwrap();
    let vault = MappingVault::open(&dir.path().join("v.db"), Some("pw")).unwrap();
    vault
        .store("v", "a1", DataType::Name, "c", RULE_VERSION, Some("s"))
        .unwrap();
    vault
        .store("v", "a2", DataType::Name, "c", RULE_VERSION, Some("s"))
        .unwrap();
    assert_eq!(
        vault.lookup("v", "c", Some("s")).unwrap().as_deref(),
        Some("a2")
    );
    assert_eq!(vault.statistics().unwrap().total, 1);
}

/// Referential integrity: two sessions sharing seed and vault give the
/// same anonymized value for the same `(column, original)`.
#[test]
fn referential_integrity_across_sessions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("v.db");

    let first = {
        let vault = Arc::new(MappingVault::open(&path, Some("pw")).unwrap());
        let t =
            Transformer::from_profile(&profile(AnonymizationMode::Hybrid, "s1"), Some(vault));
        transform(&t, "customer-42@acme.com", DataType::Email, "email")
    };

    // A brand-new session against the reopened vault.
    let second = {
        let vault = Arc::new(MappingVault::open(&path, Some("pw")).unwrap());
        let t =
            Transformer::from_profile(&profile(AnonymizationMode::Hybrid, "s1"), Some(vault));
        transform(&t, "customer-42@acme.com", DataType::Email, "email")
    };

    assert_eq!(first, second);
}

/// Confidentiality: the vault file never contains a legible original or
/// anonymized value.
#[test]
fn vault_file_contains_no_plaintext() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("v.db");
    let originals = [
        "salary-secret-123456",
        "margaret.thompson@corporate-internal.example",
        "+61-421-555-829",
    ];
    let mut outputs = Vec::new();
    {
        let vault = Arc::new(MappingVault::open(&path, Some("pw")).unwrap());
        let t = Transformer::from_profile(
            &profile(AnonymizationMode::Fake, "s1"),
            Some(vault),
        );
        outputs.push(transform(&t, originals[0], DataType::FreeText, "notes"));
        outputs.push(transform(&t, originals[1], DataType::Email, "email"));
        outputs.push(transform(&t, originals[2], DataType::Phone, "phone"));
    }

    let raw = fs::read(&path).unwrap();
    let haystack = String::from_utf8_lossy(&raw);
    let mut needles: Vec<String> = originals.iter().map(|s| s.to_string()).collect();
    needles.extend(outputs);
    for needle in needles.iter().filter(|n| n.len() >= 8) {
        assert!(
            !haystack.contains(needle.as_str()),
            "vault leaked plaintext {:?}",
            needle
        );
    }
}

/// A wrong key degrades lookups to misses; it never errors the cell loop.
#[test]
fn wrong_key_yields_none() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("v.db");
    {
        let vault = MappingVault::open(&path, Some("right")).unwrap();
        vault
            .store("v", "a", DataType::Name, "c", RULE_VERSION, None)
            .unwrap();
    }
    let vault = MappingVault::open(&path, Some("wrong")).unwrap();
    assert!(vault.lookup("v", "c", None).unwrap().is_none());
    assert!(vault.reverse("a", "c", None).unwrap().is_none());
    assert!(!vault.check_collision("a", "other", "c", None).unwrap());
}

/// Key export/import restores access for a random-key vault.
#[test]
fn key_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("v.db");
    let key_path = dir.path().join("vault.key.json");
    let anonymized = {
        let vault = Arc::new(MappingVault::open(&path, None).unwrap());
        vault.export_key(&key_path).unwrap();
        let t = Transformer::from_profile(
            &profile(AnonymizationMode::Fake, "s1"),
            Some(vault),
        );
        transform(&t, "John Smith", DataType::Name, "name")
    };

    let vault = MappingVault::open(&path, None).unwrap();
    assert!(vault.reverse(&anonymized, "name", Some("s1")).unwrap().is_none());
    vault.load_key(&key_path).unwrap();
    assert_eq!(
        vault.reverse(&anonymized, "name", Some("s1")).unwrap().as_deref(),
        Some("John Smith")
    );
}
