//! Anonymization profiles: mode, seed, and behavior flags bundled under
//! a name. Profiles are immutable for a session once selected.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detect::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnonymizationMode {
    /// Synthetic generators with per-type format preservation.
    Fake,
    /// Deterministic format-preserving scramble.
    Fpe,
    /// Keyed one-way hashing; never reversible.
    Hmac,
    /// FPE for numeric types, fake for everything else.
    Hybrid,
}

impl fmt::Display for AnonymizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnonymizationMode::Fake => "fake",
            AnonymizationMode::Fpe => "fpe",
            AnonymizationMode::Hmac => "hmac",
            AnonymizationMode::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

impl FromStr for AnonymizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fake" => Ok(AnonymizationMode::Fake),
            "fpe" => Ok(AnonymizationMode::Fpe),
            "hmac" => Ok(AnonymizationMode::Hmac),
            "hybrid" => Ok(AnonymizationMode::Hybrid),
            other => Err(format!(
                "unknown mode \"{}\" (expected fake, fpe, hmac, or hybrid)",
                other
            )),
        }
    }
}

/// Whether outputs under this mode can be mapped back through a vault.
impl AnonymizationMode {
    pub fn reversible(self) -> bool {
        self != AnonymizationMode::Hmac
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub mode: AnonymizationMode,
    /// Drives every PRNG and key derivation; absent means non-repeatable
    /// fake output is acceptable.
    pub seed: Option<String>,
    /// Anonymize each distinct email/domain once, so grouping survives.
    pub preserve_domain: bool,
    /// Never consult or write a vault; outputs stay deterministic under
    /// the seed but are not reversible.
    pub fully_synthetic: bool,
    /// Same `(column, original)` across files and sessions yields the
    /// same output; requires a shared seed and shared vault.
    pub referential_integrity: bool,
    /// Restrict processing to these columns (all columns when `None`).
    pub columns: Option<Vec<String>>,
    /// Per-column type overrides applied before detection.
    pub type_overrides: HashMap<String, DataType>,
}

impl Profile {
    pub fn new(name: &str, mode: AnonymizationMode) -> Self {
        Self {
            name: name.to_string(),
            mode,
            seed: None,
            preserve_domain: false,
            fully_synthetic: false,
            referential_integrity: false,
            columns: None,
            type_overrides: HashMap::new(),
        }
    }

    pub fn with_seed(mut self, seed: &str) -> Self {
        self.seed = Some(seed.to_string());
        self
    }
}

/// The built-in profile registry.
pub fn builtin_profiles() -> Vec<Profile> {
    let mut gdpr = Profile::new("gdpr_compliant", AnonymizationMode::Fpe);
    gdpr.fully_synthetic = false; // mappings are stored for reversibility

    let mut test_data = Profile::new("test_data", AnonymizationMode::Fake).with_seed("test_seed_123");
    test_data.fully_synthetic = true;

    let mut referential =
        Profile::new("referential_integrity", AnonymizationMode::Hybrid).with_seed("consistent_seed");
    referential.referential_integrity = true;

    vec![
        Profile::new("default", AnonymizationMode::Hybrid),
        gdpr,
        test_data,
        Profile::new("fast_hash", AnonymizationMode::Hmac),
        referential,
    ]
}

/// Look up a built-in profile by name.
pub fn builtin_profile(name: &str) -> Option<Profile> {
    builtin_profiles().into_iter().find(|p| p.name == name)
}
