//! Transformation dispatch: one engine per anonymization mode, a shared
//! vault path, and the collision probe that keeps reversible mappings
//! one-to-one within a column.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::detect::DataType;
use crate::error::Result;
use crate::fake;
use crate::fpe;
use crate::hmac::{HmacEngine, DOMAIN_COLUMN};
use crate::profile::{AnonymizationMode, Profile};
use crate::rng::value_rng;
use crate::shape;
use crate::vault::{MappingVault, RULE_VERSION};

/// Collision retries before accepting a non-unique candidate.
const MAX_COLLISION_ATTEMPTS: u32 = 100;

/// A configured transformation engine.
///
/// Holds no global state: every candidate is generated from a PRNG
/// re-seeded per `(seed, value, attempt)`, so instances bound to the
/// same vault and seed can be sharded by column or row range.
pub struct Transformer {
    mode: AnonymizationMode,
    seed: Option<String>,
    preserve_domain: bool,
    vault: Option<Arc<MappingVault>>,
    hmac: HmacEngine,
    /// Derived engine key, reserved for a cryptographic FPE construction.
    #[allow(dead_code)]
    fpe_key: [u8; 16],
}

impl Transformer {
    /// Build a transformer from a profile, optionally bound to a vault.
    ///
    /// `fully_synthetic` profiles and the HMAC mode never touch a vault,
    /// even when one is supplied.
    pub fn from_profile(profile: &Profile, vault: Option<Arc<MappingVault>>) -> Self {
        let vault = if profile.fully_synthetic || profile.mode == AnonymizationMode::Hmac {
            None
        } else {
            vault
        };
        Self {
            mode: profile.mode,
            seed: profile.seed.clone(),
            preserve_domain: profile.preserve_domain,
            vault,
            hmac: HmacEngine::new(profile.seed.clone(), profile.preserve_domain),
            fpe_key: fpe::derive_key(profile.seed.as_deref()),
        }
    }

    pub fn mode(&self) -> AnonymizationMode {
        self.mode
    }

    /// Anonymize one cell. Null and whitespace-only inputs pass through
    /// verbatim; everything else returns a non-empty string.
    pub fn transform(
        &self,
        value: Option<&str>,
        data_type: DataType,
        column: &str,
    ) -> Result<Option<String>> {
        let Some(raw) = value else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Some(raw.to_string()));
        }
        self.transform_value(trimmed, data_type, column).map(Some)
    }

    fn transform_value(&self, value: &str, data_type: DataType, column: &str) -> Result<String> {
        match self.mode {
            AnonymizationMode::Fake => self.fake_transform(value, data_type, column),
            AnonymizationMode::Fpe => self.fpe_transform(value, data_type, column),
            AnonymizationMode::Hmac => Ok(self.hmac.transform(value, data_type, column)),
            AnonymizationMode::Hybrid => match data_type {
                DataType::NumericId | DataType::CreditCard | DataType::Abn | DataType::Iban => {
                    self.fpe_transform(value, data_type, column)
                }
                _ => self.fake_transform(value, data_type, column),
            },
        }
    }

    fn fake_transform(&self, value: &str, data_type: DataType, column: &str) -> Result<String> {
        self.reversible(value, data_type, column, |attempt| {
            self.fake_candidate(value, data_type, attempt)
        })
    }

    fn fpe_transform(&self, value: &str, data_type: DataType, column: &str) -> Result<String> {
        self.reversible(value, data_type, column, |attempt| {
            self.fpe_candidate(value, data_type, attempt)
        })
    }

    /// Vault-aware generation: lookup, then generate-probe-store with a
    /// bumped attempt counter until the candidate is unique within the
    /// column. Past the retry budget the last candidate is accepted and
    /// the column is marked as weakly unique.
    fn reversible(
        &self,
        value: &str,
        data_type: DataType,
        column: &str,
        generate: impl Fn(u32) -> Result<String>,
    ) -> Result<String> {
        let Some(vault) = &self.vault else {
            return generate(0);
        };
        if let Some(hit) = vault.lookup(value, column, self.seed.as_deref())? {
            return Ok(hit);
        }
        let mut last = String::new();
        for attempt in 0..MAX_COLLISION_ATTEMPTS {
            let candidate = generate(attempt)?;
            if vault.store_unique(
                value,
                &candidate,
                data_type,
                column,
                RULE_VERSION,
                self.seed.as_deref(),
            )? {
                if attempt > 0 {
                    debug!(column, attempt, "collision resolved on retry");
                }
                return Ok(candidate);
            }
            last = candidate;
        }
        warn!(
            column,
            "collision retries exhausted; emitting a non-unique candidate"
        );
        vault.mark_weak_uniqueness(column)?;
        vault.store(
            value,
            &last,
            data_type,
            column,
            RULE_VERSION,
            self.seed.as_deref(),
        )?;
        Ok(last)
    }

    fn fake_candidate(&self, value: &str, data_type: DataType, attempt: u32) -> Result<String> {
        let mut rng = value_rng(self.seed.as_deref(), value, attempt);
        let out = match data_type {
            DataType::Email => match value.split_once('@') {
                Some((local, domain)) => {
                    let fake_local = fake::email_local(local, &mut rng);
                    let fake_domain = if self.preserve_domain {
                        self.anonymize_domain(domain)?
                    } else {
                        fake::domain(domain, &mut rng)
                    };
                    format!("{}@{}", fake_local, fake_domain)
                }
                // Shape mismatch: degrade to the free-text path.
                None => fake::free_text(value, &mut rng),
            },
            DataType::Domain => {
                if self.preserve_domain {
                    self.anonymize_domain(value)?
                } else {
                    fake::domain(value, &mut rng)
                }
            }
            DataType::Phone => match fake::phone(value, &mut rng) {
                Some(out) => out,
                None => fake::free_text(value, &mut rng),
            },
            DataType::Name => fake::name(value, &mut rng),
            DataType::Uuid => fake::uuid_v4(&mut rng),
            DataType::Date => match fake::date(value, &mut rng) {
                Some(out) => out,
                None => fake::free_text(value, &mut rng),
            },
            DataType::NumericId | DataType::Abn => match fake::numeric_id(value, &mut rng) {
                Some(out) => out,
                None => fake::free_text(value, &mut rng),
            },
            DataType::CreditCard => match fake::credit_card(value, &mut rng) {
                Some(out) => out,
                None => fake::free_text(value, &mut rng),
            },
            DataType::Iban => match fake::iban(value, &mut rng) {
                Some(out) => out,
                None => fake::free_text(value, &mut rng),
            },
            DataType::Address => fake::address(&mut rng),
            DataType::FreeText | DataType::Unknown => {
                if shape::looks_like_domain(value) {
                    if self.preserve_domain {
                        self.anonymize_domain(value)?
                    } else {
                        fake::domain(value, &mut rng)
                    }
                } else {
                    fake::free_text(value, &mut rng)
                }
            }
        };
        Ok(out)
    }

    fn fpe_candidate(&self, value: &str, data_type: DataType, attempt: u32) -> Result<String> {
        if attempt > 0 {
            // The scramble is a fixed map, so retries must vary: fall
            // back to shape-preserving substitution from the attempt's
            // own PRNG stream.
            let mut rng = value_rng(self.seed.as_deref(), value, attempt);
            return Ok(fake::substitute_by_class(value, &mut rng));
        }
        let out = match data_type {
            DataType::CreditCard => match fpe::scramble_card(value) {
                Some(out) => out,
                None => fpe::scramble_string(value),
            },
            DataType::NumericId | DataType::Abn | DataType::Phone => {
                match fpe::scramble_numeric(value) {
                    Some(out) => out,
                    None => fpe::scramble_string(value),
                }
            }
            DataType::Email => match value.split_once('@') {
                Some((local, domain)) => {
                    let enc_local = fpe::scramble_string(local);
                    let enc_domain = if self.preserve_domain {
                        self.anonymize_domain(domain)?
                    } else {
                        fpe::scramble_string(domain)
                    };
                    format!("{}@{}", enc_local, enc_domain)
                }
                None => fpe::scramble_string(value),
            },
            DataType::Domain => {
                if self.preserve_domain {
                    self.anonymize_domain(value)?
                } else {
                    fpe::scramble_string(value)
                }
            }
            _ => fpe::scramble_string(value),
        };
        Ok(out)
    }

    /// Stable per-domain mapping used by the fake and FPE paths under
    /// `preserve_domain`: one anonymized domain per distinct original
    /// domain, held in the vault under a reserved column.
    fn anonymize_domain(&self, domain: &str) -> Result<String> {
        let Some(vault) = &self.vault else {
            // Still deterministic: the candidate depends only on
            // (seed, domain), so grouping holds without a vault.
            let mut rng = value_rng(self.seed.as_deref(), domain, 0);
            return Ok(fake::domain(domain, &mut rng));
        };
        if let Some(hit) = vault.lookup(domain, DOMAIN_COLUMN, self.seed.as_deref())? {
            return Ok(hit);
        }
        let mut last = String::new();
        for attempt in 0..MAX_COLLISION_ATTEMPTS {
            let mut rng = value_rng(self.seed.as_deref(), domain, attempt);
            let candidate = fake::domain(domain, &mut rng);
            if vault.store_unique(
                domain,
                &candidate,
                DataType::Domain,
                DOMAIN_COLUMN,
                RULE_VERSION,
                self.seed.as_deref(),
            )? {
                return Ok(candidate);
            }
            last = candidate;
        }
        warn!("domain collision retries exhausted");
        vault.mark_weak_uniqueness(DOMAIN_COLUMN)?;
        vault.store(
            domain,
            &last,
            DataType::Domain,
            DOMAIN_COLUMN,
            RULE_VERSION,
            self.seed.as_deref(),
        )?;
        Ok(last)
    }
}
