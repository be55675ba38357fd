use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::detect::DataType;
use crate::profile::{builtin_profile, AnonymizationMode, Profile};

/// Main configuration structure loaded from cloak.toml
#[derive(Deserialize, Default, Debug)]
pub struct Config {
    pub defaults: Option<DefaultsConfig>,
    /// Named custom profiles
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
    /// Per-column data type overrides (column name → type)
    #[serde(default)]
    pub types: HashMap<String, String>,
}

#[derive(Deserialize, Debug)]
pub struct DefaultsConfig {
    pub profile: Option<String>,
    pub vault: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProfileConfig {
    pub mode: Option<String>,
    pub seed: Option<String>,
    #[serde(default)]
    pub preserve_domain: bool,
    #[serde(default)]
    pub fully_synthetic: bool,
    #[serde(default)]
    pub referential_integrity: bool,
    pub columns: Option<Vec<String>>,
}

impl Config {
    /// Load config from file, or return default if no config exists.
    /// If an explicit path is provided via --config, it MUST exist.
    /// If no path is provided, check ./cloak.toml (default if not found).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    bail!("Config file not found: {}", p.display());
                }
                p
            }
            None => {
                let default_path = Path::new("cloak.toml");
                if default_path.exists() {
                    default_path
                } else {
                    return Ok(Config::default());
                }
            }
        };

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", config_path.display(), e))?;

        Ok(config)
    }

    /// Name of the profile used when none is given on the command line.
    pub fn default_profile(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.profile.as_deref())
            .unwrap_or("default")
    }

    /// Configured vault path, if any.
    pub fn vault_path(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.vault.as_deref())
    }

    /// Resolve a profile by name: a `[profiles.<name>]` section takes
    /// precedence over the built-in registry.
    pub fn resolve_profile(&self, name: &str) -> Result<Profile> {
        if let Some(pc) = self.profiles.get(name) {
            let mode: AnonymizationMode = match &pc.mode {
                Some(m) => m.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                None => AnonymizationMode::Hybrid,
            };
            let mut profile = Profile::new(name, mode);
            profile.seed = pc.seed.clone();
            profile.preserve_domain = pc.preserve_domain;
            profile.fully_synthetic = pc.fully_synthetic;
            profile.referential_integrity = pc.referential_integrity;
            profile.columns = pc.columns.clone();
            profile.type_overrides = self.type_overrides()?;
            return Ok(profile);
        }
        match builtin_profile(name) {
            Some(mut profile) => {
                profile.type_overrides = self.type_overrides()?;
                Ok(profile)
            }
            None => bail!(
                "Unknown profile \"{}\". Built-ins: default, gdpr_compliant, test_data, fast_hash, referential_integrity",
                name
            ),
        }
    }

    /// Parse the `[types]` section into column → DataType overrides.
    pub fn type_overrides(&self) -> Result<HashMap<String, DataType>> {
        let mut out = HashMap::new();
        for (column, type_name) in &self.types {
            let dt: DataType = type_name
                .parse()
                .map_err(|e: String| anyhow::anyhow!("[types] {}: {}", column, e))?;
            out.insert(column.clone(), dt);
        }
        Ok(out)
    }
}

/// Resolve the session seed: CLI > CLOAK_SEED env > profile.
pub fn resolve_seed(cli_seed: Option<&str>, profile: &Profile) -> Option<String> {
    if let Some(seed) = cli_seed {
        return Some(seed.to_string());
    }
    if let Ok(seed) = std::env::var("CLOAK_SEED") {
        return Some(seed);
    }
    profile.seed.clone()
}
