//! Command implementations for the cloak CLI.
//!
//! Each submodule contains related command functions.

mod preview;
mod profiles;
mod run;
mod schema;
mod vault;

pub use preview::preview;
pub use profiles::profiles;
pub use run::run;
pub use schema::schema;
pub use vault::{reverse, vault_export_key, vault_stats};

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{resolve_seed, Config};
use crate::output::Output;
use crate::profile::Profile;
use crate::vault::MappingVault;

/// Resolve the effective profile for a command invocation:
/// config/built-in profile, then CLI mode/seed/column overrides on top.
pub(crate) fn effective_profile(
    config: &Config,
    profile_name: Option<&str>,
    mode_override: Option<&str>,
    cli_seed: Option<&str>,
    cli_columns: Option<&[String]>,
) -> Result<Profile> {
    let name = profile_name.unwrap_or_else(|| config.default_profile());
    let mut profile = config.resolve_profile(name)?;
    if let Some(mode) = mode_override {
        profile.mode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    profile.seed = resolve_seed(cli_seed, &profile);
    if let Some(columns) = cli_columns {
        if !columns.is_empty() {
            profile.columns = Some(columns.to_vec());
        }
    }
    Ok(profile)
}

/// Open a vault, prompting for a password when none was given on the
/// command line. An empty password means a fresh random key; it is
/// exported next to the vault so the session stays recoverable.
pub(crate) fn open_vault(
    path: &Path,
    password: Option<&str>,
    out: &Output,
) -> Result<Arc<MappingVault>> {
    let password = match password {
        Some(p) => Some(p.to_string()),
        None => {
            let typed = dialoguer::Password::new()
                .with_prompt("Vault password (empty to generate a random key)")
                .allow_empty_password(true)
                .interact()
                .context("Cannot read vault password")?;
            if typed.is_empty() {
                None
            } else {
                Some(typed)
            }
        }
    };

    let vault = MappingVault::open(path, password.as_deref())
        .with_context(|| format!("Cannot open vault: {}", path.display()))?;

    if password.is_none() {
        let key_path = path.with_extension("key.json");
        vault
            .export_key(&key_path)
            .with_context(|| format!("Cannot export vault key: {}", key_path.display()))?;
        out.warn(&format!(
            "No password given; random key exported to {}. Keep it safe.",
            key_path.display()
        ));
    }

    Ok(Arc::new(vault))
}

/// Mask a seed for display (never echo secrets back in full).
pub(crate) fn masked_seed(seed: Option<&str>) -> String {
    match seed {
        Some(seed) if seed.len() > 10 => format!("{}... (hidden)", &seed[..8]),
        Some(_) => "*** (hidden)".to_string(),
        None => "(none)".to_string(),
    }
}
