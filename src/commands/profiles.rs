//! The `cloak profiles` command: list available profiles.

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::output::Output;
use crate::profile::builtin_profiles;

#[derive(Serialize)]
struct ProfileRow {
    name: String,
    mode: String,
    seeded: bool,
    preserve_domain: bool,
    fully_synthetic: bool,
    referential_integrity: bool,
    source: &'static str,
}

pub fn profiles(config: &Config, out: &Output) -> Result<i32> {
    let mut rows: Vec<ProfileRow> = Vec::new();
    for profile in builtin_profiles() {
        // A same-named [profiles.<name>] section shadows the built-in.
        if config.profiles.contains_key(&profile.name) {
            continue;
        }
        rows.push(ProfileRow {
            name: profile.name.clone(),
            mode: profile.mode.to_string(),
            seeded: profile.seed.is_some(),
            preserve_domain: profile.preserve_domain,
            fully_synthetic: profile.fully_synthetic,
            referential_integrity: profile.referential_integrity,
            source: "built-in",
        });
    }
    for name in config.profiles.keys() {
        let profile = config.resolve_profile(name)?;
        rows.push(ProfileRow {
            name: profile.name.clone(),
            mode: profile.mode.to_string(),
            seeded: profile.seed.is_some(),
            preserve_domain: profile.preserve_domain,
            fully_synthetic: profile.fully_synthetic,
            referential_integrity: profile.referential_integrity,
            source: "cloak.toml",
        });
    }
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    if out.is_json() {
        out.json(&rows)?;
        return Ok(crate::exit_codes::SUCCESS);
    }

    out.data(&format!(
        "{:<24} {:<8} {:<8} {}",
        "name", "mode", "seeded", "source"
    ));
    for row in &rows {
        let mut flags = Vec::new();
        if row.preserve_domain {
            flags.push("preserve_domain");
        }
        if row.fully_synthetic {
            flags.push("fully_synthetic");
        }
        if row.referential_integrity {
            flags.push("referential_integrity");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        };
        out.data(&format!(
            "{:<24} {:<8} {:<8} {}{}",
            row.name,
            row.mode,
            if row.seeded { "yes" } else { "no" },
            row.source,
            flags
        ));
    }
    Ok(crate::exit_codes::SUCCESS)
}
