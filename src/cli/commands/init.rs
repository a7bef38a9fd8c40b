//! Config file bootstrap command.

use std::path::Path;

use crate::config::{self, Config, ConfigError};

/// Write `config` to `path` (or the OS config location).
///
/// Refuses to replace an existing file unless `force` is set.
pub fn cmd_init_config(config: &Config, path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config::config_path().ok_or(ConfigError::NoConfigDir)?,
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    config::save_to(config, &path)?;
    println!("Wrote {}", path.display());
    println!("Add [[auth.tokens]] entries with the hash from `artist-sync hash-token <token>`.");
    Ok(())
}
