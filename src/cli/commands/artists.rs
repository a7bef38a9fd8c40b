//! Local artist record commands.

use std::path::Path;
use tokio::runtime::Runtime;

use super::open_db;
use crate::config::Config;
use crate::db;
use crate::error::ResultExt;

/// Insert artists given on the command line and/or read from a file
pub fn cmd_add(
    rt: &Runtime,
    config: &Config,
    names: &[String],
    from_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut all: Vec<String> = names
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if let Some(path) = from_file {
        let text = std::fs::read_to_string(path)
            .with_context(format!("reading {}", path.display()))?;
        all.extend(parse_artist_list(&text));
    }

    if all.is_empty() {
        anyhow::bail!("No artist names given");
    }

    rt.block_on(async {
        let pool = open_db(config).await?;
        for name in &all {
            let id = db::insert_artist(&pool, name, None)
                .await
                .with_context(format!("adding {:?}", name))?;
            println!("Added {} ({})", name, id);
        }
        println!("\n{} artists added.", all.len());
        Ok(())
    })
}

/// List artist records with their sync state
pub fn cmd_list(rt: &Runtime, config: &Config, unsynced_only: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(config).await?;
        let artists = if unsynced_only {
            db::list_unsynced_artists(&pool).await?
        } else {
            db::list_artists(&pool).await?
        };

        let synced = artists.iter().filter(|a| a.is_synced()).count();
        for artist in &artists {
            match artist.catalog_id.as_deref().filter(|_| artist.is_synced()) {
                Some(catalog_id) => println!("  ✓ {} [{}]", artist.name, catalog_id),
                None => println!("  · {}", artist.name),
            }
        }
        println!();
        println!("{} artists, {} synced", artists.len(), synced);
        Ok(())
    })
}

/// One name per line; blank lines and `#` comments are ignored.
fn parse_artist_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
