//! Catalog lookup command.

use tokio::runtime::Runtime;

use crate::catalog::{CatalogMatcher, SpotifyClient};
use crate::config::Config;
use crate::error::ResultExt;
use crate::sync::{ArtistMatcher, Confidence};

/// Run the match engine for one name and print what it found
pub fn cmd_match(rt: &Runtime, config: &Config, name: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let client = SpotifyClient::new(&config.catalog)?;
        let matcher = CatalogMatcher::new(client, config.matching.thresholds())?;

        println!("Searching catalog for: {}", name);
        let result = matcher
            .match_artist(name)
            .await
            .with_context(format!("matching {:?}", name))?;

        match result.candidate {
            Some(candidate) => {
                println!();
                println!("  Name:       {}", candidate.name);
                println!("  ID:         {}", candidate.id);
                println!("  URL:        {}", candidate.url);
                if let Some(ref image) = candidate.image_url {
                    println!("  Image:      {}", image);
                }
                println!("  Followers:  {}", candidate.followers);
                println!("  Popularity: {}", candidate.popularity);
                println!("  Similarity: {:.0}%", result.similarity * 100.0);
                println!("  Confidence: {}", result.confidence);
                if result.confidence == Confidence::Medium {
                    println!();
                    println!("Medium confidence: a sync would flag this for review.");
                }
            }
            None => println!("No confident match found."),
        }

        Ok(())
    })
}
