//! Per-jar fortune counts and their share of the total.
//!
//! Backs `fortune2 info`, `fortune2 random -f`, and `GET /info/`.

use anyhow::Result as AnyResult;

use crate::config::Config;
use crate::db;
use crate::error::{FortuneError, Result};
use crate::models::JarInfo;
use crate::render;
use crate::store::JarStore;

/// Statistics for `jars` (all jars when empty), in the order requested.
///
/// Jars that do not exist count as 0. Percentages are 0 when the total is 0.
pub async fn jars_info(store: &JarStore, jars: &[String]) -> Result<Vec<JarInfo>> {
    let jars = if jars.is_empty() {
        store.list_jars().await?
    } else {
        jars.to_vec()
    };

    let counts = store.fortune_counts(&jars).await?;
    let total: i64 = counts.iter().map(|(_, c)| c).sum();

    Ok(counts
        .into_iter()
        .map(|(jar, count)| JarInfo {
            pct_total: if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            jar,
            num_fortunes: count,
        })
        .collect())
}

/// CLI entry point for `info`.
pub async fn run_info(config: &Config, jars: &[String]) -> AnyResult<()> {
    let store = JarStore::new(db::connect(config).await?);

    println!("fortune db file:  {}", config.db.path.display());
    println!();

    if store.list_jars().await?.is_empty() {
        store.close().await;
        return Err(FortuneError::NoJars.into());
    }

    let infos = jars_info(&store, jars).await?;
    print!("{}", render::format_jar_stats(&infos));

    store.close().await;
    Ok(())
}
