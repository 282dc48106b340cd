//! Random fortune selection.
//!
//! A draw happens in two steps. First a jar is picked from the candidates,
//! either uniformly or weighted by how many fortunes each jar holds. Then one
//! fortune is picked uniformly from that jar by drawing an id in
//! `[1, count]`.
//!
//! Randomness comes from the operating system ([`OsRng`]) on every call. The
//! selection functions take any [`RngCore`] so they can be driven directly in
//! tests.

use anyhow::Result as AnyResult;
use rand_core::{OsRng, RngCore};

use crate::config::Config;
use crate::db;
use crate::error::{FortuneError, Result};
use crate::info;
use crate::models::Fortune;
use crate::render::{self, OutputFormat};
use crate::store::JarStore;

/// How a jar is chosen among the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Probability proportional to the jar's fortune count.
    #[default]
    Weighted,
    /// Every candidate jar is equally likely.
    Uniform,
}

/// Uniform integer in `[0, n)` without modulo bias. `n` must be non-zero.
pub fn uniform_below<R: RngCore>(rng: &mut R, n: u64) -> u64 {
    debug_assert!(n > 0);
    // 2^64 mod n; values below it would over-represent the low residues.
    let threshold = n.wrapping_neg() % n;
    loop {
        let v = rng.next_u64();
        if v >= threshold {
            return v % n;
        }
    }
}

/// Pick one jar with equal probability. `None` when `jars` is empty.
pub fn pick_uniform<'a, R: RngCore>(rng: &mut R, jars: &'a [String]) -> Option<&'a str> {
    if jars.is_empty() {
        return None;
    }
    let i = uniform_below(rng, jars.len() as u64) as usize;
    Some(jars[i].as_str())
}

/// Pick one jar with probability proportional to its count.
///
/// Draws `n` in `[0, total)` and returns the first jar whose cumulative count
/// exceeds `n`. `None` when the total is zero.
pub fn pick_weighted<'a, R: RngCore>(rng: &mut R, counts: &'a [(String, i64)]) -> Option<&'a str> {
    let total: u64 = counts.iter().map(|(_, c)| (*c).max(0) as u64).sum();
    if total == 0 {
        return None;
    }

    let pick = uniform_below(rng, total);
    let mut running = 0u64;
    for (jar, count) in counts {
        running += (*count).max(0) as u64;
        if pick < running {
            return Some(jar.as_str());
        }
    }
    None
}

/// Choose a jar from `candidates` (all jars when empty).
///
/// In weighted mode, when every candidate is missing or empty the choice
/// falls back to a uniform pick over all existing jars.
pub async fn choose_jar<R: RngCore>(
    store: &JarStore,
    candidates: &[String],
    mode: SelectionMode,
    rng: &mut R,
) -> Result<String> {
    let jars = if candidates.is_empty() {
        store.list_jars().await?
    } else {
        candidates.to_vec()
    };

    if mode == SelectionMode::Weighted {
        let counts = store.fortune_counts(&jars).await?;
        if let Some(jar) = pick_weighted(rng, &counts) {
            return Ok(jar.to_string());
        }

        tracing::debug!(?jars, "candidate jars are empty, choosing among all jars");
        let all = store.list_jars().await?;
        return pick_uniform(rng, &all)
            .map(str::to_string)
            .ok_or(FortuneError::NoJars);
    }

    pick_uniform(rng, &jars)
        .map(str::to_string)
        .ok_or(FortuneError::NoJars)
}

/// Draw one fortune uniformly from `jar`.
pub async fn draw_fortune<R: RngCore>(store: &JarStore, jar: &str, rng: &mut R) -> Result<Fortune> {
    if !store.jar_exists(jar).await? {
        return Err(FortuneError::JarNotFound(jar.to_string()));
    }

    let count = store.fortune_count(jar).await?;
    if count <= 0 {
        return Err(FortuneError::EmptyJar(jar.to_string()));
    }

    let id = uniform_below(rng, count as u64) as i64 + 1;
    store.fortune(jar, id).await
}

/// Choose a jar, then a fortune from it, using OS randomness.
pub async fn random_fortune(
    store: &JarStore,
    candidates: &[String],
    mode: SelectionMode,
) -> Result<Fortune> {
    let mut rng = OsRng;
    let jar = choose_jar(store, candidates, mode, &mut rng).await?;
    draw_fortune(store, &jar, &mut rng).await
}

/// CLI entry point for `random`.
///
/// With `list_only`, prints the statistics for the jars a draw would
/// consider instead of drawing.
pub async fn run_random(
    config: &Config,
    jars: &[String],
    mode: SelectionMode,
    show_jar: bool,
    list_only: bool,
) -> AnyResult<()> {
    let store = JarStore::new(db::connect(config).await?);

    if store.list_jars().await?.is_empty() {
        store.close().await;
        return Err(FortuneError::NoJars.into());
    }

    if list_only {
        let infos = info::jars_info(&store, jars).await?;
        print!("{}", render::format_jar_stats(&infos));
        store.close().await;
        return Ok(());
    }

    let fortune = random_fortune(&store, jars, mode).await?;
    print!(
        "{}",
        render::render_fortune(&fortune, OutputFormat::Plain, show_jar)
    );

    store.close().await;
    Ok(())
}
