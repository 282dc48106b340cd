//! Regex search over the fortunes in one or more jars.

use anyhow::Result as AnyResult;
use regex::{Regex, RegexBuilder};

use crate::config::Config;
use crate::db;
use crate::error::{FortuneError, Result};
use crate::models::Fortune;
use crate::render;
use crate::store::JarStore;

/// Compile a search pattern. Empty patterns are rejected.
pub fn compile_pattern(pattern: &str, ignore_case: bool) -> Result<Regex> {
    if pattern.is_empty() {
        return Err(FortuneError::EmptyPattern);
    }
    let re = RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()?;
    Ok(re)
}

/// Every fortune in `jar` whose body matches `re`, in storage order.
pub async fn search_jar(store: &JarStore, jar: &str, re: &Regex) -> Result<Vec<Fortune>> {
    let fortunes = store.fortunes(jar).await?;
    Ok(fortunes.into_iter().filter(|f| re.is_match(&f.body)).collect())
}

/// Search `jars` (all jars, in name order, when empty).
pub async fn search_jars(
    store: &JarStore,
    pattern: &str,
    jars: &[String],
    ignore_case: bool,
) -> Result<Vec<Fortune>> {
    let re = compile_pattern(pattern, ignore_case)?;
    let jars = if jars.is_empty() {
        store.list_jars().await?
    } else {
        jars.to_vec()
    };

    let mut hits = Vec::new();
    for jar in &jars {
        hits.extend(search_jar(store, jar, &re).await?);
    }
    Ok(hits)
}

/// CLI entry point for `search`.
pub async fn run_search(
    config: &Config,
    pattern: &str,
    jars: &[String],
    ignore_case: bool,
    show_jar: bool,
) -> AnyResult<()> {
    let store = JarStore::new(db::connect(config).await?);

    let hits = search_jars(&store, pattern, jars, ignore_case).await?;
    for hit in &hits {
        print!("{}", render::format_search_hit(hit, show_jar));
    }

    store.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::temp_store;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_case_sensitivity() {
        let (_tmp, store) = temp_store().await;
        store
            .replace_jar("j", &owned(&["Hello World\n", "goodbye\n"]))
            .await
            .unwrap();

        let exact = search_jars(&store, "hello", &[], false).await.unwrap();
        assert!(exact.is_empty());

        let folded = search_jars(&store, "hello", &[], true).await.unwrap();
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].body, "Hello World\n");

        let cased = search_jars(&store, "Hello", &[], false).await.unwrap();
        assert_eq!(cased.len(), 1);
    }

    #[tokio::test]
    async fn test_searches_all_jars_in_name_order() {
        let (_tmp, store) = temp_store().await;
        store.replace_jar("zeta", &owned(&["cat\n"])).await.unwrap();
        store
            .replace_jar("alpha", &owned(&["cat nap\n", "dog\n"]))
            .await
            .unwrap();

        let hits = search_jars(&store, "cat", &[], false).await.unwrap();
        let jars: Vec<&str> = hits.iter().map(|f| f.jar.as_str()).collect();
        assert_eq!(jars, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_named_jars_only() {
        let (_tmp, store) = temp_store().await;
        store.replace_jar("a", &owned(&["match\n"])).await.unwrap();
        store.replace_jar("b", &owned(&["match\n"])).await.unwrap();

        let hits = search_jars(&store, "match", &owned(&["b"]), false)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].jar, "b");
    }

    #[tokio::test]
    async fn test_bad_input() {
        let (_tmp, store) = temp_store().await;
        store.replace_jar("a", &owned(&["x\n"])).await.unwrap();

        assert!(matches!(
            search_jars(&store, "", &[], false).await,
            Err(FortuneError::EmptyPattern)
        ));
        assert!(matches!(
            search_jars(&store, "(unclosed", &[], false).await,
            Err(FortuneError::InvalidPattern(_))
        ));
        assert!(matches!(
            search_jars(&store, "x", &owned(&["ghost"]), false).await,
            Err(FortuneError::JarNotFound(_))
        ));
    }
}
