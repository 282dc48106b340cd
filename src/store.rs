//! SQLite-backed jar storage.
//!
//! Every jar is its own table named after the jar:
//!
//! ```sql
//! CREATE TABLE "<jar>" (id INTEGER PRIMARY KEY NOT NULL, body TEXT)
//! ```
//!
//! Rows are only ever inserted into a freshly created table and whole tables
//! are dropped, so ids run contiguously from 1. [`JarStore::fortune_count`]
//! relies on that: the largest id is the number of fortunes. Introducing
//! per-row deletion would break this and require a `COUNT(*)` instead.

use sqlx::{Row, SqlitePool};

use crate::error::{FortuneError, Result};
use crate::models::Fortune;

/// Thin query layer over the table-per-jar schema.
///
/// Cloning is cheap: the underlying pool is reference counted.
#[derive(Clone)]
pub struct JarStore {
    pool: SqlitePool,
}

/// Quote a jar name for use as an SQLite identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A jar dropped between the existence check and the query reads as missing.
fn jar_query_error(jar: &str, err: sqlx::Error) -> FortuneError {
    let missing_table = matches!(
        &err,
        sqlx::Error::Database(db) if db.message().starts_with("no such table")
    );
    if missing_table {
        FortuneError::JarNotFound(jar.to_string())
    } else {
        FortuneError::Database(err)
    }
}

impl JarStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// All jar names in name order.
    pub async fn list_jars(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    pub async fn jar_exists(&self, jar: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(jar)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn ensure_jar(&self, jar: &str) -> Result<()> {
        if self.jar_exists(jar).await? {
            Ok(())
        } else {
            Err(FortuneError::JarNotFound(jar.to_string()))
        }
    }

    /// Number of fortunes in `jar`, or 0 when the jar does not exist.
    ///
    /// Reads `MAX(id)`; see the module docs for why that equals the row count.
    pub async fn fortune_count(&self, jar: &str) -> Result<i64> {
        if !self.jar_exists(jar).await? {
            return Ok(0);
        }

        let sql = format!("SELECT COALESCE(MAX(id), 0) FROM {}", quote_ident(jar));
        let max_id: Result<i64> = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| jar_query_error(jar, e));
        match max_id {
            Err(FortuneError::JarNotFound(_)) => Ok(0),
            other => other,
        }
    }

    /// `(jar, count)` pairs in the order given.
    pub async fn fortune_counts(&self, jars: &[String]) -> Result<Vec<(String, i64)>> {
        let mut counts = Vec::with_capacity(jars.len());
        for jar in jars {
            counts.push((jar.clone(), self.fortune_count(jar).await?));
        }
        Ok(counts)
    }

    /// Drop `jar` if present, recreate it, and insert `bodies` in order, all in
    /// one transaction. Ids are assigned 1..=N.
    pub async fn replace_jar(&self, jar: &str, bodies: &[String]) -> Result<()> {
        if jar.is_empty() {
            return Err(FortuneError::InvalidJarName(jar.to_string()));
        }

        let table = quote_ident(jar);
        let drop_sql = format!("DROP TABLE IF EXISTS {}", table);
        let create_sql = format!(
            "CREATE TABLE {} (id INTEGER PRIMARY KEY NOT NULL, body TEXT)",
            table
        );
        let insert_sql = format!("INSERT INTO {} (body) VALUES (?)", table);

        let mut tx = self.pool.begin().await?;

        sqlx::query(&drop_sql).execute(&mut *tx).await?;
        sqlx::query(&create_sql).execute(&mut *tx).await?;

        for body in bodies {
            sqlx::query(&insert_sql)
                .bind(body)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Drop `jar`. Dropping a jar that does not exist is a no-op.
    pub async fn delete_jar(&self, jar: &str) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(jar));

        let mut tx = self.pool.begin().await?;
        sqlx::query(&sql).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Fetch a single fortune by its id.
    pub async fn fortune(&self, jar: &str, id: i64) -> Result<Fortune> {
        self.ensure_jar(jar).await?;

        let sql = format!("SELECT id, body FROM {} WHERE id = ?", quote_ident(jar));
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| jar_query_error(jar, e))?;

        match row {
            Some(row) => Ok(Fortune {
                jar: jar.to_string(),
                id: row.get("id"),
                body: row.get::<Option<String>, _>("body").unwrap_or_default(),
            }),
            None => Err(FortuneError::FortuneNotFound {
                jar: jar.to_string(),
                id,
            }),
        }
    }

    /// Every fortune in `jar`, in storage order.
    pub async fn fortunes(&self, jar: &str) -> Result<Vec<Fortune>> {
        self.ensure_jar(jar).await?;

        let sql = format!("SELECT id, body FROM {} ORDER BY id", quote_ident(jar));
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| jar_query_error(jar, e))?;

        Ok(rows
            .iter()
            .map(|row| Fortune {
                jar: jar.to_string(),
                id: row.get("id"),
                body: row.get::<Option<String>, _>("body").unwrap_or_default(),
            })
            .collect())
    }
}
