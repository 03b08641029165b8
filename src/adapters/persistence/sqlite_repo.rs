//! SQLite-backed article index via libsql. Implements ArticleIndexPort.
//!
//! `articles` holds one row per indexed article file; tags and subtags are normalised
//! into their own tables with join tables. All sources share one database file.

use crate::domain::{ArticleRecord, DomainError};
use crate::ports::ArticleIndexPort;
use libsql::params::Params;
use libsql::{Connection, Database, Value, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT,
    path TEXT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_articles_path ON articles (path)",
    r#"
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS subtags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS article_tags (
    article_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (article_id, tag_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS article_subtags (
    article_id INTEGER NOT NULL,
    subtag_id INTEGER NOT NULL,
    PRIMARY KEY (article_id, subtag_id)
)"#,
];

/// Join rows left behind by deleted articles.
const PURGE_ORPHANS: &[&str] = &[
    "DELETE FROM article_tags WHERE article_id NOT IN (SELECT id FROM articles)",
    "DELETE FROM article_subtags WHERE article_id NOT IN (SELECT id FROM articles)",
];

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

/// Article index. One database file (`<name>.db`) in the given base directory.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup; the returned repo is safe to share via Arc.
    ///
    /// Sets WAL mode and synchronous=NORMAL.
    pub async fn connect(base_dir: impl AsRef<Path>, name: &str) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(repo_err)?;
        let db_path = base.join(format!("{}.db", name));
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;

        // PRAGMA returns a row (new value); use query and consume rows (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{} failed: {}", pragma, e)))?;
            while rows.next().await.map_err(repo_err)?.is_some() {}
        }

        for stmt in SCHEMA {
            conn.execute(stmt, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "article index connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        self.db.connect().map_err(repo_err)
    }

    async fn purge_orphans(conn: &Connection) -> Result<(), DomainError> {
        for stmt in PURGE_ORPHANS {
            conn.execute(stmt, ()).await.map_err(repo_err)?;
        }
        Ok(())
    }

    /// Id of `name` in `table` (tags or subtags), inserting it when new.
    async fn name_id(conn: &Connection, table: &str, name: &str) -> Result<i64, DomainError> {
        conn.execute(
            &format!("INSERT INTO {} (name) VALUES (?1) ON CONFLICT (name) DO NOTHING", table),
            params![name],
        )
        .await
        .map_err(repo_err)?;
        let mut rows = conn
            .query(&format!("SELECT id FROM {} WHERE name = ?1", table), params![name])
            .await
            .map_err(repo_err)?;
        let row = rows
            .next()
            .await
            .map_err(repo_err)?
            .ok_or_else(|| DomainError::Repo(format!("{} '{}' vanished after insert", table, name)))?;
        row.get::<i64>(0).map_err(repo_err)
    }

    async fn collect_paths(
        conn: &Connection,
        sql: &str,
        params: Params,
    ) -> Result<Vec<String>, DomainError> {
        let mut rows = conn.query(sql, params).await.map_err(repo_err)?;
        let mut paths = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            if let Ok(path) = row.get::<String>(0) {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[async_trait::async_trait]
impl ArticleIndexPort for SqliteRepo {
    async fn insert(&self, article: &ArticleRecord) -> Result<i64, DomainError> {
        if article.path.trim().is_empty() {
            return Err(DomainError::Repo(format!(
                "article {} has no path",
                article.url
            )));
        }
        let conn = self.conn()?;
        let tx = conn.transaction().await.map_err(repo_err)?;

        let mut rows = tx
            .query(
                "INSERT INTO articles (url, path) VALUES (?1, ?2) RETURNING id",
                params![article.url.as_str(), article.path.as_str()],
            )
            .await
            .map_err(repo_err)?;
        let article_id: i64 = rows
            .next()
            .await
            .map_err(repo_err)?
            .ok_or_else(|| DomainError::Repo("insert returned no id".to_string()))?
            .get(0)
            .map_err(repo_err)?;
        drop(rows);

        for tag in &article.tags {
            let tag_id = Self::name_id(&tx, "tags", tag).await?;
            tx.execute(
                "INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?1, ?2)",
                params![article_id, tag_id],
            )
            .await
            .map_err(repo_err)?;
        }
        for subtag in &article.subtags {
            let subtag_id = Self::name_id(&tx, "subtags", subtag).await?;
            tx.execute(
                "INSERT OR IGNORE INTO article_subtags (article_id, subtag_id) VALUES (?1, ?2)",
                params![article_id, subtag_id],
            )
            .await
            .map_err(repo_err)?;
        }

        tx.commit().await.map_err(repo_err)?;
        debug!(
            path = %article.path,
            article_id,
            tags = article.tags.len(),
            subtags = article.subtags.len(),
            "indexed article"
        );
        Ok(article_id)
    }

    async fn delete_duplicates(&self) -> Result<u64, DomainError> {
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM articles WHERE id NOT IN (SELECT MIN(id) FROM articles GROUP BY path, url)",
                (),
            )
            .await
            .map_err(repo_err)?;
        Self::purge_orphans(&conn).await?;
        info!(removed, "duplicate articles deleted");
        Ok(removed)
    }

    async fn delete_by_date(&self, date: &str) -> Result<u64, DomainError> {
        if date.trim().is_empty() {
            return Err(DomainError::InvalidQuery("date must not be empty".to_string()));
        }
        let conn = self.conn()?;
        let pattern = format!("%{}%", date.trim());
        let removed = conn
            .execute("DELETE FROM articles WHERE path LIKE ?1", params![pattern])
            .await
            .map_err(repo_err)?;
        Self::purge_orphans(&conn).await?;
        info!(removed, date, "articles deleted by date");
        Ok(removed)
    }

    async fn all_paths(&self) -> Result<Vec<String>, DomainError> {
        let conn = self.conn()?;
        Self::collect_paths(
            &conn,
            "SELECT path FROM articles ORDER BY id",
            Params::None,
        )
        .await
    }

    async fn find_paths(
        &self,
        tags: &[String],
        subtags: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let mut sql = String::from("SELECT DISTINCT a.path FROM articles a WHERE a.path IS NOT NULL");
        let mut values: Vec<Value> = Vec::new();

        for tag in tags {
            values.push(Value::Text(tag.clone()));
            sql.push_str(&format!(
                " AND a.id IN (SELECT at.article_id FROM article_tags at \
                 JOIN tags t ON t.id = at.tag_id WHERE t.name = ?{})",
                values.len()
            ));
        }

        if !subtags.is_empty() {
            let mut placeholders = Vec::with_capacity(subtags.len());
            for subtag in subtags {
                values.push(Value::Text(subtag.clone()));
                placeholders.push(format!("?{}", values.len()));
            }
            sql.push_str(&format!(
                " AND a.id IN (SELECT ast.article_id FROM article_subtags ast \
                 JOIN subtags s ON s.id = ast.subtag_id WHERE s.name IN ({}))",
                placeholders.join(", ")
            ));
        }
        sql.push_str(" ORDER BY a.path");

        let conn = self.conn()?;
        Self::collect_paths(&conn, &sql, Params::Positional(values)).await
    }
}
