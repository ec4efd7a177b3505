//! Database operations for Crosscast

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DbError, Result};
use crate::platform::PlatformId;
use crate::types::{Post, ShareRecord, ShareStatus};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // An in-memory database exists per connection, so the pool
        // must be capped at one connection or queries may land on a
        // fresh, unmigrated database.
        let (db_url, max_connections) = if db_path == ":memory:" {
            ("sqlite::memory:".to_string(), 1)
        } else {
            // Expand path and create parent directories
            let expanded_path = shellexpand::tilde(db_path).to_string();
            let path = Path::new(&expanded_path);

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }

            // Forward slashes work in SQLite URLs on every platform;
            // mode=rwc creates the file on first use.
            (
                format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/")),
                5,
            )
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Insert a post together with its share rows.
    pub async fn create_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, body, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        for share in &post.shares {
            self.save_share(&post.id, share).await?;
        }

        Ok(())
    }

    /// Insert or update one share row. The update side is monotonic:
    /// remote id, URL, content and publish time only ever COALESCE
    /// toward a value, never back to NULL.
    pub async fn save_share(&self, post_id: &str, share: &ShareRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shares
                (post_id, platform, status, remote_post_id, public_url,
                 shared_content, published_at, error_message)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (post_id, platform) DO UPDATE SET
                status = excluded.status,
                remote_post_id = COALESCE(shares.remote_post_id, excluded.remote_post_id),
                public_url = COALESCE(shares.public_url, excluded.public_url),
                shared_content = COALESCE(shares.shared_content, excluded.shared_content),
                published_at = COALESCE(shares.published_at, excluded.published_at),
                error_message = excluded.error_message
            "#,
        )
        .bind(post_id)
        .bind(share.platform.as_str())
        .bind(share.status.as_str())
        .bind(&share.remote_post_id)
        .bind(&share.public_url)
        .bind(&share.shared_content)
        .bind(share.published_at)
        .bind(&share.error_message)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Get a post by ID, with its shares
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, body, created_at
            FROM posts WHERE id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Post {
            id: row.get("id"),
            title: row.get("title"),
            body: row.get("body"),
            created_at: row.get("created_at"),
            shares: self.get_shares(post_id).await?,
        }))
    }

    /// Get all share rows for a post, in insertion order
    pub async fn get_shares(&self, post_id: &str) -> Result<Vec<ShareRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT platform, status, remote_post_id, public_url,
                   shared_content, published_at, error_message
            FROM shares
            WHERE post_id = ?
            ORDER BY id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(share_from_row).collect()
    }

    /// Find every share that still needs settlement polling: it has a
    /// remote id, no public URL, and has not failed.
    pub async fn find_unresolved(&self) -> Result<Vec<(String, ShareRecord)>> {
        let rows = sqlx::query(
            r#"
            SELECT post_id, platform, status, remote_post_id, public_url,
                   shared_content, published_at, error_message
            FROM shares
            WHERE remote_post_id IS NOT NULL
              AND public_url IS NULL
              AND status != 'failed'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter()
            .map(|row| Ok((row.get("post_id"), share_from_row(row)?)))
            .collect()
    }
}

fn share_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ShareRecord> {
    let platform_str: String = row.get("platform");
    let platform = PlatformId::from_str(&platform_str)
        .map_err(|_| DbError::Corrupt(format!("unknown platform '{}'", platform_str)))?;
    let status_str: String = row.get("status");
    let status = ShareStatus::parse(&status_str)
        .ok_or_else(|| DbError::Corrupt(format!("unknown share status '{}'", status_str)))?;

    Ok(ShareRecord {
        platform,
        status,
        remote_post_id: row.get("remote_post_id"),
        public_url: row.get("public_url"),
        shared_content: row.get("shared_content"),
        published_at: row.get("published_at"),
        error_message: row.get("error_message"),
    })
}
