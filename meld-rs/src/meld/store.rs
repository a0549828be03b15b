//! Meld persistence
//!
//! Stores are keyed by template identifier and only ever get/upsert. A miss is
//! `Ok(None)`, never an error.

use crate::error::{MeldError, Result};
use crate::meld::types::{Meld, MeldKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait]
pub trait MeldStore: Send + Sync {
    /// Fetch the meld cached for `identifier`
    async fn get(&self, identifier: &str) -> Result<Option<Meld>>;

    /// Insert or overwrite the meld keyed by its identifier
    async fn upsert(&self, meld: Meld) -> Result<Meld>;

    /// All cached melds ordered by identifier
    async fn list(&self) -> Result<Vec<Meld>>;
}

/// Melds persisted in SQLite
pub struct SqliteMeldStore {
    db: SqlitePool,
}

impl SqliteMeldStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Connect to `database_url` and make sure the table exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = SqlitePool::connect(database_url).await?;
        let store = Self::new(db);
        store.init_db().await?;
        Ok(store)
    }

    /// Initialize the melds table
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS email_melds (
                identifier TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    fn row_to_meld(row: SqliteRow) -> Result<Meld> {
        let kind_str: String = row.try_get("kind")?;
        let kind = MeldKind::from_db_string(&kind_str)
            .ok_or_else(|| MeldError::Parse(format!("Invalid meld kind: {}", kind_str)))?;

        let updated_at_str: String = row.try_get("updated_at")?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map_err(|e| MeldError::Parse(format!("Invalid updated_at date: {}", e)))?
            .with_timezone(&Utc);

        Ok(Meld {
            identifier: row.try_get("identifier")?,
            kind,
            subject: row.try_get("subject")?,
            body: row.try_get("body")?,
            updated_at,
        })
    }
}

#[async_trait]
impl MeldStore for SqliteMeldStore {
    async fn get(&self, identifier: &str) -> Result<Option<Meld>> {
        let row = sqlx::query(
            r#"
            SELECT identifier, kind, subject, body, updated_at
            FROM email_melds
            WHERE identifier = ?
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?;

        row.map(Self::row_to_meld).transpose()
    }

    async fn upsert(&self, meld: Meld) -> Result<Meld> {
        sqlx::query(
            r#"
            INSERT INTO email_melds (identifier, kind, subject, body, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(identifier) DO UPDATE SET
                kind = excluded.kind,
                subject = excluded.subject,
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&meld.identifier)
        .bind(meld.kind.to_db_string())
        .bind(&meld.subject)
        .bind(&meld.body)
        .bind(meld.updated_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(meld)
    }

    async fn list(&self) -> Result<Vec<Meld>> {
        let rows = sqlx::query(
            r#"
            SELECT identifier, kind, subject, body, updated_at
            FROM email_melds
            ORDER BY identifier
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Self::row_to_meld).collect()
    }
}

/// Melds held in process memory
#[derive(Default, Clone)]
pub struct MemoryMeldStore {
    melds: Arc<RwLock<HashMap<String, Meld>>>,
}

impl MemoryMeldStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeldStore for MemoryMeldStore {
    async fn get(&self, identifier: &str) -> Result<Option<Meld>> {
        Ok(self.melds.read().await.get(identifier).cloned())
    }

    async fn upsert(&self, meld: Meld) -> Result<Meld> {
        self.melds
            .write()
            .await
            .insert(meld.identifier.clone(), meld.clone());
        Ok(meld)
    }

    async fn list(&self) -> Result<Vec<Meld>> {
        let mut melds: Vec<Meld> = self.melds.read().await.values().cloned().collect();
        melds.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(melds)
    }
}
