use async_trait::async_trait;
use jiff::Timestamp;
use linkhop_core::store::{LinkStore, ReadLinkStore, Result};
use linkhop_core::{
    Link, LinkId, LinkPatch, NewLink, OwnerId, ShortCode, StorageError, TargetUrl, Title,
    Visibility,
};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::collections::BTreeSet;
use tracing::trace;

const SCHEMA: &str = include_str!("../ddl/mysql/links.sql");

macro_rules! select_links {
    ($tail:literal) => {
        concat!(
            "SELECT id, code, title, target_url, owner_id, visibility, tags, created_at, updated_at ",
            "FROM links ",
            $tail
        )
    };
}

/// MySQL implementation of the link store.
///
/// Code uniqueness is enforced by the `uk_links_code` unique index; a
/// duplicate insert surfaces as [`StorageError::CodeTaken`]. Deletes remove
/// the row, so a deleted code can be claimed again. Timestamps are stored as
/// unix microseconds.
#[derive(Debug, Clone)]
pub struct MySqlLinkStore {
    pool: MySqlPool,
}

impl MySqlLinkStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `links` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

/// Current time truncated to the stored precision, so a returned link equals
/// the row read back later.
fn now_micros() -> Timestamp {
    let now = Timestamp::now();
    Timestamp::from_microsecond(now.as_microsecond()).unwrap_or(now)
}

fn parse_timestamp(column: &str, micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid {} timestamp '{}': {e}", column, micros))
    })
}

fn encode_tags(tags: &BTreeSet<String>) -> Result<String> {
    serde_json::to_string(tags)
        .map_err(|e| StorageError::InvalidData(format!("cannot encode tags: {e}")))
}

fn link_from_row(row: &MySqlRow) -> Result<Link> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let code: String = row.try_get("code").map_err(map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(map_sqlx_error)?;
    let target_url: String = row.try_get("target_url").map_err(map_sqlx_error)?;
    let owner_id: String = row.try_get("owner_id").map_err(map_sqlx_error)?;
    let visibility: String = row.try_get("visibility").map_err(map_sqlx_error)?;
    let tags: String = row.try_get("tags").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(map_sqlx_error)?;

    let invalid = |e: linkhop_core::CoreError| StorageError::InvalidData(e.to_string());

    Ok(Link {
        id: LinkId::new(id),
        code: ShortCode::new_unchecked(code),
        title: Title::new(title).map_err(invalid)?,
        target_url: TargetUrl::parse(target_url).map_err(invalid)?,
        owner_id: OwnerId::new(owner_id).map_err(invalid)?,
        visibility: visibility
            .parse::<Visibility>()
            .map_err(StorageError::InvalidData)?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| StorageError::InvalidData(format!("invalid tags '{}': {e}", tags)))?,
        created_at: parse_timestamp("created_at", created_at)?,
        updated_at: parse_timestamp("updated_at", updated_at)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadLinkStore for MySqlLinkStore {
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<Link>> {
        trace!(code = %code, "selecting link by code");

        let row = sqlx::query(select_links!("WHERE code = ? LIMIT 1"))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn get_by_owner(&self, owner: &OwnerId) -> Result<Vec<Link>> {
        trace!(owner = %owner, "selecting links by owner");

        let rows = sqlx::query(select_links!(
            "WHERE owner_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }
}

#[async_trait]
impl LinkStore for MySqlLinkStore {
    async fn create(&self, link: NewLink) -> Result<Link> {
        let now = now_micros();
        let tags = encode_tags(&link.tags)?;

        let result = sqlx::query(
            r#"
            INSERT INTO links (code, title, target_url, owner_id, visibility, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.code.as_str())
        .bind(link.title.as_str())
        .bind(link.target_url.as_str())
        .bind(link.owner_id.as_str())
        .bind(link.visibility.as_str())
        .bind(tags)
        .bind(now.as_microsecond())
        .bind(now.as_microsecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(link.into_link(LinkId::new(done.last_insert_id()), now)),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::CodeTaken(link.code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn update(&self, id: LinkId, owner: &OwnerId, patch: LinkPatch) -> Result<Link> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(select_links!("WHERE id = ? FOR UPDATE"))
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        // Dropping `tx` on an early return rolls back and releases the row lock.
        let Some(row) = row else {
            return Err(StorageError::NotFound);
        };
        let mut link = link_from_row(&row)?;
        if link.owner_id != *owner {
            return Err(StorageError::Forbidden);
        }

        patch.apply(&mut link, now_micros());

        sqlx::query(
            r#"
            UPDATE links
            SET title = ?, target_url = ?, visibility = ?, tags = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(link.title.as_str())
        .bind(link.target_url.as_str())
        .bind(link.visibility.as_str())
        .bind(encode_tags(&link.tags)?)
        .bind(link.updated_at.as_microsecond())
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(link)
    }

    async fn delete(&self, id: LinkId, owner: &OwnerId) -> Result<Link> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(select_links!("WHERE id = ? FOR UPDATE"))
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound);
        };
        let link = link_from_row(&row)?;
        if link.owner_id != *owner {
            return Err(StorageError::Forbidden);
        }

        sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(link)
    }
}
