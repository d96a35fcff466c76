//! Persistence of content translations.
//!
//! All translations for every content type live in the single
//! `content_translations` table. A row is unique per
//! (content_type, content_id, content_property, locale); blank translations
//! are never stored, saving one deletes the row instead.

use crate::error::{Result, TranslationError};
use crate::text::escape_like;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use tracing::{debug, info};

/// Ids bound per `IN (...)` list; larger id sets are split into several
/// queries to stay below SQLite's host-parameter limit.
pub const MAX_IDS_PER_QUERY: usize = 500;

/// A stored translation of one property of one object in one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRecord {
    pub id: i64,
    pub content_type: String,
    pub content_id: u32,
    pub content_property: String,
    pub locale: String,
    pub translation: String,
}

/// Result of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The translation was inserted or updated.
    Saved(TranslationRecord),

    /// The translation was blank, so any existing row was removed.
    /// `rows` is 0 when there was nothing to delete.
    Deleted { rows: u64 },
}

/// Property name to translation, for one object in one locale.
pub type PropertyMap = HashMap<String, String>;

/// Database access for the translations table.
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// Translation of one property of one object in one locale.
    async fn find_one(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
        locale: &str,
    ) -> Result<Option<String>>;

    /// Every translated property of one object in one locale.
    async fn find_object(
        &self,
        content_type: &str,
        content_id: u32,
        locale: &str,
    ) -> Result<PropertyMap>;

    /// Every translated property of many objects in one locale, one query per
    /// [`MAX_IDS_PER_QUERY`] ids. Objects without rows are absent from the result.
    async fn find_objects(
        &self,
        content_type: &str,
        content_ids: &[u32],
        locale: &str,
    ) -> Result<HashMap<u32, PropertyMap>>;

    /// All locales in which one property of one object is translated.
    async fn find_grouped_by_locale(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
    ) -> Result<BTreeMap<String, TranslationRecord>>;

    /// One property of many objects in one locale, one query per
    /// [`MAX_IDS_PER_QUERY`] ids.
    async fn find_many(
        &self,
        content_type: &str,
        content_ids: &[u32],
        property: &str,
        locale: &str,
    ) -> Result<HashMap<u32, String>>;

    /// Ids of objects whose translation of any of `properties` contains `search`.
    /// `%` and `_` in `search` match literally.
    async fn search(
        &self,
        content_type: &str,
        properties: &[String],
        search: &str,
    ) -> Result<BTreeSet<u32>>;

    /// Insert or update a translation; a blank translation deletes the row.
    async fn upsert(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
        locale: &str,
        translation: &str,
    ) -> Result<SaveOutcome>;

    /// Number of translated properties of one object in one locale.
    async fn count(&self, content_type: &str, content_id: u32, locale: &str) -> Result<u64>;
}

/// SQLite-backed translation store.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a database from a URL such as `sqlite:content_translations.db`.
    #[tracing::instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| TranslationError::Config(format!("Invalid database URL: {e}")))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        debug!("database pool created");
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds a single connection that never expires, since every
    /// SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the translations table and its indexes if missing.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content_translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL,
                content_id INTEGER NOT NULL CHECK (content_id >= 0),
                content_property TEXT NOT NULL,
                locale TEXT NOT NULL,
                translation TEXT NOT NULL,
                CONSTRAINT content_locale_unique
                    UNIQUE (content_type, content_id, content_property, locale)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS content_translations_content_id_index
             ON content_translations (content_id)",
        )
        .execute(&self.pool)
        .await?;

        info!("content_translations schema is up to date");
        Ok(())
    }

    /// Drop the translations table.
    pub async fn drop_schema(&self) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS content_translations")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_record(row: &SqliteRow) -> Result<TranslationRecord> {
        Ok(TranslationRecord {
            id: row.try_get("id")?,
            content_type: row.try_get("content_type")?,
            content_id: row.try_get("content_id")?,
            content_property: row.try_get("content_property")?,
            locale: row.try_get("locale")?,
            translation: row.try_get("translation")?,
        })
    }
}

#[async_trait]
impl TranslationStore for Database {
    #[tracing::instrument(skip(self))]
    async fn find_one(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
        locale: &str,
    ) -> Result<Option<String>> {
        let translation = sqlx::query_scalar::<_, String>(
            r#"
            SELECT translation FROM content_translations
            WHERE content_type = ? AND content_id = ? AND content_property = ? AND locale = ?
            "#,
        )
        .bind(content_type)
        .bind(content_id)
        .bind(property)
        .bind(locale)
        .fetch_optional(&self.pool)
        .await?;

        Ok(translation)
    }

    #[tracing::instrument(skip(self))]
    async fn find_object(
        &self,
        content_type: &str,
        content_id: u32,
        locale: &str,
    ) -> Result<PropertyMap> {
        let rows = sqlx::query(
            r#"
            SELECT content_property, translation FROM content_translations
            WHERE content_type = ? AND content_id = ? AND locale = ?
            "#,
        )
        .bind(content_type)
        .bind(content_id)
        .bind(locale)
        .fetch_all(&self.pool)
        .await?;

        let mut properties = PropertyMap::with_capacity(rows.len());
        for row in rows {
            properties.insert(row.try_get("content_property")?, row.try_get("translation")?);
        }
        Ok(properties)
    }

    #[tracing::instrument(skip(self, content_ids), fields(ids = content_ids.len()))]
    async fn find_objects(
        &self,
        content_type: &str,
        content_ids: &[u32],
        locale: &str,
    ) -> Result<HashMap<u32, PropertyMap>> {
        let mut objects: HashMap<u32, PropertyMap> = HashMap::new();

        for chunk in content_ids.chunks(MAX_IDS_PER_QUERY) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT content_id, content_property, translation FROM content_translations WHERE content_type = ",
            );
            builder.push_bind(content_type);
            builder.push(" AND locale = ");
            builder.push_bind(locale);
            builder.push(" AND content_id IN (");
            let mut ids = builder.separated(", ");
            for id in chunk {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");

            let rows = builder.build().fetch_all(&self.pool).await?;
            for row in rows {
                let content_id: u32 = row.try_get("content_id")?;
                objects
                    .entry(content_id)
                    .or_default()
                    .insert(row.try_get("content_property")?, row.try_get("translation")?);
            }
        }

        Ok(objects)
    }

    #[tracing::instrument(skip(self))]
    async fn find_grouped_by_locale(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
    ) -> Result<BTreeMap<String, TranslationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content_type, content_id, content_property, locale, translation
            FROM content_translations
            WHERE content_type = ? AND content_id = ? AND content_property = ?
            "#,
        )
        .bind(content_type)
        .bind(content_id)
        .bind(property)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Self::row_to_record(row).map(|record| (record.locale.clone(), record)))
            .collect()
    }

    #[tracing::instrument(skip(self, content_ids), fields(ids = content_ids.len()))]
    async fn find_many(
        &self,
        content_type: &str,
        content_ids: &[u32],
        property: &str,
        locale: &str,
    ) -> Result<HashMap<u32, String>> {
        let mut translations: HashMap<u32, String> = HashMap::new();

        for chunk in content_ids.chunks(MAX_IDS_PER_QUERY) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT content_id, translation FROM content_translations WHERE content_type = ",
            );
            builder.push_bind(content_type);
            builder.push(" AND content_property = ");
            builder.push_bind(property);
            builder.push(" AND locale = ");
            builder.push_bind(locale);
            builder.push(" AND content_id IN (");
            let mut ids = builder.separated(", ");
            for id in chunk {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");

            let rows = builder.build().fetch_all(&self.pool).await?;
            for row in rows {
                translations.insert(row.try_get("content_id")?, row.try_get("translation")?);
            }
        }

        Ok(translations)
    }

    #[tracing::instrument(skip(self))]
    async fn search(
        &self,
        content_type: &str,
        properties: &[String],
        search: &str,
    ) -> Result<BTreeSet<u32>> {
        if properties.is_empty() {
            return Ok(BTreeSet::new());
        }

        let pattern = format!("%{}%", escape_like(search));

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT DISTINCT content_id FROM content_translations WHERE content_type = ",
        );
        builder.push_bind(content_type);
        builder.push(" AND content_property IN (");
        let mut names = builder.separated(", ");
        for property in properties {
            names.push_bind(property.as_str());
        }
        names.push_unseparated(")");
        builder.push(" AND translation LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\'");

        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<u32, _>("content_id").map_err(Into::into))
            .collect()
    }

    #[tracing::instrument(skip(self, translation), fields(len = translation.len()))]
    async fn upsert(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
        locale: &str,
        translation: &str,
    ) -> Result<SaveOutcome> {
        if translation.trim().is_empty() {
            let result = sqlx::query(
                r#"
                DELETE FROM content_translations
                WHERE content_type = ? AND content_id = ? AND content_property = ? AND locale = ?
                "#,
            )
            .bind(content_type)
            .bind(content_id)
            .bind(property)
            .bind(locale)
            .execute(&self.pool)
            .await?;

            let rows = result.rows_affected();
            debug!(rows, "blank translation, removed stored row");
            return Ok(SaveOutcome::Deleted { rows });
        }

        let row = sqlx::query(
            r#"
            INSERT INTO content_translations (content_type, content_id, content_property, locale, translation)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (content_type, content_id, content_property, locale)
            DO UPDATE SET translation = excluded.translation
            RETURNING id, content_type, content_id, content_property, locale, translation
            "#,
        )
        .bind(content_type)
        .bind(content_id)
        .bind(property)
        .bind(locale)
        .bind(translation)
        .fetch_one(&self.pool)
        .await?;

        let record = Self::row_to_record(&row)?;
        debug!(id = record.id, "translation saved");
        Ok(SaveOutcome::Saved(record))
    }

    #[tracing::instrument(skip(self))]
    async fn count(&self, content_type: &str, content_id: u32, locale: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM content_translations
            WHERE content_type = ? AND content_id = ? AND locale = ?
            "#,
        )
        .bind(content_type)
        .bind(content_id)
        .bind(locale)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }
}
