//! Database operations for the `knowledge_items` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

const KNOWLEDGE_COLUMNS: &str = "id, title, content, category, tags, priority, views, \
     times_used, carrier_rates, is_active, created_at, updated_at";

/// A row from the `knowledge_items` table.
///
/// `carrier_rates` holds the structured carrier-rate sheet (services by
/// zones by price bands) for `carrier-rates` items; other categories leave
/// it null.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KnowledgeItemRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub priority: i32,
    pub views: i64,
    pub times_used: i64,
    pub carrier_rates: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeFilter {
    pub category: Option<String>,
    /// Matches items carrying this tag.
    pub tag: Option<String>,
    /// Case-insensitive substring match over title and content.
    pub query: Option<String>,
    pub limit: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewKnowledgeItem {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub priority: i32,
    pub carrier_rates: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateKnowledgeItem {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub priority: Option<i32>,
    pub carrier_rates: Option<serde_json::Value>,
}

/// Lists active knowledge items matching the filter, sorted by priority
/// then recency.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_knowledge_items(
    pool: &PgPool,
    filter: &KnowledgeFilter,
) -> Result<Vec<KnowledgeItemRow>, DbError> {
    let limit = if filter.limit > 0 {
        filter.limit.min(200)
    } else {
        50
    };

    let sql = format!(
        "SELECT {KNOWLEDGE_COLUMNS} FROM knowledge_items \
         WHERE is_active = TRUE \
           AND ($1::TEXT IS NULL OR category = $1) \
           AND ($2::TEXT IS NULL OR tags @> ARRAY[$2]) \
           AND ($3::TEXT IS NULL OR title ILIKE '%' || $3 || '%' \
                OR content ILIKE '%' || $3 || '%') \
         ORDER BY priority DESC, updated_at DESC \
         LIMIT $4"
    );

    let rows = sqlx::query_as::<_, KnowledgeItemRow>(&sql)
        .bind(filter.category.as_deref())
        .bind(filter.tag.as_deref())
        .bind(filter.query.as_deref())
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetches one active item and increments its view counter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_knowledge_item(
    pool: &PgPool,
    item_id: i64,
) -> Result<Option<KnowledgeItemRow>, DbError> {
    let sql = format!(
        "UPDATE knowledge_items \
         SET views = views + 1 \
         WHERE id = $1 AND is_active = TRUE \
         RETURNING {KNOWLEDGE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, KnowledgeItemRow>(&sql)
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Creates a knowledge item.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_knowledge_item(
    pool: &PgPool,
    new: &NewKnowledgeItem,
) -> Result<KnowledgeItemRow, DbError> {
    let sql = format!(
        "INSERT INTO knowledge_items (title, content, category, tags, priority, carrier_rates) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {KNOWLEDGE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, KnowledgeItemRow>(&sql)
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.category)
        .bind(&new.tags)
        .bind(new.priority)
        .bind(new.carrier_rates.clone())
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Applies a sparse content update. Category is immutable once created.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the item does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_knowledge_item(
    pool: &PgPool,
    item_id: i64,
    update: &UpdateKnowledgeItem,
) -> Result<KnowledgeItemRow, DbError> {
    let sql = format!(
        "UPDATE knowledge_items \
         SET title         = COALESCE($2, title), \
             content       = COALESCE($3, content), \
             tags          = COALESCE($4, tags), \
             priority      = COALESCE($5, priority), \
             carrier_rates = COALESCE($6, carrier_rates), \
             updated_at    = NOW() \
         WHERE id = $1 AND is_active = TRUE \
         RETURNING {KNOWLEDGE_COLUMNS}"
    );
    sqlx::query_as::<_, KnowledgeItemRow>(&sql)
        .bind(item_id)
        .bind(update.title.as_deref())
        .bind(update.content.as_deref())
        .bind(update.tags.as_deref())
        .bind(update.priority)
        .bind(update.carrier_rates.clone())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Increments the times-used counter after the item feeds a script or email.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn record_knowledge_use(pool: &PgPool, item_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE knowledge_items SET times_used = times_used + 1 \
         WHERE id = $1 AND is_active = TRUE",
    )
    .bind(item_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Soft-deletes a knowledge item.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn deactivate_knowledge_item(pool: &PgPool, item_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE knowledge_items SET is_active = FALSE, updated_at = NOW() \
         WHERE id = $1 AND is_active = TRUE",
    )
    .bind(item_id)
    .execute(pool)
    .await?;
    Ok(())
}
