//! Database operations for the `prospects` table and its interaction log.
//!
//! The qualification score is never written directly by handlers: every
//! mutation that touches contact data, business info, size, or interactions
//! ends with [`refresh_score`], so the stored score always agrees with its
//! inputs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use prospectdb_core::prospect::{BusinessEstimates, CompanySize};
use prospectdb_core::scoring::{recompute_score, ScoreInputs};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

const PROSPECT_COLUMNS: &str = "id, public_id, company_name, website, industry, size, \
     contact_name, contact_role, contact_email, contact_phone, monthly_shipments, \
     average_order_value, estimated_shipping_costs, main_destinations, \
     estimated_monthly_revenue, conversion_rate, monthly_orders, estimated_monthly_visits, \
     is_ecommerce, platform, analysis_date, analysis_data, status, score, notes, tags, \
     source, is_active, last_contact_date, next_follow_up, created_at, updated_at";

/// A row from the `prospects` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProspectRow {
    pub id: i64,
    pub public_id: Uuid,
    pub company_name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: String,
    pub contact_name: Option<String>,
    pub contact_role: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub monthly_shipments: Option<i64>,
    pub average_order_value: Option<Decimal>,
    pub estimated_shipping_costs: Option<i64>,
    pub main_destinations: Vec<String>,
    pub estimated_monthly_revenue: Option<i64>,
    pub conversion_rate: Option<f64>,
    pub monthly_orders: Option<i64>,
    pub estimated_monthly_visits: Option<i64>,
    pub is_ecommerce: Option<bool>,
    pub platform: Option<String>,
    pub analysis_date: Option<DateTime<Utc>>,
    pub analysis_data: Option<serde_json::Value>,
    pub status: String,
    pub score: i32,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub is_active: bool,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub next_follow_up: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `interactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InteractionRow {
    pub id: i64,
    pub prospect_id: i64,
    pub kind: String,
    pub occurred_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub next_action: Option<String>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewProspect {
    pub company_name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub contact_name: Option<String>,
    pub contact_role: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub source: Option<String>,
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct UpdateProspect {
    pub company_name: Option<String>,
    pub website: Option<Option<String>>,
    pub industry: Option<Option<String>>,
    pub size: Option<String>,
    pub contact_name: Option<Option<String>>,
    pub contact_role: Option<Option<String>>,
    pub contact_email: Option<Option<String>>,
    pub contact_phone: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub kind: String,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub next_action: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProspectSort {
    #[default]
    Score,
    CreatedAt,
    LastContactDate,
    CompanyName,
}

impl ProspectSort {
    fn column(self) -> &'static str {
        match self {
            ProspectSort::Score => "score",
            ProspectSort::CreatedAt => "created_at",
            ProspectSort::LastContactDate => "last_contact_date",
            ProspectSort::CompanyName => "company_name",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "score" => Some(ProspectSort::Score),
            "created_at" => Some(ProspectSort::CreatedAt),
            "last_contact_date" => Some(ProspectSort::LastContactDate),
            "company_name" => Some(ProspectSort::CompanyName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProspectFilter {
    pub status: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub min_score: Option<i32>,
    pub max_score: Option<i32>,
    pub page: i64,
    pub limit: i64,
    pub sort: ProspectSort,
    pub order: SortOrder,
}

#[derive(Debug, Clone)]
pub struct ProspectPage {
    pub items: Vec<ProspectRow>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ---------------------------------------------------------------------------
// Score refresh
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct ScoreInputRow {
    has_email: bool,
    has_phone: bool,
    has_shipments: bool,
    has_website: bool,
    size: String,
    positive_interactions: i64,
    negative_interactions: i64,
}

/// Recomputes the qualification score from the stored row and interaction
/// counts, writes it back, and returns it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the prospect does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn refresh_score(conn: &mut PgConnection, prospect_id: i64) -> Result<i32, DbError> {
    let inputs = sqlx::query_as::<_, ScoreInputRow>(
        "SELECT \
            (contact_email IS NOT NULL AND contact_email <> '') AS has_email, \
            (contact_phone IS NOT NULL AND contact_phone <> '') AS has_phone, \
            (monthly_shipments IS NOT NULL AND monthly_shipments > 0) AS has_shipments, \
            (website IS NOT NULL AND website <> '') AS has_website, \
            size, \
            (SELECT COUNT(*) FROM interactions i \
              WHERE i.prospect_id = p.id AND i.outcome = 'positive') AS positive_interactions, \
            (SELECT COUNT(*) FROM interactions i \
              WHERE i.prospect_id = p.id AND i.outcome = 'negative') AS negative_interactions \
         FROM prospects p \
         WHERE p.id = $1",
    )
    .bind(prospect_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(DbError::NotFound)?;

    let score = recompute_score(&ScoreInputs {
        has_email: inputs.has_email,
        has_phone: inputs.has_phone,
        has_monthly_shipments: inputs.has_shipments,
        has_website: inputs.has_website,
        size: CompanySize::parse(&inputs.size),
        positive_interactions: inputs.positive_interactions,
        negative_interactions: inputs.negative_interactions,
    });

    sqlx::query("UPDATE prospects SET score = $2, updated_at = NOW() WHERE id = $1")
        .bind(prospect_id)
        .bind(score)
        .execute(&mut *conn)
        .await?;

    Ok(score)
}

async fn fetch_prospect(conn: &mut PgConnection, prospect_id: i64) -> Result<ProspectRow, DbError> {
    let sql = format!("SELECT {PROSPECT_COLUMNS} FROM prospects WHERE id = $1");
    sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(prospect_id)
        .fetch_optional(conn)
        .await?
        .ok_or(DbError::NotFound)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns one page of active prospects matching the filter, plus the total
/// match count for pagination.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_prospects(pool: &PgPool, filter: &ProspectFilter) -> Result<ProspectPage, DbError> {
    let limit = filter.limit.clamp(1, 200);
    let page = filter.page.max(1);
    let offset = (page - 1) * limit;

    let where_clause = "WHERE is_active = TRUE \
           AND ($1::TEXT IS NULL OR status = $1) \
           AND ($2::TEXT IS NULL OR industry ILIKE '%' || $2 || '%') \
           AND ($3::TEXT IS NULL OR size = $3) \
           AND ($4::INT IS NULL OR score >= $4) \
           AND ($5::INT IS NULL OR score <= $5)";

    let sql = format!(
        "SELECT {PROSPECT_COLUMNS} FROM prospects {where_clause} \
         ORDER BY {} {} NULLS LAST LIMIT $6 OFFSET $7",
        filter.sort.column(),
        filter.order.keyword(),
    );

    let items = sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(filter.status.as_deref())
        .bind(filter.industry.as_deref())
        .bind(filter.size.as_deref())
        .bind(filter.min_score)
        .bind(filter.max_score)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM prospects {where_clause}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(filter.status.as_deref())
        .bind(filter.industry.as_deref())
        .bind(filter.size.as_deref())
        .bind(filter.min_score)
        .bind(filter.max_score)
        .fetch_one(pool)
        .await?;

    Ok(ProspectPage {
        items,
        total,
        page,
        limit,
    })
}

/// Returns a single active prospect, or `None` if absent or deactivated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_prospect(pool: &PgPool, prospect_id: i64) -> Result<Option<ProspectRow>, DbError> {
    let sql = format!(
        "SELECT {PROSPECT_COLUMNS} FROM prospects WHERE id = $1 AND is_active = TRUE"
    );
    let row = sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(prospect_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Creates a prospect from an explicit creation call and computes its
/// initial score.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails (including the unique
/// violation when the website is already taken).
pub async fn create_prospect(pool: &PgPool, new: &NewProspect) -> Result<ProspectRow, DbError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO prospects \
           (company_name, website, industry, size, contact_name, contact_role, \
            contact_email, contact_phone, notes, tags, source) \
         VALUES ($1, $2, $3, COALESCE($4, 'medium'), $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {PROSPECT_COLUMNS}"
    );
    let mut row = sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(&new.company_name)
        .bind(new.website.as_deref())
        .bind(new.industry.as_deref())
        .bind(new.size.as_deref())
        .bind(new.contact_name.as_deref())
        .bind(new.contact_role.as_deref())
        .bind(new.contact_email.as_deref())
        .bind(new.contact_phone.as_deref())
        .bind(new.notes.as_deref())
        .bind(&new.tags)
        .bind(new.source.as_deref())
        .fetch_one(&mut *tx)
        .await?;

    row.score = refresh_score(&mut tx, row.id).await?;
    tx.commit().await?;
    Ok(row)
}

/// Applies a sparse update to an existing prospect and recomputes its score.
///
/// All `Option` fields overlay the existing row: `Some(v)` sets the value,
/// `None` preserves it; nullable columns use the double-`Option` pattern.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the prospect does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_prospect(
    pool: &PgPool,
    prospect_id: i64,
    update: &UpdateProspect,
) -> Result<ProspectRow, DbError> {
    let mut tx = pool.begin().await?;

    // For nullable columns, a bool flag signals "was supplied"; the value
    // itself may be NULL to clear the column.
    let website_supplied = update.website.is_some();
    let website_val = update.website.clone().flatten();
    let industry_supplied = update.industry.is_some();
    let industry_val = update.industry.clone().flatten();
    let contact_name_supplied = update.contact_name.is_some();
    let contact_name_val = update.contact_name.clone().flatten();
    let contact_role_supplied = update.contact_role.is_some();
    let contact_role_val = update.contact_role.clone().flatten();
    let contact_email_supplied = update.contact_email.is_some();
    let contact_email_val = update.contact_email.clone().flatten();
    let contact_phone_supplied = update.contact_phone.is_some();
    let contact_phone_val = update.contact_phone.clone().flatten();
    let notes_supplied = update.notes.is_some();
    let notes_val = update.notes.clone().flatten();

    let sql = format!(
        "UPDATE prospects \
         SET company_name  = COALESCE($2, company_name), \
             size          = COALESCE($3, size), \
             website       = CASE WHEN $4::BOOL THEN $5 ELSE website END, \
             industry      = CASE WHEN $6::BOOL THEN $7 ELSE industry END, \
             contact_name  = CASE WHEN $8::BOOL THEN $9 ELSE contact_name END, \
             contact_role  = CASE WHEN $10::BOOL THEN $11 ELSE contact_role END, \
             contact_email = CASE WHEN $12::BOOL THEN $13 ELSE contact_email END, \
             contact_phone = CASE WHEN $14::BOOL THEN $15 ELSE contact_phone END, \
             notes         = CASE WHEN $16::BOOL THEN $17 ELSE notes END, \
             tags          = COALESCE($18, tags), \
             updated_at    = NOW() \
         WHERE id = $1 AND is_active = TRUE \
         RETURNING {PROSPECT_COLUMNS}"
    );

    let mut row = sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(prospect_id)
        .bind(update.company_name.as_deref())
        .bind(update.size.as_deref())
        .bind(website_supplied)
        .bind(website_val)
        .bind(industry_supplied)
        .bind(industry_val)
        .bind(contact_name_supplied)
        .bind(contact_name_val)
        .bind(contact_role_supplied)
        .bind(contact_role_val)
        .bind(contact_email_supplied)
        .bind(contact_email_val)
        .bind(contact_phone_supplied)
        .bind(contact_phone_val)
        .bind(notes_supplied)
        .bind(notes_val)
        .bind(update.tags.as_deref())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

    row.score = refresh_score(&mut tx, row.id).await?;
    tx.commit().await?;
    Ok(row)
}

/// Sets the lifecycle status. Transitions are caller-driven; only the value
/// itself is validated (at the API layer).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the prospect does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn set_status(
    pool: &PgPool,
    prospect_id: i64,
    status: &str,
) -> Result<ProspectRow, DbError> {
    let sql = format!(
        "UPDATE prospects \
         SET status = $2, last_contact_date = NOW(), updated_at = NOW() \
         WHERE id = $1 AND is_active = TRUE \
         RETURNING {PROSPECT_COLUMNS}"
    );
    sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(prospect_id)
        .bind(status)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Appends an interaction, bumps `last_contact_date`, and recomputes the
/// score. Returns the updated prospect.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the prospect does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn add_interaction(
    pool: &PgPool,
    prospect_id: i64,
    interaction: &NewInteraction,
) -> Result<ProspectRow, DbError> {
    let mut tx = pool.begin().await?;

    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM prospects WHERE id = $1 AND is_active = TRUE")
            .bind(prospect_id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Err(DbError::NotFound);
    }

    sqlx::query(
        "INSERT INTO interactions (prospect_id, kind, notes, outcome, next_action, author) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(prospect_id)
    .bind(&interaction.kind)
    .bind(interaction.notes.as_deref())
    .bind(interaction.outcome.as_deref())
    .bind(interaction.next_action.as_deref())
    .bind(interaction.author.as_deref())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE prospects SET last_contact_date = NOW(), updated_at = NOW() WHERE id = $1",
    )
    .bind(prospect_id)
    .execute(&mut *tx)
    .await?;

    refresh_score(&mut tx, prospect_id).await?;
    let row = fetch_prospect(&mut tx, prospect_id).await?;
    tx.commit().await?;
    Ok(row)
}

/// Returns the interaction log for a prospect, most recent first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_interactions(
    pool: &PgPool,
    prospect_id: i64,
) -> Result<Vec<InteractionRow>, DbError> {
    let rows = sqlx::query_as::<_, InteractionRow>(
        "SELECT id, prospect_id, kind, occurred_at, notes, outcome, next_action, author, \
                created_at \
         FROM interactions \
         WHERE prospect_id = $1 \
         ORDER BY occurred_at DESC, id DESC",
    )
    .bind(prospect_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Soft-deletes a prospect by clearing `is_active`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn deactivate_prospect(pool: &PgPool, prospect_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE prospects SET is_active = FALSE, updated_at = NOW() \
         WHERE id = $1 AND is_active = TRUE",
    )
    .bind(prospect_id)
    .execute(pool)
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Upsert from analysis
// ---------------------------------------------------------------------------

pub(crate) fn analysis_summary(estimates: &BusinessEstimates) -> String {
    format!(
        "Automated traffic analysis: ~{} visits/month, ~{} estimated shipments/month",
        estimates.estimated_monthly_visits, estimates.monthly_shipments
    )
}

/// Finds or creates the prospect for `domain` and merges in fresh analysis
/// results.
///
/// The insert races safely against concurrent analyses of the same website:
/// the unique index on `website` turns the loser into an update. On update,
/// business-estimate columns are overwritten and the website analysis is
/// replaced wholesale; identity, contact, and status columns survive. One
/// synthetic follow-up interaction is appended either way, and the score is
/// recomputed, all in a single transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on any query failure. Callers running the
/// analysis pipeline are expected to treat that as non-fatal (degrade to a
/// stub reference) so the traffic report still reaches the client.
pub async fn upsert_from_analysis(
    pool: &PgPool,
    domain: &str,
    site_name: Option<&str>,
    estimates: &BusinessEstimates,
    analysis: serde_json::Value,
) -> Result<ProspectRow, DbError> {
    let mut tx = pool.begin().await?;

    let company_name = site_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(domain);

    let sql = format!(
        "INSERT INTO prospects \
           (company_name, website, industry, size, status, \
            monthly_shipments, average_order_value, estimated_shipping_costs, \
            main_destinations, estimated_monthly_revenue, conversion_rate, monthly_orders, \
            estimated_monthly_visits, is_ecommerce, platform, analysis_date, analysis_data, \
            last_contact_date) \
         VALUES ($1, $2, 'E-commerce', $3, 'new', \
                 $4, $5, $6, $7, $8, $9, $10, $11, TRUE, 'unknown', NOW(), $12, NOW()) \
         ON CONFLICT (website) WHERE website IS NOT NULL DO UPDATE SET \
             monthly_shipments         = EXCLUDED.monthly_shipments, \
             average_order_value       = EXCLUDED.average_order_value, \
             estimated_shipping_costs  = EXCLUDED.estimated_shipping_costs, \
             main_destinations         = EXCLUDED.main_destinations, \
             estimated_monthly_revenue = EXCLUDED.estimated_monthly_revenue, \
             conversion_rate           = EXCLUDED.conversion_rate, \
             monthly_orders            = EXCLUDED.monthly_orders, \
             estimated_monthly_visits  = EXCLUDED.estimated_monthly_visits, \
             is_ecommerce              = EXCLUDED.is_ecommerce, \
             platform                  = EXCLUDED.platform, \
             analysis_date             = EXCLUDED.analysis_date, \
             analysis_data             = EXCLUDED.analysis_data, \
             last_contact_date         = NOW(), \
             updated_at                = NOW() \
         RETURNING {PROSPECT_COLUMNS}"
    );

    let row = sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(company_name)
        .bind(domain)
        .bind(estimates.company_size.as_str())
        .bind(estimates.monthly_shipments)
        .bind(Decimal::from(estimates.average_order_value))
        .bind(estimates.estimated_shipping_costs)
        .bind(&estimates.main_destinations)
        .bind(estimates.estimated_monthly_revenue)
        .bind(estimates.conversion_rate_pct)
        .bind(estimates.monthly_orders)
        .bind(estimates.estimated_monthly_visits)
        .bind(analysis)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO interactions (prospect_id, kind, notes, outcome, author) \
         VALUES ($1, 'follow-up', $2, 'positive', 'automated system')",
    )
    .bind(row.id)
    .bind(analysis_summary(estimates))
    .execute(&mut *tx)
    .await?;

    refresh_score(&mut tx, row.id).await?;
    let row = fetch_prospect(&mut tx, row.id).await?;
    tx.commit().await?;
    Ok(row)
}

// ---------------------------------------------------------------------------
// Dashboard stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
    pub avg_score: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentContact {
    pub id: i64,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub status: String,
    pub score: i32,
}

#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub total_prospects: i64,
    pub high_score_prospects: i64,
    pub status_breakdown: Vec<StatusCount>,
    pub recent_contacts: Vec<RecentContact>,
}

/// Score at or above which a prospect counts as "high score" on the
/// dashboard.
const HIGH_SCORE_THRESHOLD: i32 = 80;

/// Aggregates for the BDR dashboard: totals, per-status breakdown, and the
/// five most recently contacted prospects.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn dashboard_stats(pool: &PgPool) -> Result<DashboardStats, DbError> {
    let total_prospects: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM prospects WHERE is_active = TRUE")
            .fetch_one(pool)
            .await?;

    let high_score_prospects: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM prospects WHERE is_active = TRUE AND score >= $1",
    )
    .bind(HIGH_SCORE_THRESHOLD)
    .fetch_one(pool)
    .await?;

    let status_breakdown = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count, AVG(score)::FLOAT8 AS avg_score \
         FROM prospects \
         WHERE is_active = TRUE \
         GROUP BY status \
         ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    let recent_contacts = sqlx::query_as::<_, RecentContact>(
        "SELECT id, company_name, contact_name, last_contact_date, status, score \
         FROM prospects \
         WHERE is_active = TRUE AND last_contact_date IS NOT NULL \
         ORDER BY last_contact_date DESC \
         LIMIT 5",
    )
    .fetch_all(pool)
    .await?;

    Ok(DashboardStats {
        total_prospects,
        high_score_prospects,
        status_breakdown,
        recent_contacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimates() -> BusinessEstimates {
        BusinessEstimates {
            monthly_orders: 400,
            monthly_shipments: 420,
            estimated_shipping_costs: 1_470,
            estimated_monthly_revenue: 30_000,
            average_order_value: 75,
            conversion_rate_pct: 2.0,
            estimated_monthly_visits: 20_000,
            main_destinations: vec!["Italy".to_owned()],
            company_size: CompanySize::Medium,
        }
    }

    #[test]
    fn analysis_summary_names_visits_and_shipments() {
        let summary = analysis_summary(&estimates());
        assert!(summary.contains("20000 visits/month"));
        assert!(summary.contains("420 estimated shipments/month"));
    }

    #[test]
    fn sort_columns_map_to_known_identifiers() {
        for sort in [
            ProspectSort::Score,
            ProspectSort::CreatedAt,
            ProspectSort::LastContactDate,
            ProspectSort::CompanyName,
        ] {
            // Sort columns are interpolated into SQL; they must never carry
            // anything but a bare identifier.
            assert!(sort.column().chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            assert_eq!(ProspectSort::parse(sort.column()), Some(sort));
        }
        assert_eq!(ProspectSort::parse("; DROP TABLE prospects"), None);
    }

    #[test]
    fn sort_order_defaults_to_descending() {
        assert_eq!(SortOrder::default().keyword(), "DESC");
        assert_eq!(ProspectSort::default(), ProspectSort::Score);
    }
}
