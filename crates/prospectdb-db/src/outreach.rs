//! Database operations for call scripts and email templates.
//!
//! Both tables store a body with declared placeholder variables; rendering
//! happens in `prospectdb-core::template` and only counter updates land
//! back here. Rates are derived from the raw counters at the API layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

const SCRIPT_COLUMNS: &str = "id, name, category, target_industry, target_size, body, \
     variables, times_used, success_count, is_active, created_at, updated_at";

const TEMPLATE_COLUMNS: &str = "id, name, subject, body, category, variables, sent_count, \
     open_count, click_count, reply_count, is_active, created_at, updated_at";

/// A row from the `call_scripts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CallScriptRow {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub target_industry: Option<String>,
    pub target_size: Option<String>,
    pub body: String,
    pub variables: Vec<String>,
    pub times_used: i64,
    pub success_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `email_templates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmailTemplateRow {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub category: Option<String>,
    pub variables: Vec<String>,
    pub sent_count: i64,
    pub open_count: i64,
    pub click_count: i64,
    pub reply_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCallScript {
    pub name: String,
    pub category: Option<String>,
    pub target_industry: Option<String>,
    pub target_size: Option<String>,
    pub body: String,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewEmailTemplate {
    pub name: String,
    pub subject: String,
    pub body: String,
    pub category: Option<String>,
    pub variables: Vec<String>,
}

/// Which post-send counter to bump for an email template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOutcome {
    Opened,
    Clicked,
    Replied,
}

impl TemplateOutcome {
    fn column(self) -> &'static str {
        match self {
            TemplateOutcome::Opened => "open_count",
            TemplateOutcome::Clicked => "click_count",
            TemplateOutcome::Replied => "reply_count",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "opened" => Some(TemplateOutcome::Opened),
            "clicked" => Some(TemplateOutcome::Clicked),
            "replied" => Some(TemplateOutcome::Replied),
            _ => None,
        }
    }
}

/// Lists active call scripts, optionally filtered by category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_call_scripts(
    pool: &PgPool,
    category: Option<&str>,
) -> Result<Vec<CallScriptRow>, DbError> {
    let sql = format!(
        "SELECT {SCRIPT_COLUMNS} FROM call_scripts \
         WHERE is_active = TRUE AND ($1::TEXT IS NULL OR category = $1) \
         ORDER BY times_used DESC, name"
    );
    let rows = sqlx::query_as::<_, CallScriptRow>(&sql)
        .bind(category)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_call_script(
    pool: &PgPool,
    script_id: i64,
) -> Result<Option<CallScriptRow>, DbError> {
    let sql = format!(
        "SELECT {SCRIPT_COLUMNS} FROM call_scripts WHERE id = $1 AND is_active = TRUE"
    );
    let row = sqlx::query_as::<_, CallScriptRow>(&sql)
        .bind(script_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_call_script(
    pool: &PgPool,
    new: &NewCallScript,
) -> Result<CallScriptRow, DbError> {
    let sql = format!(
        "INSERT INTO call_scripts (name, category, target_industry, target_size, body, variables) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {SCRIPT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, CallScriptRow>(&sql)
        .bind(&new.name)
        .bind(new.category.as_deref())
        .bind(new.target_industry.as_deref())
        .bind(new.target_size.as_deref())
        .bind(&new.body)
        .bind(&new.variables)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Records one use of a call script, optionally counting it as a success.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the script does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn record_script_use(
    pool: &PgPool,
    script_id: i64,
    success: bool,
) -> Result<CallScriptRow, DbError> {
    let sql = format!(
        "UPDATE call_scripts \
         SET times_used = times_used + 1, \
             success_count = success_count + CASE WHEN $2 THEN 1 ELSE 0 END, \
             updated_at = NOW() \
         WHERE id = $1 AND is_active = TRUE \
         RETURNING {SCRIPT_COLUMNS}"
    );
    sqlx::query_as::<_, CallScriptRow>(&sql)
        .bind(script_id)
        .bind(success)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Lists active email templates, optionally filtered by category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_email_templates(
    pool: &PgPool,
    category: Option<&str>,
) -> Result<Vec<EmailTemplateRow>, DbError> {
    let sql = format!(
        "SELECT {TEMPLATE_COLUMNS} FROM email_templates \
         WHERE is_active = TRUE AND ($1::TEXT IS NULL OR category = $1) \
         ORDER BY sent_count DESC, name"
    );
    let rows = sqlx::query_as::<_, EmailTemplateRow>(&sql)
        .bind(category)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_email_template(
    pool: &PgPool,
    template_id: i64,
) -> Result<Option<EmailTemplateRow>, DbError> {
    let sql = format!(
        "SELECT {TEMPLATE_COLUMNS} FROM email_templates WHERE id = $1 AND is_active = TRUE"
    );
    let row = sqlx::query_as::<_, EmailTemplateRow>(&sql)
        .bind(template_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_email_template(
    pool: &PgPool,
    new: &NewEmailTemplate,
) -> Result<EmailTemplateRow, DbError> {
    let sql = format!(
        "INSERT INTO email_templates (name, subject, body, category, variables) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {TEMPLATE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, EmailTemplateRow>(&sql)
        .bind(&new.name)
        .bind(&new.subject)
        .bind(&new.body)
        .bind(new.category.as_deref())
        .bind(&new.variables)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Records a post-send outcome for a template. A render counts as a send
/// (`outcome = None`); opens/clicks/replies bump their counter only.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the template does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn record_template_outcome(
    pool: &PgPool,
    template_id: i64,
    outcome: Option<TemplateOutcome>,
) -> Result<EmailTemplateRow, DbError> {
    let sql = match outcome {
        None => format!(
            "UPDATE email_templates \
             SET sent_count = sent_count + 1, updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING {TEMPLATE_COLUMNS}"
        ),
        Some(o) => format!(
            "UPDATE email_templates \
             SET {} = {} + 1, updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING {TEMPLATE_COLUMNS}",
            o.column(),
            o.column()
        ),
    };
    sqlx::query_as::<_, EmailTemplateRow>(&sql)
        .bind(template_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_columns_are_bare_identifiers() {
        for outcome in [
            TemplateOutcome::Opened,
            TemplateOutcome::Clicked,
            TemplateOutcome::Replied,
        ] {
            assert!(outcome
                .column()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn outcome_parse_accepts_known_values_only() {
        assert_eq!(TemplateOutcome::parse("opened"), Some(TemplateOutcome::Opened));
        assert_eq!(TemplateOutcome::parse("clicked"), Some(TemplateOutcome::Clicked));
        assert_eq!(TemplateOutcome::parse("replied"), Some(TemplateOutcome::Replied));
        assert_eq!(TemplateOutcome::parse("bounced"), None);
    }
}
