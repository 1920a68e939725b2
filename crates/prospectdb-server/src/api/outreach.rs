//! Call-script and email-template handlers, including typed rendering
//! against prospect data.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prospectdb_core::template::{render_template as render_body, TemplateError};
use prospectdb_db::{
    CallScriptRow, EmailTemplateRow, NewCallScript, NewEmailTemplate, ProspectRow,
    TemplateOutcome,
};

use super::{map_db_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct CallScriptBody {
    id: i64,
    name: String,
    category: Option<String>,
    target_industry: Option<String>,
    target_size: Option<String>,
    body: String,
    variables: Vec<String>,
    times_used: i64,
    success_rate: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CallScriptRow> for CallScriptBody {
    fn from(row: CallScriptRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            target_industry: row.target_industry,
            target_size: row.target_size,
            body: row.body,
            variables: row.variables,
            times_used: row.times_used,
            success_rate: rate(row.success_count, row.times_used),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct EmailTemplateBody {
    id: i64,
    name: String,
    subject: String,
    body: String,
    category: Option<String>,
    variables: Vec<String>,
    sent_count: i64,
    open_rate: Option<f64>,
    click_rate: Option<f64>,
    reply_rate: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EmailTemplateRow> for EmailTemplateBody {
    fn from(row: EmailTemplateRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            subject: row.subject,
            body: row.body,
            category: row.category,
            variables: row.variables,
            sent_count: row.sent_count,
            open_rate: rate(row.open_count, row.sent_count),
            click_rate: rate(row.click_count, row.sent_count),
            reply_rate: rate(row.reply_count, row.sent_count),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Percentage of `part` over `whole`, or `None` before any use.
#[allow(clippy::cast_precision_loss)]
fn rate(part: i64, whole: i64) -> Option<f64> {
    if whole <= 0 {
        return None;
    }
    Some((part as f64 / whole as f64 * 1000.0).round() / 10.0)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Substitution values a prospect contributes to a template rendering.
fn prospect_template_values(row: &ProspectRow) -> HashMap<String, String> {
    let mut values = HashMap::new();
    values.insert("company_name".to_owned(), row.company_name.clone());
    values.insert("size".to_owned(), row.size.clone());
    if let Some(ref name) = row.contact_name {
        values.insert("contact_name".to_owned(), name.clone());
    }
    if let Some(ref industry) = row.industry {
        values.insert("industry".to_owned(), industry.clone());
    }
    if let Some(ref website) = row.website {
        values.insert("website".to_owned(), website.clone());
    }
    if let Some(shipments) = row.monthly_shipments {
        values.insert("monthly_shipments".to_owned(), shipments.to_string());
    }
    if let Some(orders) = row.monthly_orders {
        values.insert("monthly_orders".to_owned(), orders.to_string());
    }
    if let Some(revenue) = row.estimated_monthly_revenue {
        values.insert("monthly_revenue".to_owned(), revenue.to_string());
    }
    if !row.main_destinations.is_empty() {
        values.insert(
            "main_destinations".to_owned(),
            row.main_destinations.join(", "),
        );
    }
    values
}

fn map_template_error(e: &TemplateError) -> ApiError {
    match e {
        TemplateError::Undeclared { name } => ApiError::bad_request(format!(
            "template references undeclared placeholder \"{name}\""
        )),
        TemplateError::MissingValue { name } => ApiError::bad_request(format!(
            "no value available for placeholder \"{name}\"; supply it via extraVariables"
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct RenderRequest {
    prospect_id: i64,
    #[serde(default)]
    extra_variables: HashMap<String, String>,
}

async fn render_values(
    state: &AppState,
    prospect_id: i64,
    extra: HashMap<String, String>,
) -> Result<HashMap<String, String>, ApiError> {
    let prospect = prospectdb_db::get_prospect(&state.pool, prospect_id)
        .await
        .map_err(|e| map_db_error("prospect", &e))?
        .ok_or_else(|| ApiError::not_found("prospect not found"))?;

    let mut values = prospect_template_values(&prospect);
    // Caller-supplied values win over derived ones.
    values.extend(extra);
    Ok(values)
}

// ---------------------------------------------------------------------------
// Call scripts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct CategoryQuery {
    category: Option<String>,
}

/// GET /api/v1/scripts
pub(in crate::api) async fn list_scripts(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ApiResponse<Vec<CallScriptBody>>>, ApiError> {
    let rows = prospectdb_db::list_call_scripts(&state.pool, query.category.as_deref())
        .await
        .map_err(|e| map_db_error("call scripts", &e))?;
    Ok(ApiResponse::ok(
        rows.into_iter().map(CallScriptBody::from).collect(),
    ))
}

/// GET /api/v1/scripts/:id
pub(in crate::api) async fn get_script(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CallScriptBody>>, ApiError> {
    let row = prospectdb_db::get_call_script(&state.pool, id)
        .await
        .map_err(|e| map_db_error("call script", &e))?
        .ok_or_else(|| ApiError::not_found("call script not found"))?;
    Ok(ApiResponse::ok(row.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct CreateScriptRequest {
    name: String,
    category: Option<String>,
    target_industry: Option<String>,
    target_size: Option<String>,
    body: String,
    #[serde(default)]
    variables: Vec<String>,
}

/// POST /api/v1/scripts
pub(in crate::api) async fn create_script(
    State(state): State<AppState>,
    Json(body): Json<CreateScriptRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CallScriptBody>>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if body.body.trim().is_empty() {
        return Err(ApiError::bad_request("body must not be empty"));
    }

    let new = NewCallScript {
        name: body.name.trim().to_owned(),
        category: body.category,
        target_industry: body.target_industry,
        target_size: body.target_size,
        body: body.body,
        variables: body.variables,
    };
    let row = prospectdb_db::create_call_script(&state.pool, &new)
        .await
        .map_err(|e| map_db_error("call script", &e))?;
    Ok((StatusCode::CREATED, ApiResponse::ok(row.into())))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct RenderedScript {
    script_id: i64,
    rendered: String,
}

/// POST /api/v1/scripts/:id/render
pub(in crate::api) async fn render_script(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RenderRequest>,
) -> Result<Json<ApiResponse<RenderedScript>>, ApiError> {
    let script = prospectdb_db::get_call_script(&state.pool, id)
        .await
        .map_err(|e| map_db_error("call script", &e))?
        .ok_or_else(|| ApiError::not_found("call script not found"))?;

    let values = render_values(&state, body.prospect_id, body.extra_variables).await?;
    let rendered = render_body(&script.body, &script.variables, &values)
        .map_err(|e| map_template_error(&e))?;

    Ok(ApiResponse::ok(RenderedScript {
        script_id: script.id,
        rendered,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ScriptUseRequest {
    #[serde(default)]
    success: bool,
}

/// POST /api/v1/scripts/:id/used
pub(in crate::api) async fn record_script_use(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ScriptUseRequest>,
) -> Result<Json<ApiResponse<CallScriptBody>>, ApiError> {
    let row = prospectdb_db::record_script_use(&state.pool, id, body.success)
        .await
        .map_err(|e| map_db_error("call script", &e))?;
    Ok(ApiResponse::ok(row.into()))
}

// ---------------------------------------------------------------------------
// Email templates
// ---------------------------------------------------------------------------

/// GET /api/v1/templates
pub(in crate::api) async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ApiResponse<Vec<EmailTemplateBody>>>, ApiError> {
    let rows = prospectdb_db::list_email_templates(&state.pool, query.category.as_deref())
        .await
        .map_err(|e| map_db_error("email templates", &e))?;
    Ok(ApiResponse::ok(
        rows.into_iter().map(EmailTemplateBody::from).collect(),
    ))
}

/// GET /api/v1/templates/:id
pub(in crate::api) async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<EmailTemplateBody>>, ApiError> {
    let row = prospectdb_db::get_email_template(&state.pool, id)
        .await
        .map_err(|e| map_db_error("email template", &e))?
        .ok_or_else(|| ApiError::not_found("email template not found"))?;
    Ok(ApiResponse::ok(row.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct CreateTemplateRequest {
    name: String,
    subject: String,
    body: String,
    category: Option<String>,
    #[serde(default)]
    variables: Vec<String>,
}

/// POST /api/v1/templates
pub(in crate::api) async fn create_template(
    State(state): State<AppState>,
    Json(body): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EmailTemplateBody>>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if body.subject.trim().is_empty() {
        return Err(ApiError::bad_request("subject must not be empty"));
    }
    if body.body.trim().is_empty() {
        return Err(ApiError::bad_request("body must not be empty"));
    }

    let new = NewEmailTemplate {
        name: body.name.trim().to_owned(),
        subject: body.subject,
        body: body.body,
        category: body.category,
        variables: body.variables,
    };
    let row = prospectdb_db::create_email_template(&state.pool, &new)
        .await
        .map_err(|e| map_db_error("email template", &e))?;
    Ok((StatusCode::CREATED, ApiResponse::ok(row.into())))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct RenderedEmail {
    template_id: i64,
    subject: String,
    body: String,
}

/// POST /api/v1/templates/:id/render
///
/// A successful render counts as a send for rate purposes.
pub(in crate::api) async fn render_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RenderRequest>,
) -> Result<Json<ApiResponse<RenderedEmail>>, ApiError> {
    let template = prospectdb_db::get_email_template(&state.pool, id)
        .await
        .map_err(|e| map_db_error("email template", &e))?
        .ok_or_else(|| ApiError::not_found("email template not found"))?;

    let values = render_values(&state, body.prospect_id, body.extra_variables).await?;
    let subject = render_body(&template.subject, &template.variables, &values)
        .map_err(|e| map_template_error(&e))?;
    let rendered = render_body(&template.body, &template.variables, &values)
        .map_err(|e| map_template_error(&e))?;

    prospectdb_db::record_template_outcome(&state.pool, id, None)
        .await
        .map_err(|e| map_db_error("email template", &e))?;

    Ok(ApiResponse::ok(RenderedEmail {
        template_id: template.id,
        subject,
        body: rendered,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct OutcomeRequest {
    outcome: String,
}

/// POST /api/v1/templates/:id/outcome
pub(in crate::api) async fn record_template_outcome(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<OutcomeRequest>,
) -> Result<Json<ApiResponse<EmailTemplateBody>>, ApiError> {
    let outcome = TemplateOutcome::parse(&body.outcome).ok_or_else(|| {
        ApiError::bad_request(format!(
            "invalid outcome \"{}\"; expected opened, clicked, or replied",
            body.outcome
        ))
    })?;

    let row = prospectdb_db::record_template_outcome(&state.pool, id, Some(outcome))
        .await
        .map_err(|e| map_db_error("email template", &e))?;
    Ok(ApiResponse::ok(row.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_none_before_any_use() {
        assert_eq!(rate(0, 0), None);
        assert_eq!(rate(5, 0), None);
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        assert_eq!(rate(1, 3), Some(33.3));
        assert_eq!(rate(2, 3), Some(66.7));
        assert_eq!(rate(3, 3), Some(100.0));
    }

    #[test]
    fn map_template_error_names_the_placeholder() {
        let err = map_template_error(&TemplateError::MissingValue {
            name: "contact_name".to_owned(),
        });
        assert!(err.message.contains("contact_name"));
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
