//! Prospect CRUD, interaction log, and dashboard handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use prospectdb_core::prospect::{InteractionKind, InteractionOutcome, ProspectStatus};
use prospectdb_db::{
    InteractionRow, NewInteraction, NewProspect, ProspectFilter, ProspectRow, ProspectSort,
    SortOrder, UpdateProspect,
};
use prospectdb_traffic::extract_domain;

use super::{map_db_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// Persisted prospect shape as it crosses the API boundary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ProspectBody {
    /// Absent on the stub reference returned when persistence degrades.
    pub id: Option<i64>,
    pub company_name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: String,
    pub contact: ContactBody,
    pub business_info: BusinessInfoBody,
    pub website_analysis: Option<WebsiteAnalysisBody>,
    pub status: String,
    pub score: i32,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ContactBody {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct BusinessInfoBody {
    pub monthly_shipments: Option<i64>,
    pub average_order_value: Option<Decimal>,
    pub estimated_shipping_costs: Option<i64>,
    pub main_destinations: Vec<String>,
    pub estimated_monthly_revenue: Option<i64>,
    pub conversion_rate: Option<f64>,
    pub monthly_orders: Option<i64>,
    pub estimated_monthly_visits: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct WebsiteAnalysisBody {
    pub is_ecommerce: Option<bool>,
    pub platform: Option<String>,
    pub analysis_date: Option<DateTime<Utc>>,
    pub analysis_data: Option<serde_json::Value>,
}

impl From<ProspectRow> for ProspectBody {
    fn from(row: ProspectRow) -> Self {
        let website_analysis = if row.analysis_date.is_some() || row.analysis_data.is_some() {
            Some(WebsiteAnalysisBody {
                is_ecommerce: row.is_ecommerce,
                platform: row.platform,
                analysis_date: row.analysis_date,
                analysis_data: row.analysis_data,
            })
        } else {
            None
        };

        Self {
            id: Some(row.id),
            company_name: row.company_name,
            website: row.website,
            industry: row.industry,
            size: row.size,
            contact: ContactBody {
                name: row.contact_name,
                role: row.contact_role,
                email: row.contact_email,
                phone: row.contact_phone,
            },
            business_info: BusinessInfoBody {
                monthly_shipments: row.monthly_shipments,
                average_order_value: row.average_order_value,
                estimated_shipping_costs: row.estimated_shipping_costs,
                main_destinations: row.main_destinations,
                estimated_monthly_revenue: row.estimated_monthly_revenue,
                conversion_rate: row.conversion_rate,
                monthly_orders: row.monthly_orders,
                estimated_monthly_visits: row.estimated_monthly_visits,
            },
            website_analysis,
            status: row.status,
            score: row.score,
            notes: row.notes,
            tags: row.tags,
            last_contact_date: row.last_contact_date,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

impl ProspectBody {
    /// Stub reference used when persistence fails mid-analysis: identity
    /// only, empty business info.
    pub(in crate::api) fn stub(domain: &str, company_name: &str) -> Self {
        Self {
            id: None,
            company_name: company_name.to_owned(),
            website: Some(domain.to_owned()),
            industry: Some("E-commerce".to_owned()),
            size: "medium".to_owned(),
            contact: ContactBody::default(),
            business_info: BusinessInfoBody::default(),
            website_analysis: None,
            status: "new".to_owned(),
            score: 0,
            notes: None,
            tags: Vec::new(),
            last_contact_date: None,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct InteractionBody {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub next_action: Option<String>,
    pub bdr_name: Option<String>,
}

impl From<InteractionRow> for InteractionBody {
    fn from(row: InteractionRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            date: row.occurred_at,
            notes: row.notes,
            outcome: row.outcome,
            next_action: row.next_action,
            bdr_name: row.author,
        }
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ListQuery {
    status: Option<String>,
    industry: Option<String>,
    size: Option<String>,
    min_score: Option<i32>,
    max_score: Option<i32>,
    page: Option<i64>,
    limit: Option<i64>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct Pagination {
    page: i64,
    limit: i64,
    total: i64,
    pages: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ProspectListResponse {
    success: bool,
    data: Vec<ProspectBody>,
    pagination: Pagination,
}

/// GET /api/v1/prospects
pub(in crate::api) async fn list_prospects(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProspectListResponse>, ApiError> {
    if let Some(ref status) = query.status {
        if ProspectStatus::parse(status).is_none() {
            return Err(ApiError::bad_request(format!(
                "invalid status filter \"{status}\""
            )));
        }
    }

    let sort = match query.sort_by.as_deref() {
        None => ProspectSort::default(),
        Some(raw) => ProspectSort::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("invalid sortBy \"{raw}\"")))?,
    };
    let order = match query.sort_order.as_deref() {
        None => SortOrder::default(),
        Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        Some(raw) => {
            return Err(ApiError::bad_request(format!(
                "invalid sortOrder \"{raw}\"; expected asc or desc"
            )))
        }
    };

    let filter = ProspectFilter {
        status: query.status,
        industry: query.industry,
        size: query.size,
        min_score: query.min_score,
        max_score: query.max_score,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
        sort,
        order,
    };

    let page = prospectdb_db::list_prospects(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error("prospects", &e))?;

    let pages = if page.total == 0 {
        0
    } else {
        (page.total + page.limit - 1) / page.limit
    };

    Ok(Json(ProspectListResponse {
        success: true,
        data: page.items.into_iter().map(ProspectBody::from).collect(),
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages,
        },
    }))
}

/// GET /api/v1/prospects/:id
pub(in crate::api) async fn get_prospect(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProspectBody>>, ApiError> {
    let row = prospectdb_db::get_prospect(&state.pool, id)
        .await
        .map_err(|e| map_db_error("prospect", &e))?
        .ok_or_else(|| ApiError::not_found("prospect not found"))?;
    Ok(ApiResponse::ok(row.into()))
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ContactRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct CreateProspectRequest {
    company_name: String,
    website: Option<String>,
    industry: Option<String>,
    size: Option<String>,
    contact: Option<ContactRequest>,
    notes: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    source: Option<String>,
}

fn validate_company_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim().to_owned();
    if name.is_empty() || name.len() > 200 {
        return Err(ApiError::bad_request("companyName must be 1-200 characters"));
    }
    Ok(name)
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ApiError::bad_request("contact.email is not a valid email address"))?;
    if local.is_empty() || !domain.contains('.') {
        return Err(ApiError::bad_request(
            "contact.email is not a valid email address",
        ));
    }
    Ok(())
}

/// Canonicalizes a website field to the bare domain, so explicitly created
/// prospects share the upsert key space with analyzed ones.
fn canonical_website(raw: &str) -> Result<String, ApiError> {
    extract_domain(raw).map_err(|_| {
        ApiError::bad_request(format!(
            "website \"{raw}\" is not a valid URL or hostname"
        ))
    })
}

fn validate_size(size: &str) -> Result<(), ApiError> {
    prospectdb_core::prospect::CompanySize::parse(size)
        .map(|_| ())
        .ok_or_else(|| ApiError::bad_request(format!("invalid size \"{size}\"")))
}

/// POST /api/v1/prospects
pub(in crate::api) async fn create_prospect(
    State(state): State<AppState>,
    Json(body): Json<CreateProspectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProspectBody>>), ApiError> {
    let company_name = validate_company_name(&body.company_name)?;

    let website = body
        .website
        .as_deref()
        .map(canonical_website)
        .transpose()?;
    if let Some(ref size) = body.size {
        validate_size(size)?;
    }
    let contact = body.contact;
    if let Some(email) = contact.as_ref().and_then(|c| c.email.as_deref()) {
        validate_email(email)?;
    }

    let new = NewProspect {
        company_name,
        website,
        industry: body.industry,
        size: body.size,
        contact_name: contact.as_ref().and_then(|c| c.name.clone()),
        contact_role: contact.as_ref().and_then(|c| c.role.clone()),
        contact_email: contact.as_ref().and_then(|c| c.email.clone()),
        contact_phone: contact.as_ref().and_then(|c| c.phone.clone()),
        notes: body.notes,
        tags: body.tags,
        source: body.source,
    };

    let row = prospectdb_db::create_prospect(&state.pool, &new)
        .await
        .map_err(|e| map_unique_website(&e))?;

    Ok((StatusCode::CREATED, ApiResponse::ok(row.into())))
}

fn map_unique_website(e: &prospectdb_db::DbError) -> ApiError {
    if let prospectdb_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::new(
                StatusCode::CONFLICT,
                "a prospect with that website already exists",
            );
        }
    }
    map_db_error("prospect", e)
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct UpdateProspectRequest {
    company_name: Option<String>,
    website: Option<Option<String>>,
    industry: Option<Option<String>>,
    size: Option<String>,
    contact: Option<ContactRequest>,
    notes: Option<Option<String>>,
    tags: Option<Vec<String>>,
}

/// PATCH /api/v1/prospects/:id
pub(in crate::api) async fn update_prospect(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProspectRequest>,
) -> Result<Json<ApiResponse<ProspectBody>>, ApiError> {
    let company_name = body
        .company_name
        .as_deref()
        .map(validate_company_name)
        .transpose()?;
    if let Some(ref size) = body.size {
        validate_size(size)?;
    }
    let website = match body.website {
        None => None,
        Some(None) => Some(None),
        Some(Some(ref raw)) => Some(Some(canonical_website(raw)?)),
    };
    if let Some(email) = body.contact.as_ref().and_then(|c| c.email.as_deref()) {
        validate_email(email)?;
    }

    let contact = body.contact;
    let update = UpdateProspect {
        company_name,
        website,
        industry: body.industry,
        size: body.size,
        contact_name: contact.as_ref().map(|c| c.name.clone()),
        contact_role: contact.as_ref().map(|c| c.role.clone()),
        contact_email: contact.as_ref().map(|c| c.email.clone()),
        contact_phone: contact.as_ref().map(|c| c.phone.clone()),
        notes: body.notes,
        tags: body.tags,
    };

    let row = prospectdb_db::update_prospect(&state.pool, id, &update)
        .await
        .map_err(|e| map_db_error("prospect", &e))?;
    Ok(ApiResponse::ok(row.into()))
}

// ---------------------------------------------------------------------------
// Status / interactions / stats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct StatusRequest {
    status: String,
}

/// PUT /api/v1/prospects/:id/status
pub(in crate::api) async fn set_prospect_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<ApiResponse<ProspectBody>>, ApiError> {
    let status = ProspectStatus::parse(&body.status)
        .ok_or_else(|| ApiError::bad_request(format!("invalid status \"{}\"", body.status)))?;

    let row = prospectdb_db::set_status(&state.pool, id, status.as_str())
        .await
        .map_err(|e| map_db_error("prospect", &e))?;
    Ok(ApiResponse::ok(row.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct InteractionRequest {
    #[serde(rename = "type")]
    kind: String,
    notes: Option<String>,
    outcome: Option<String>,
    next_action: Option<String>,
    bdr_name: Option<String>,
}

/// POST /api/v1/prospects/:id/interactions
pub(in crate::api) async fn add_interaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<InteractionRequest>,
) -> Result<Json<ApiResponse<ProspectBody>>, ApiError> {
    let kind = InteractionKind::parse(&body.kind)
        .ok_or_else(|| ApiError::bad_request(format!("invalid interaction type \"{}\"", body.kind)))?;
    let outcome = body
        .outcome
        .as_deref()
        .map(|raw| {
            InteractionOutcome::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("invalid outcome \"{raw}\"")))
        })
        .transpose()?;

    let interaction = NewInteraction {
        kind: kind.as_str().to_owned(),
        notes: body.notes,
        outcome: outcome.map(|o| o.as_str().to_owned()),
        next_action: body.next_action,
        author: body.bdr_name,
    };

    let row = prospectdb_db::add_interaction(&state.pool, id, &interaction)
        .await
        .map_err(|e| map_db_error("prospect", &e))?;
    Ok(ApiResponse::ok(row.into()))
}

/// GET /api/v1/prospects/:id/interactions
pub(in crate::api) async fn list_interactions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<InteractionBody>>>, ApiError> {
    prospectdb_db::get_prospect(&state.pool, id)
        .await
        .map_err(|e| map_db_error("prospect", &e))?
        .ok_or_else(|| ApiError::not_found("prospect not found"))?;

    let rows = prospectdb_db::list_interactions(&state.pool, id)
        .await
        .map_err(|e| map_db_error("interactions", &e))?;
    Ok(ApiResponse::ok(
        rows.into_iter().map(InteractionBody::from).collect(),
    ))
}

/// DELETE /api/v1/prospects/:id
pub(in crate::api) async fn deactivate_prospect(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    prospectdb_db::get_prospect(&state.pool, id)
        .await
        .map_err(|e| map_db_error("prospect", &e))?
        .ok_or_else(|| ApiError::not_found("prospect not found"))?;

    prospectdb_db::deactivate_prospect(&state.pool, id)
        .await
        .map_err(|e| map_db_error("prospect", &e))?;
    Ok(ApiResponse::ok(serde_json::json!({ "deactivated": true })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct StatusCountBody {
    status: String,
    count: i64,
    avg_score: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct RecentContactBody {
    id: i64,
    company_name: String,
    contact_name: Option<String>,
    last_contact_date: Option<DateTime<Utc>>,
    status: String,
    score: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct DashboardBody {
    total_prospects: i64,
    high_score_prospects: i64,
    status_breakdown: Vec<StatusCountBody>,
    recent_interactions: Vec<RecentContactBody>,
}

/// GET /api/v1/prospects/stats/dashboard
pub(in crate::api) async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardBody>>, ApiError> {
    let stats = prospectdb_db::dashboard_stats(&state.pool)
        .await
        .map_err(|e| map_db_error("dashboard", &e))?;

    Ok(ApiResponse::ok(DashboardBody {
        total_prospects: stats.total_prospects,
        high_score_prospects: stats.high_score_prospects,
        status_breakdown: stats
            .status_breakdown
            .into_iter()
            .map(|s| StatusCountBody {
                status: s.status,
                count: s.count,
                avg_score: s.avg_score,
            })
            .collect(),
        recent_interactions: stats
            .recent_contacts
            .into_iter()
            .map(|r| RecentContactBody {
                id: r.id,
                company_name: r.company_name,
                contact_name: r.contact_name,
                last_contact_date: r.last_contact_date,
                status: r.status,
                score: r.score,
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_name_is_trimmed_and_bounded() {
        assert_eq!(validate_company_name("  Fastship  ").unwrap(), "Fastship");
        assert!(validate_company_name("   ").is_err());
        assert!(validate_company_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn email_validation_requires_at_and_domain_dot() {
        assert!(validate_email("ada@fastship.example").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@nodomain").is_err());
        assert!(validate_email("x@nodot").is_err());
    }

    #[test]
    fn website_is_canonicalized_to_bare_domain() {
        assert_eq!(
            canonical_website("https://www.fastship.example/shop").unwrap(),
            "fastship.example"
        );
        assert!(canonical_website("nope").is_err());
    }

    #[test]
    fn stub_prospect_carries_identity_and_empty_business_info() {
        let stub = ProspectBody::stub("fastship.example", "Fastship");
        assert!(stub.id.is_none());
        assert_eq!(stub.website.as_deref(), Some("fastship.example"));
        assert!(stub.business_info.monthly_shipments.is_none());
        assert!(stub.business_info.main_destinations.is_empty());
    }
}
