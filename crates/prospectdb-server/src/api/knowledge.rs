//! Knowledge-base handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prospectdb_core::knowledge::{CarrierRateSheet, KnowledgeCategory};
use prospectdb_db::{
    KnowledgeFilter, KnowledgeItemRow, NewKnowledgeItem, UpdateKnowledgeItem,
};

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct KnowledgeItemBody {
    id: i64,
    title: String,
    content: String,
    category: String,
    tags: Vec<String>,
    priority: i32,
    views: i64,
    times_used: i64,
    carrier_rates: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<KnowledgeItemRow> for KnowledgeItemBody {
    fn from(row: KnowledgeItemRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            category: row.category,
            tags: row.tags,
            priority: row.priority,
            views: row.views,
            times_used: row.times_used,
            carrier_rates: row.carrier_rates,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct KnowledgeQuery {
    category: Option<String>,
    tag: Option<String>,
    q: Option<String>,
    limit: Option<i64>,
}

fn validate_category(raw: &str) -> Result<(), ApiError> {
    KnowledgeCategory::parse(raw)
        .map(|_| ())
        .ok_or_else(|| ApiError::bad_request(format!("invalid category \"{raw}\"")))
}

/// A supplied rate sheet must match the structured carrier-rate schema.
fn validate_carrier_rates(value: &serde_json::Value) -> Result<(), ApiError> {
    serde_json::from_value::<CarrierRateSheet>(value.clone())
        .map(|_| ())
        .map_err(|e| {
            ApiError::bad_request(format!("carrierRates does not match the rate-sheet schema: {e}"))
        })
}

/// GET /api/v1/knowledge
pub(in crate::api) async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<KnowledgeQuery>,
) -> Result<Json<ApiResponse<Vec<KnowledgeItemBody>>>, ApiError> {
    if let Some(ref category) = query.category {
        validate_category(category)?;
    }

    let filter = KnowledgeFilter {
        category: query.category,
        tag: query.tag,
        query: query.q,
        limit: query.limit.unwrap_or(50),
    };

    let rows = prospectdb_db::list_knowledge_items(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error("knowledge items", &e))?;
    Ok(ApiResponse::ok(
        rows.into_iter().map(KnowledgeItemBody::from).collect(),
    ))
}

/// GET /api/v1/knowledge/:id
pub(in crate::api) async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<KnowledgeItemBody>>, ApiError> {
    let row = prospectdb_db::get_knowledge_item(&state.pool, id)
        .await
        .map_err(|e| map_db_error("knowledge item", &e))?
        .ok_or_else(|| ApiError::not_found("knowledge item not found"))?;
    Ok(ApiResponse::ok(row.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct CreateKnowledgeRequest {
    title: String,
    content: String,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    priority: i32,
    carrier_rates: Option<serde_json::Value>,
}

/// POST /api/v1/knowledge
pub(in crate::api) async fn create_item(
    State(state): State<AppState>,
    Json(body): Json<CreateKnowledgeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<KnowledgeItemBody>>), ApiError> {
    let title = body.title.trim().to_owned();
    if title.is_empty() || title.len() > 300 {
        return Err(ApiError::bad_request("title must be 1-300 characters"));
    }
    if body.content.trim().is_empty() {
        return Err(ApiError::bad_request("content must not be empty"));
    }
    validate_category(&body.category)?;
    if let Some(ref rates) = body.carrier_rates {
        validate_carrier_rates(rates)?;
    }

    let new = NewKnowledgeItem {
        title,
        content: body.content,
        category: body.category,
        tags: body.tags,
        priority: body.priority,
        carrier_rates: body.carrier_rates,
    };

    let row = prospectdb_db::create_knowledge_item(&state.pool, &new)
        .await
        .map_err(|e| map_db_error("knowledge item", &e))?;
    Ok((StatusCode::CREATED, ApiResponse::ok(row.into())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct UpdateKnowledgeRequest {
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    priority: Option<i32>,
    carrier_rates: Option<serde_json::Value>,
}

/// PATCH /api/v1/knowledge/:id
pub(in crate::api) async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateKnowledgeRequest>,
) -> Result<Json<ApiResponse<KnowledgeItemBody>>, ApiError> {
    if let Some(ref title) = body.title {
        if title.trim().is_empty() || title.len() > 300 {
            return Err(ApiError::bad_request("title must be 1-300 characters"));
        }
    }
    if let Some(ref rates) = body.carrier_rates {
        validate_carrier_rates(rates)?;
    }

    let update = UpdateKnowledgeItem {
        title: body.title.map(|t| t.trim().to_owned()),
        content: body.content,
        tags: body.tags,
        priority: body.priority,
        carrier_rates: body.carrier_rates,
    };

    let row = prospectdb_db::update_knowledge_item(&state.pool, id, &update)
        .await
        .map_err(|e| map_db_error("knowledge item", &e))?;
    Ok(ApiResponse::ok(row.into()))
}

/// POST /api/v1/knowledge/:id/used
pub(in crate::api) async fn record_use(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    prospectdb_db::record_knowledge_use(&state.pool, id)
        .await
        .map_err(|e| map_db_error("knowledge item", &e))?;
    Ok(ApiResponse::ok(serde_json::json!({ "recorded": true })))
}

/// DELETE /api/v1/knowledge/:id
pub(in crate::api) async fn deactivate_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    prospectdb_db::deactivate_knowledge_item(&state.pool, id)
        .await
        .map_err(|e| map_db_error("knowledge item", &e))?;
    Ok(ApiResponse::ok(serde_json::json!({ "deactivated": true })))
}
