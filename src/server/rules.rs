//! Rule administration endpoints.
//!
//! The dashboard manages automation rules through this JSON API; the
//! webhook pipeline only ever reads snapshots. All validation lives in the
//! store, so the handlers here are thin translations between HTTP and
//! [`RuleStore`] operations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

use super::AppState;
use crate::instagram::PlatformClient;
use crate::rules::StoreError;
use crate::types::{AutomationRule, RuleDraft, RuleId};

/// A store error dressed for the HTTP boundary.
#[derive(Debug)]
pub struct RuleApiError(StoreError);

impl From<StoreError> for RuleApiError {
    fn from(err: StoreError) -> Self {
        RuleApiError(err)
    }
}

impl IntoResponse for RuleApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::PostRuleConflict { .. } => StatusCode::CONFLICT,
            // Persistence failures: the mutation was rolled back.
            StoreError::Io(_) | StoreError::Json(_) | StoreError::SchemaMismatch { .. } => {
                warn!(error = %self.0, "rule store operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// `GET /api/v1/rules` — all rules in store order.
pub async fn list_rules<C>(State(app_state): State<AppState<C>>) -> Json<Vec<AutomationRule>>
where
    C: PlatformClient + Send + Sync + 'static,
{
    Json(app_state.store().snapshot())
}

/// `POST /api/v1/rules` — validates the draft and creates a rule.
///
/// Returns 201 with the stored rule (including its assigned id), 400 on
/// validation failure, 409 when another active rule already targets the
/// same post.
pub async fn create_rule<C>(
    State(app_state): State<AppState<C>>,
    Json(draft): Json<RuleDraft>,
) -> Result<(StatusCode, Json<AutomationRule>), RuleApiError>
where
    C: PlatformClient + Send + Sync + 'static,
{
    let rule = app_state.store().create(draft)?;
    info!(rule_id = %rule.id, "rule created");
    Ok((StatusCode::CREATED, Json(rule)))
}

/// `GET /api/v1/rules/{id}`.
pub async fn get_rule<C>(
    State(app_state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<Json<AutomationRule>, RuleApiError>
where
    C: PlatformClient + Send + Sync + 'static,
{
    let id = RuleId::new(id);
    match app_state.store().get(&id) {
        Some(rule) => Ok(Json(rule)),
        None => Err(StoreError::NotFound(id).into()),
    }
}

/// `PUT /api/v1/rules/{id}` — full replacement with the same validation as
/// create. The rule keeps its id and position in store order.
pub async fn update_rule<C>(
    State(app_state): State<AppState<C>>,
    Path(id): Path<String>,
    Json(draft): Json<RuleDraft>,
) -> Result<Json<AutomationRule>, RuleApiError>
where
    C: PlatformClient + Send + Sync + 'static,
{
    let rule = app_state.store().replace(&RuleId::new(id), draft)?;
    info!(rule_id = %rule.id, "rule updated");
    Ok(Json(rule))
}

/// `DELETE /api/v1/rules/{id}` — 204 on success, 404 for unknown ids.
pub async fn delete_rule<C>(
    State(app_state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, RuleApiError>
where
    C: PlatformClient + Send + Sync + 'static,
{
    let id = RuleId::new(id);
    app_state.store().delete(&id)?;
    info!(rule_id = %id, "rule deleted");
    Ok(StatusCode::NO_CONTENT)
}
