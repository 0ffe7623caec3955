use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::types::*;
use crate::catalog::{Criteria, Pagination};
use crate::server::AppState;
use crate::util::QueryParams;

pub async fn health() -> Json<Health> {
    Json(Health {
        ok: true,
        service: "api".to_string(),
    })
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.list_categories().to_vec())
}

pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Response {
    let (criteria, pagination) = query_from_params(&params);
    debug!(?criteria, ?pagination, "Catalog query");

    Json(state.catalog.query(&criteria, pagination)).into_response()
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let title = state.catalog.get_by_id(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(title).into_response())
}

/// Map query string parameters onto catalog query inputs. Every
/// combination is valid; anything unusable falls back to a default.
pub fn query_from_params(params: &QueryParams) -> (Criteria, Pagination) {
    let mut criteria = Criteria::new();
    if let Some(category) = params.get("category") {
        criteria = criteria.category(category);
    }
    if let Some(title_type) = params.get("type") {
        criteria = criteria.title_type(title_type);
    }
    if let Some(q) = params.get("q") {
        criteria = criteria.text(q);
    }

    let pagination = Pagination::new(params.get_number("page"), params.get_number("limit"));

    (criteria, pagination)
}
