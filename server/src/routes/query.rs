//! Predefined use-case endpoint: GET|POST /api/predefined-sparql/{use_case}

use super::{blocking, parse_body, QueryParams};
use crate::error::{Result, ServerError};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use ontotag::query::execute;
use ontotag::UseCaseParams;
use serde_json::Value;
use std::sync::Arc;

/// Parameters from the query string.
pub async fn use_case_get(
    State(state): State<Arc<AppState>>,
    Path(use_case): Path<String>,
    QueryParams(params): QueryParams<UseCaseParams>,
) -> Result<Json<Value>> {
    run(state, use_case, params).await
}

/// Parameters from a JSON body.
pub async fn use_case_post(
    State(state): State<Arc<AppState>>,
    Path(use_case): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let params: UseCaseParams = parse_body(&body)?;
    run(state, use_case, params).await
}

async fn run(state: Arc<AppState>, use_case: String, params: UseCaseParams) -> Result<Json<Value>> {
    let debug = state.config().debug_payloads;
    let outcome = blocking(move || {
        execute(&state.store, &use_case, &params).map_err(|e| ServerError::from_query(e, debug))
    })
    .await?;
    Ok(Json(outcome.to_json(debug)))
}
