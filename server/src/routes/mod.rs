//! HTTP route handlers and router configuration

mod admin;
mod edit;
mod ontology;
mod query;

use crate::error::{Result, ServerError};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::{
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Build the application router. Routes accept an optional trailing slash.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(admin::health))
        // Predefined use-case queries
        .route(
            "/api/predefined-sparql/:use_case",
            get(query::use_case_get).post(query::use_case_post),
        )
        .route(
            "/api/predefined-sparql/:use_case/",
            get(query::use_case_get).post(query::use_case_post),
        )
        .route(
            "/predefined-sparql/:use_case",
            get(query::use_case_get).post(query::use_case_post),
        )
        .route(
            "/predefined-sparql/:use_case/",
            get(query::use_case_get).post(query::use_case_post),
        )
        // Ontology loading and views
        .route("/load-ontology/", post(ontology::load_ontology))
        .route("/load-ontology", post(ontology::load_ontology))
        .route("/api/current-ontology/", get(ontology::current_ontology))
        .route("/api/object-properties/", get(ontology::object_properties))
        .route("/api/data-properties/", get(ontology::data_properties))
        .route("/export-ontology/", get(ontology::export_ontology))
        // Edits
        .route("/create-class/", post(edit::create_class))
        .route("/create-individual/", post(edit::create_individual))
        .route("/create_object_property/", post(edit::create_object_property))
        .route("/create_data_property/", post(edit::create_data_property))
        .route(
            "/create-annotation-property/",
            post(edit::create_annotation_property),
        )
        .route("/relationship-manager/", post(edit::relationship_manager))
        .with_state(state)
}

/// Parses a JSON request body; an empty body yields the default value.
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Query string parameters. Unlike `Query`, a malformed query string is
/// answered with the JSON error body.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ServerError::bad_request(e.body_text()))?;
        Ok(QueryParams(params))
    }
}

/// Runs graph work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("Worker task failed: {}", e)))?
}
