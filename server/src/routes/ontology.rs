//! Ontology upload, read-only views and export

use super::{blocking, QueryParams};
use crate::error::{Result, ServerError};
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use log::info;
use ontotag::catalog::{individuals, properties, summary};
use ontotag::consts::{DATATYPE_PROPERTY, OBJECT_PROPERTY};
use ontotag::util::write_graph;
use oxigraph::io::RdfFormat;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

const UPLOAD_FIELD: &str = "ontology_file";
const DEFAULT_EXPORT_NAME: &str = "ontology";

/// POST /load-ontology/
///
/// Expects the ontology in the multipart field `ontology_file`.
pub async fn load_ontology(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("uploaded.owl").to_string();
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }
    let Some((file_name, bytes)) = upload else {
        return Err(ServerError::bad_request("No ontology file provided"));
    };
    info!("Received ontology upload {} ({} bytes)", file_name, bytes.len());

    blocking(move || {
        let snapshot = state.store.load_upload(&file_name, &bytes)?;
        Ok(Json(json!({
            "status": "success",
            "message": format!("Ontology {} loaded successfully", file_name),
            "ontology": summary(snapshot.graph()),
        })))
    })
    .await
}

/// GET /api/current-ontology/
pub async fn current_ontology(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    blocking(move || {
        let snapshot = state.store.snapshot()?;
        Ok(Json(json!({
            "status": "success",
            "ontology": { "individuals": individuals(snapshot.graph()) },
        })))
    })
    .await
}

/// GET /api/object-properties/
pub async fn object_properties(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    blocking(move || {
        let snapshot = state.store.snapshot()?;
        Ok(Json(json!({
            "status": "success",
            "object_properties": properties(snapshot.graph(), OBJECT_PROPERTY),
        })))
    })
    .await
}

/// GET /api/data-properties/
pub async fn data_properties(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    blocking(move || {
        let snapshot = state.store.snapshot()?;
        Ok(Json(json!({
            "status": "success",
            "data_properties": properties(snapshot.graph(), DATATYPE_PROPERTY),
        })))
    })
    .await
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub filename: Option<String>,
}

/// The bare file name to export to, with an `.owl` extension.
fn export_file_name(requested: Option<&str>) -> String {
    let name = requested
        .map(str::trim)
        .and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_EXPORT_NAME);
    if name.to_ascii_lowercase().ends_with(".owl") {
        name.to_string()
    } else {
        format!("{}.owl", name)
    }
}

/// GET /export-ontology/?filename=
///
/// Serializes the current snapshot as RDF/XML, keeps a copy under the media
/// root and returns it as an attachment.
pub async fn export_ontology(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ExportParams>,
) -> Result<impl IntoResponse> {
    let file_name = export_file_name(params.filename.as_deref());
    let (file_name, bytes) = blocking(move || {
        let snapshot = state.store.snapshot()?;
        let config = state.config();
        let bytes = write_graph(snapshot.graph(), RdfFormat::RdfXml, &config.namespaces, Vec::new())
            .map_err(|e| ServerError::Internal(format!("Failed to serialize ontology: {:#}", e)))?;
        std::fs::create_dir_all(&config.media_root)?;
        let path = config.media_root.join(&file_name);
        std::fs::write(&path, &bytes)?;
        info!("Exported ontology to {}", path.display());
        Ok((file_name, bytes))
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/rdf+xml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    ))
}
