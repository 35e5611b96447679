//! Ontology edit endpoints. Every edit publishes a new snapshot and answers
//! with the updated view of what it changed.

use super::{blocking, parse_body};
use crate::error::Result;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use ontotag::catalog::{class_hierarchy, classes, individuals, properties};
use ontotag::consts::{ANNOTATION_PROPERTY, DATATYPE_PROPERTY, OBJECT_PROPERTY};
use ontotag::edit::{
    self, NewAnnotationProperty, NewClass, NewDataProperty, NewIndividual, NewObjectProperty,
    RelationshipChange,
};
use ontotag::ontology::OntologySnapshot;
use ontotag::OntologyStore;
use oxigraph::model::Graph;
use serde_json::{json, Value};
use std::sync::Arc;

/// Applies `f` to the current ontology, loading the default one first if
/// nothing is published yet.
fn apply<T, F>(store: &OntologyStore, f: F) -> Result<(T, Arc<OntologySnapshot>)>
where
    F: FnOnce(&OntologySnapshot, &mut Graph) -> ontotag::Result<T>,
{
    store.snapshot()?;
    Ok(store.edit(f)?)
}

/// POST /create-class/
pub async fn create_class(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    let req: NewClass = parse_body(&body)?;
    blocking(move || {
        let (class, snapshot) = apply(&state.store, |base, graph| edit::create_class(base, graph, &req))?;
        let graph = snapshot.graph();
        Ok(Json(json!({
            "status": "success",
            "message": format!("Class {} created", class.as_str()),
            "ontology": {
                "classes": class_hierarchy(graph),
                "classes_count": classes(graph).len(),
            },
        })))
    })
    .await
}

/// POST /create-individual/
pub async fn create_individual(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    let req: NewIndividual = parse_body(&body)?;
    blocking(move || {
        let (individual, snapshot) =
            apply(&state.store, |base, graph| edit::create_individual(base, graph, &req))?;
        Ok(Json(json!({
            "status": "success",
            "message": format!("Individual {} created", individual.as_str()),
            "iri": individual.as_str(),
            "ontology": { "individuals": individuals(snapshot.graph()) },
        })))
    })
    .await
}

/// POST /create_object_property/
pub async fn create_object_property(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let req: NewObjectProperty = parse_body(&body)?;
    blocking(move || {
        let (property, snapshot) = apply(&state.store, |base, graph| {
            edit::create_object_property(base, graph, &req)
        })?;
        Ok(Json(json!({
            "status": "success",
            "message": format!("Object property {} created", property.as_str()),
            "object_properties": properties(snapshot.graph(), OBJECT_PROPERTY),
        })))
    })
    .await
}

/// POST /create_data_property/
pub async fn create_data_property(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let req: NewDataProperty = parse_body(&body)?;
    blocking(move || {
        let (property, snapshot) = apply(&state.store, |base, graph| {
            edit::create_data_property(base, graph, &req)
        })?;
        Ok(Json(json!({
            "status": "success",
            "message": format!("Data property {} created", property.as_str()),
            "data_properties": properties(snapshot.graph(), DATATYPE_PROPERTY),
        })))
    })
    .await
}

/// POST /create-annotation-property/
pub async fn create_annotation_property(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let req: NewAnnotationProperty = parse_body(&body)?;
    blocking(move || {
        let (property, snapshot) = apply(&state.store, |base, graph| {
            edit::create_annotation_property(base, graph, &req)
        })?;
        Ok(Json(json!({
            "status": "success",
            "message": format!("Annotation property {} created", property.as_str()),
            "annotation_properties": properties(snapshot.graph(), ANNOTATION_PROPERTY),
        })))
    })
    .await
}

/// POST /relationship-manager/
pub async fn relationship_manager(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let req: RelationshipChange = parse_body(&body)?;
    blocking(move || {
        let (action, snapshot) =
            apply(&state.store, |_, graph| edit::change_relationship(graph, &req))?;
        Ok(Json(json!({
            "status": "success",
            "message": format!("Relationship {:?} applied", action),
            "ontology": { "individuals": individuals(snapshot.graph()) },
        })))
    })
    .await
}
