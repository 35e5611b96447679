//! Ontology edits. Each function mutates a working copy of the graph handed
//! out by [`crate::store::OntologyStore::edit`]; lookups run against that
//! copy and new IRIs are minted from the base snapshot.

use crate::consts::*;
use crate::errors::{OntologyError, Result};
use crate::names::sanitize_local_name;
use crate::ontology::{has_subject, is_a, OntologySnapshot};
use crate::resolver::{find_entity, resolve};
use log::{debug, info, warn};
use oxigraph::model::{
    BlankNode, Graph as OxigraphGraph, Literal, NamedNode, NamedNodeRef, TripleRef,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewClass {
    pub name: String,
    pub parents: Vec<String>,
}

/// One data property value as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataValue {
    pub value: Value,
    pub lang: Option<String>,
    pub datatype: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Description {
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewIndividual {
    pub name: String,
    pub classes: Vec<String>,
    pub properties: BTreeMap<String, Vec<DataValue>>,
    pub object_properties: BTreeMap<String, Vec<String>>,
    pub annotations: BTreeMap<String, Vec<Value>>,
    pub description: Description,
    pub same_as: Vec<String>,
    pub different_from: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewObjectProperty {
    pub property_name: String,
    pub domain: Vec<String>,
    pub range: Vec<String>,
    pub characteristics: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewDataProperty {
    pub property_name: String,
    pub domain: Vec<String>,
    pub range: Option<String>,
    pub characteristics: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewAnnotationProperty {
    pub name: String,
    pub domain: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelationshipChange {
    pub subject: Option<String>,
    pub object_property: Option<String>,
    pub target: Option<String>,
    pub action: Option<String>,
    pub replace_with: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipAction {
    Add,
    Remove,
    Replace,
}

impl FromStr for RelationshipAction {
    type Err = OntologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(RelationshipAction::Add),
            "remove" => Ok(RelationshipAction::Remove),
            "replace" => Ok(RelationshipAction::Replace),
            _ => Err(OntologyError::bad_request(
                "Invalid action. Use \"add\", \"remove\" or \"replace\"",
            )),
        }
    }
}

/// Maps a client data range (`int`, `xsd:float`, ...) to its datatype IRI.
pub fn data_range(name: &str) -> Option<NamedNodeRef<'static>> {
    let key = name.trim().to_ascii_lowercase();
    let key = key.strip_prefix("xsd:").unwrap_or(&key);
    match key {
        "str" => Some(XSD_STRING),
        "normstr" => Some(XSD_NORMALIZED_STRING),
        "locstr" => Some(PLAIN_LITERAL),
        "int" => Some(XSD_INTEGER),
        "float" => Some(XSD_DECIMAL),
        "bool" => Some(XSD_BOOLEAN),
        "date" => Some(XSD_DATE),
        "time" => Some(XSD_TIME),
        "datetime" => Some(XSD_DATE_TIME),
        _ => None,
    }
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OntologyError::bad_request(message));
    }
    Ok(value)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn typed_literal(text: &str, datatype: Option<&str>) -> Result<Literal> {
    let Some(datatype) = datatype.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(Literal::new_simple_literal(text));
    };
    let local = datatype.strip_prefix("xsd:").unwrap_or(datatype);
    let literal = match local {
        "integer" | "int" => match text.trim().parse::<i64>() {
            Ok(v) => Literal::from(v),
            Err(_) => Literal::new_simple_literal(text),
        },
        "float" | "double" | "decimal" => match text.trim().parse::<f64>() {
            Ok(_) => Literal::new_typed_literal(text.trim(), XSD_DECIMAL),
            Err(_) => Literal::new_simple_literal(text),
        },
        "boolean" => {
            let v = text.trim().to_ascii_lowercase();
            Literal::from(v == "true" || v == "1")
        }
        _ if datatype.starts_with("xsd:") => {
            Literal::new_typed_literal(text, NamedNode::new(format!("{}{}", XSD_NAMESPACE, local))
                .map_err(|e| OntologyError::bad_request(format!("Invalid datatype {}: {}", datatype, e)))?)
        }
        _ => {
            let iri = NamedNode::new(datatype)
                .map_err(|e| OntologyError::bad_request(format!("Invalid datatype {}: {}", datatype, e)))?;
            Literal::new_typed_literal(text, iri)
        }
    };
    Ok(literal)
}

fn data_literal(item: &DataValue) -> Result<Option<Literal>> {
    let Some(text) = value_text(&item.value) else {
        return Ok(None);
    };
    if let Some(lang) = item.lang.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        let literal = Literal::new_language_tagged_literal(text, lang)
            .map_err(|e| OntologyError::bad_request(format!("Invalid language tag {}: {}", lang, e)))?;
        return Ok(Some(literal));
    }
    typed_literal(&text, item.datatype.as_deref()).map(Some)
}

fn find_class(graph: &OxigraphGraph, name: &str, what: &str) -> Result<NamedNode> {
    find_entity(graph, name, Some(OWL_CLASS))
        .ok_or_else(|| OntologyError::bad_request(format!("{} \"{}\" not found", what, name)))
}

fn mint(base: &OntologySnapshot, name: &str) -> Result<NamedNode> {
    Ok(base.mint_iri(&sanitize_local_name(name))?)
}

/// Links `property` to `classes` through `predicate`; several classes are
/// combined into one `owl:intersectionOf` class expression.
fn link_classes(
    graph: &mut OxigraphGraph,
    property: &NamedNode,
    predicate: NamedNodeRef<'_>,
    classes: &[NamedNode],
) {
    match classes {
        [] => {}
        [single] => {
            graph.insert(TripleRef::new(property.as_ref(), predicate, single.as_ref()));
        }
        many => {
            let expression = BlankNode::default();
            let list = list_head(graph, many);
            graph.insert(TripleRef::new(expression.as_ref(), TYPE, OWL_CLASS));
            graph.insert(TripleRef::new(expression.as_ref(), INTERSECTION_OF, list.as_ref()));
            graph.insert(TripleRef::new(property.as_ref(), predicate, expression.as_ref()));
        }
    }
}

/// Inserts an `rdf:List` of `items` and returns the blank node at its head.
fn list_head(graph: &mut OxigraphGraph, items: &[NamedNode]) -> BlankNode {
    let cells: Vec<BlankNode> = items.iter().map(|_| BlankNode::default()).collect();
    for (i, (cell, item)) in cells.iter().zip(items.iter()).enumerate() {
        graph.insert(TripleRef::new(cell.as_ref(), FIRST, item.as_ref()));
        match cells.get(i + 1) {
            Some(next) => graph.insert(TripleRef::new(cell.as_ref(), REST, next.as_ref())),
            None => graph.insert(TripleRef::new(cell.as_ref(), REST, NIL)),
        };
    }
    cells.first().cloned().unwrap_or_default()
}

fn has_characteristic(characteristics: &[String], name: &str) -> bool {
    characteristics.iter().any(|c| c.trim().eq_ignore_ascii_case(name))
}

/// Declares `name` as an `owl:Class` under `parents` (or `owl:Thing`).
pub fn create_class(base: &OntologySnapshot, graph: &mut OxigraphGraph, req: &NewClass) -> Result<NamedNode> {
    let name = required(&req.name, "Class name is required")?;
    let parents = req
        .parents
        .iter()
        .map(|p| find_class(graph, p, "Parent class"))
        .collect::<Result<Vec<_>>>()?;
    let class = mint(base, name)?;
    graph.insert(TripleRef::new(class.as_ref(), TYPE, OWL_CLASS));
    if sanitize_local_name(name) != name {
        graph.insert(TripleRef::new(class.as_ref(), LABEL, Literal::new_simple_literal(name).as_ref()));
    }
    if parents.is_empty() {
        graph.insert(TripleRef::new(class.as_ref(), SUB_CLASS_OF, THING));
    }
    for parent in parents.iter() {
        graph.insert(TripleRef::new(class.as_ref(), SUB_CLASS_OF, parent.as_ref()));
    }
    info!("Created class {} with {} parents", class, parents.len());
    Ok(class)
}

/// Creates a named individual. The IRI comes from the sanitized name, with a
/// numeric suffix when it is already taken; the given name becomes its label.
pub fn create_individual(
    base: &OntologySnapshot,
    graph: &mut OxigraphGraph,
    req: &NewIndividual,
) -> Result<NamedNode> {
    let name = required(&req.name, "Individual name is required")?;
    if req.classes.is_empty() {
        return Err(OntologyError::bad_request("At least one class must be given"));
    }
    let classes = req
        .classes
        .iter()
        .map(|c| find_class(graph, c, "Class"))
        .collect::<Result<Vec<_>>>()?;

    let local = sanitize_local_name(name);
    let mut individual = base.mint_iri(&local)?;
    let mut suffix = 0;
    while has_subject(graph, individual.as_ref()) {
        suffix += 1;
        individual = base.mint_iri(&format!("{}_{}", local, suffix))?;
    }

    graph.insert(TripleRef::new(individual.as_ref(), TYPE, NAMED_INDIVIDUAL));
    for class in classes.iter() {
        graph.insert(TripleRef::new(individual.as_ref(), TYPE, class.as_ref()));
    }
    graph.insert(TripleRef::new(individual.as_ref(), LABEL, Literal::new_simple_literal(name).as_ref()));

    for (prop_name, values) in req.properties.iter() {
        let Some(prop) = find_entity(graph, prop_name, Some(DATATYPE_PROPERTY)) else {
            debug!("Skipping unknown data property {}", prop_name);
            continue;
        };
        let mut literals = Vec::new();
        for item in values.iter() {
            if let Some(literal) = data_literal(item)? {
                literals.push(literal);
            }
        }
        if is_a(graph, prop.as_ref().into(), FUNCTIONAL_PROPERTY) {
            literals.truncate(1);
        }
        for literal in literals.iter() {
            graph.insert(TripleRef::new(individual.as_ref(), prop.as_ref(), literal.as_ref()));
        }
    }

    for (prop_name, targets) in req.object_properties.iter() {
        let Some(prop) = find_entity(graph, prop_name, Some(OBJECT_PROPERTY)) else {
            debug!("Skipping unknown object property {}", prop_name);
            continue;
        };
        for target in targets.iter() {
            match find_entity(graph, target, None) {
                Some(target) => {
                    graph.insert(TripleRef::new(individual.as_ref(), prop.as_ref(), target.as_ref()));
                }
                None => debug!("Skipping unknown target {}", target),
            }
        }
    }

    for (prop_name, values) in req.annotations.iter() {
        let Some(prop) = find_entity(graph, prop_name, Some(ANNOTATION_PROPERTY)) else {
            debug!("Skipping unknown annotation property {}", prop_name);
            continue;
        };
        for text in values.iter().filter_map(value_text) {
            graph.insert(TripleRef::new(individual.as_ref(), prop.as_ref(), Literal::new_simple_literal(text).as_ref()));
        }
    }

    for extra in req.description.types.iter() {
        if let Some(class) = find_entity(graph, extra, Some(OWL_CLASS)) {
            graph.insert(TripleRef::new(individual.as_ref(), TYPE, class.as_ref()));
        }
    }
    for (names, predicate) in [(&req.same_as, SAME_AS), (&req.different_from, DIFFERENT_FROM)] {
        for other in names.iter() {
            if let Some(other) = find_entity(graph, other, None) {
                graph.insert(TripleRef::new(individual.as_ref(), predicate, other.as_ref()));
            }
        }
    }
    info!("Created individual {}", individual);
    Ok(individual)
}

pub fn create_object_property(
    base: &OntologySnapshot,
    graph: &mut OxigraphGraph,
    req: &NewObjectProperty,
) -> Result<NamedNode> {
    let name = required(&req.property_name, "Property name is required")?;
    let domains = req
        .domain
        .iter()
        .map(|d| find_class(graph, d, "Domain"))
        .collect::<Result<Vec<_>>>()?;
    let ranges = req
        .range
        .iter()
        .map(|r| find_class(graph, r, "Range"))
        .collect::<Result<Vec<_>>>()?;
    let property = mint(base, name)?;
    graph.insert(TripleRef::new(property.as_ref(), TYPE, OBJECT_PROPERTY));
    link_classes(graph, &property, DOMAIN, &domains);
    link_classes(graph, &property, RANGE, &ranges);
    for (characteristic, class) in [
        ("functional", FUNCTIONAL_PROPERTY),
        ("transitive", TRANSITIVE_PROPERTY),
        ("symmetric", SYMMETRIC_PROPERTY),
    ] {
        if has_characteristic(&req.characteristics, characteristic) {
            graph.insert(TripleRef::new(property.as_ref(), TYPE, class));
        }
    }
    info!("Created object property {}", property);
    Ok(property)
}

pub fn create_data_property(
    base: &OntologySnapshot,
    graph: &mut OxigraphGraph,
    req: &NewDataProperty,
) -> Result<NamedNode> {
    let name = required(&req.property_name, "Property name is required")?;
    let range_name = required(req.range.as_deref().unwrap_or(""), "Data range is required")?;
    let range = data_range(range_name)
        .ok_or_else(|| OntologyError::bad_request(format!("Data range \"{}\" is not supported", range_name)))?;
    let domains = req
        .domain
        .iter()
        .map(|d| find_class(graph, d, "Domain"))
        .collect::<Result<Vec<_>>>()?;
    let property = mint(base, name)?;
    graph.insert(TripleRef::new(property.as_ref(), TYPE, DATATYPE_PROPERTY));
    link_classes(graph, &property, DOMAIN, &domains);
    graph.insert(TripleRef::new(property.as_ref(), RANGE, range));
    if has_characteristic(&req.characteristics, "functional") {
        graph.insert(TripleRef::new(property.as_ref(), TYPE, FUNCTIONAL_PROPERTY));
    }
    info!("Created data property {} with range {}", property, range);
    Ok(property)
}

/// Unknown domain classes are skipped rather than rejected.
pub fn create_annotation_property(
    base: &OntologySnapshot,
    graph: &mut OxigraphGraph,
    req: &NewAnnotationProperty,
) -> Result<NamedNode> {
    let name = required(&req.name, "Name is required")?;
    let property = mint(base, name)?;
    graph.insert(TripleRef::new(property.as_ref(), TYPE, ANNOTATION_PROPERTY));
    for domain in req.domain.iter().filter(|d| !d.trim().is_empty()) {
        match find_entity(graph, domain, Some(OWL_CLASS)) {
            Some(class) => {
                graph.insert(TripleRef::new(property.as_ref(), DOMAIN, class.as_ref()));
            }
            None => warn!("Annotation property domain {} not found", domain),
        }
    }
    info!("Created annotation property {}", property);
    Ok(property)
}

fn resolve_named(graph: &OxigraphGraph, name: &str, what: &str) -> Result<NamedNode> {
    resolve(graph, name).ok_or_else(|| OntologyError::not_found(format!("{} \"{}\" not found", what, name)))
}

/// Adds, removes or replaces one object property assertion.
pub fn change_relationship(graph: &mut OxigraphGraph, req: &RelationshipChange) -> Result<RelationshipAction> {
    let given = |v: &Option<String>| v.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
    let (Some(subject_name), Some(property_name), Some(action)) =
        (given(&req.subject), given(&req.object_property), given(&req.action))
    else {
        return Err(OntologyError::bad_request("Missing required parameters"));
    };
    let subject = resolve_named(graph, &subject_name, "Subject individual")?;
    let property = find_entity(graph, &property_name, Some(OBJECT_PROPERTY)).ok_or_else(|| {
        OntologyError::bad_request(format!(
            "Property \"{}\" not found or not an ObjectProperty",
            property_name
        ))
    })?;
    let action: RelationshipAction = action.parse()?;
    let target_name = given(&req.target).unwrap_or_default();

    match action {
        RelationshipAction::Add => {
            let target = resolve_named(graph, &target_name, "Target individual")?;
            graph.insert(TripleRef::new(subject.as_ref(), property.as_ref(), target.as_ref()));
        }
        RelationshipAction::Remove => {
            let target = resolve_named(graph, &target_name, "Target individual")?;
            if !graph.remove(TripleRef::new(subject.as_ref(), property.as_ref(), target.as_ref())) {
                return Err(OntologyError::Conflict(format!(
                    "Relationship between \"{}\" and \"{}\" via \"{}\" not found",
                    subject_name, target_name, property_name
                )));
            }
        }
        RelationshipAction::Replace => {
            let Some(replacement_name) = given(&req.replace_with) else {
                return Err(OntologyError::bad_request(
                    "\"replace_with\" is required for the replace action",
                ));
            };
            let old = resolve_named(graph, &target_name, "Target individual")?;
            let new = resolve_named(graph, &replacement_name, "Replacement individual")?;
            if !graph.remove(TripleRef::new(subject.as_ref(), property.as_ref(), old.as_ref())) {
                return Err(OntologyError::Conflict(format!(
                    "Original relationship between \"{}\" and \"{}\" not found",
                    subject_name, target_name
                )));
            }
            graph.insert(TripleRef::new(subject.as_ref(), property.as_ref(), new.as_ref()));
        }
    }
    info!("Relationship {:?}: {} {} {}", action, subject, property, target_name);
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_range_mapping() {
        assert_eq!(data_range("int"), Some(XSD_INTEGER));
        assert_eq!(data_range("xsd:float"), Some(XSD_DECIMAL));
        assert_eq!(data_range("XSD:DateTime"), Some(XSD_DATE_TIME));
        assert_eq!(data_range("locstr"), Some(PLAIN_LITERAL));
        assert_eq!(data_range("complex"), None);
    }

    #[test]
    fn test_data_literals() {
        let int = DataValue {
            value: Value::from("42"),
            datatype: Some("xsd:integer".to_string()),
            ..Default::default()
        };
        assert_eq!(data_literal(&int).unwrap(), Some(Literal::from(42i64)));
        let tagged = DataValue {
            value: Value::from("poço"),
            lang: Some("pt".to_string()),
            ..Default::default()
        };
        let literal = data_literal(&tagged).unwrap().unwrap();
        assert_eq!(literal.language(), Some("pt"));
        let boolean = DataValue {
            value: Value::from(true),
            datatype: Some("xsd:boolean".to_string()),
            ..Default::default()
        };
        assert_eq!(data_literal(&boolean).unwrap(), Some(Literal::from(true)));
        assert_eq!(data_literal(&DataValue::default()).unwrap(), None);
    }

    #[test]
    fn test_unknown_action() {
        assert!(matches!(
            "rename".parse::<RelationshipAction>(),
            Err(OntologyError::BadRequest(_))
        ));
        assert_eq!("Replace".parse::<RelationshipAction>().unwrap(), RelationshipAction::Replace);
    }
}
