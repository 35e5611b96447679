use ontotag::catalog::{individual_view, properties, ClassExpression};
use ontotag::config::Config;
use ontotag::edit::{
    change_relationship, create_annotation_property, create_class, create_data_property,
    create_individual, create_object_property, DataValue, NewAnnotationProperty, NewClass,
    NewDataProperty, NewIndividual, NewObjectProperty, RelationshipAction, RelationshipChange,
};
use ontotag::ontology::{OntologyLocation, OntologySnapshot};
use ontotag::store::OntologyStore;
use ontotag::OntologyError;
use oxigraph::model::{NamedNodeRef, TripleRef};
use serde_json::json;
use std::collections::BTreeMap;

const PLANT: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix : <http://example.org/plant#> .

<http://example.org/plant> a owl:Ontology .
:Equipment a owl:Class .
:Well a owl:Class ; rdfs:subClassOf :Equipment .
:Platform a owl:Class ; rdfs:label "Plataforma" .
:connectedTo a owl:ObjectProperty .
:depth a owl:DatatypeProperty , owl:FunctionalProperty .
:note a owl:AnnotationProperty .
:W1 a owl:NamedIndividual , :Well .
:P1 a owl:NamedIndividual , :Platform .
:P2 a owl:NamedIndividual , :Platform .
"#;

const PLANT_NS: &str = "http://example.org/plant#";
const RDF_TYPE: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
const SUB_CLASS_OF: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#subClassOf");

/// An in-memory store holding the plant fixture.
fn store() -> OntologyStore {
    let config = Config::builder().persist_edits(false).build().unwrap();
    let store = OntologyStore::new(config);
    let snapshot = OntologySnapshot::from_bytes(
        OntologyLocation::InMemory {
            identifier: "plant.ttl".to_string(),
        },
        PLANT.as_bytes(),
        None,
    )
    .unwrap();
    store.publish(snapshot);
    store
}

fn iri(local: &str) -> String {
    format!("{}{}", PLANT_NS, local)
}

fn contains(snapshot: &OntologySnapshot, s: &str, p: NamedNodeRef<'_>, o: &str) -> bool {
    let s = NamedNodeRef::new(s).unwrap();
    let o = NamedNodeRef::new(o).unwrap();
    snapshot.graph().contains(TripleRef::new(s, p, o))
}

fn connected_to() -> NamedNodeRef<'static> {
    NamedNodeRef::new_unchecked("http://example.org/plant#connectedTo")
}

fn relationship(action: &str, target: &str, replace_with: Option<&str>) -> RelationshipChange {
    RelationshipChange {
        subject: Some("W1".to_string()),
        object_property: Some("connectedTo".to_string()),
        target: Some(target.to_string()),
        action: Some(action.to_string()),
        replace_with: replace_with.map(str::to_string),
    }
}

#[test]
fn test_create_class() {
    let store = store();
    let req = NewClass {
        name: "Gas Lift Valve".to_string(),
        parents: vec!["Equipment".to_string(), "Plataforma".to_string()],
    };
    let (class, snapshot) = store
        .edit(|base, graph| create_class(base, graph, &req))
        .unwrap();
    assert_eq!(class.as_str(), iri("Gas_Lift_Valve"));
    assert!(contains(&snapshot, class.as_str(), SUB_CLASS_OF, &iri("Equipment")));
    assert!(contains(&snapshot, class.as_str(), SUB_CLASS_OF, &iri("Platform")));

    let root = NewClass {
        name: "Sensor".to_string(),
        parents: vec![],
    };
    let (sensor, snapshot) = store
        .edit(|base, graph| create_class(base, graph, &root))
        .unwrap();
    assert!(contains(
        &snapshot,
        sensor.as_str(),
        SUB_CLASS_OF,
        "http://www.w3.org/2002/07/owl#Thing"
    ));
}

#[test]
fn test_create_class_with_unknown_parent() {
    let store = store();
    let version = store.version();
    let req = NewClass {
        name: "Valve".to_string(),
        parents: vec!["Nope".to_string()],
    };
    let err = store
        .edit(|base, graph| create_class(base, graph, &req))
        .unwrap_err();
    assert!(matches!(err, OntologyError::BadRequest(_)));
    assert_eq!(store.version(), version);

    let unnamed = NewClass::default();
    let err = store
        .edit(|base, graph| create_class(base, graph, &unnamed))
        .unwrap_err();
    assert!(matches!(err, OntologyError::BadRequest(_)));
}

#[test]
fn test_create_individual() {
    let store = store();
    let mut data = BTreeMap::new();
    data.insert(
        "depth".to_string(),
        vec![
            DataValue {
                value: json!("2500"),
                datatype: Some("xsd:integer".to_string()),
                ..Default::default()
            },
            DataValue {
                value: json!("2600"),
                datatype: Some("xsd:integer".to_string()),
                ..Default::default()
            },
        ],
    );
    data.insert("unknown".to_string(), vec![DataValue::default()]);
    let mut links = BTreeMap::new();
    links.insert("connectedTo".to_string(), vec!["P1".to_string(), "P9".to_string()]);
    let mut notes = BTreeMap::new();
    notes.insert("note".to_string(), vec![json!("drilled in 2019")]);
    let req = NewIndividual {
        name: "W1".to_string(),
        classes: vec!["Well".to_string()],
        properties: data,
        object_properties: links,
        annotations: notes,
        same_as: vec!["W1".to_string()],
        ..Default::default()
    };

    let (individual, snapshot) = store
        .edit(|base, graph| create_individual(base, graph, &req))
        .unwrap();
    // W1 is taken, so the new individual gets a suffix
    assert_eq!(individual.as_str(), iri("W1_1"));

    let view = individual_view(snapshot.graph(), individual.as_ref());
    assert!(view.types_local.contains(&"Well".to_string()));
    assert!(view.is_well);
    assert_eq!(view.label, Some(vec!["W1".to_string()]));
    // depth is functional, so only the first value is kept
    assert_eq!(view.properties.get("depth").map(Vec::len), Some(1));
    assert_eq!(view.properties.get("connectedTo"), Some(&vec!["P1".to_string()]));
    assert_eq!(
        view.properties.get("note"),
        Some(&vec!["drilled in 2019".to_string()])
    );
    assert!(contains(
        &snapshot,
        individual.as_str(),
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#sameAs"),
        &iri("W1")
    ));

    let again = NewIndividual {
        name: "W1".to_string(),
        classes: vec!["Well".to_string()],
        ..Default::default()
    };
    let (second, _) = store
        .edit(|base, graph| create_individual(base, graph, &again))
        .unwrap();
    assert_eq!(second.as_str(), iri("W1_2"));
}

#[test]
fn test_create_individual_requires_class() {
    let store = store();
    let req = NewIndividual {
        name: "W5".to_string(),
        ..Default::default()
    };
    let err = store
        .edit(|base, graph| create_individual(base, graph, &req))
        .unwrap_err();
    assert!(matches!(err, OntologyError::BadRequest(_)));
}

#[test]
fn test_create_object_property() {
    let store = store();
    let req = NewObjectProperty {
        property_name: "feeds".to_string(),
        domain: vec!["Well".to_string(), "Equipment".to_string()],
        range: vec!["Platform".to_string()],
        characteristics: vec!["Transitive".to_string()],
    };
    let (property, snapshot) = store
        .edit(|base, graph| create_object_property(base, graph, &req))
        .unwrap();
    assert_eq!(property.as_str(), iri("feeds"));

    let views = properties(
        snapshot.graph(),
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty"),
    );
    let feeds = views.iter().find(|p| p.name == "feeds").unwrap();
    assert!(feeds.is_transitive);
    assert!(!feeds.is_functional);
    assert_eq!(feeds.range, vec![ClassExpression::Named("Platform".to_string())]);
    match feeds.domain.as_slice() {
        [ClassExpression::Composite(parts)] => assert_eq!(parts.len(), 2),
        other => panic!("expected an intersection domain, got {:?}", other),
    }
}

#[test]
fn test_create_data_property() {
    let store = store();
    let req = NewDataProperty {
        property_name: "pressure".to_string(),
        domain: vec!["Well".to_string()],
        range: Some("float".to_string()),
        characteristics: vec!["functional".to_string()],
    };
    let (property, snapshot) = store
        .edit(|base, graph| create_data_property(base, graph, &req))
        .unwrap();
    assert!(contains(
        &snapshot,
        property.as_str(),
        NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#range"),
        "http://www.w3.org/2001/XMLSchema#decimal"
    ));
    assert!(contains(
        &snapshot,
        property.as_str(),
        RDF_TYPE,
        "http://www.w3.org/2002/07/owl#FunctionalProperty"
    ));

    for range in [None, Some("complex".to_string())] {
        let req = NewDataProperty {
            property_name: "temperature".to_string(),
            range,
            ..Default::default()
        };
        let err = store
            .edit(|base, graph| create_data_property(base, graph, &req))
            .unwrap_err();
        assert!(matches!(err, OntologyError::BadRequest(_)));
    }
}

#[test]
fn test_create_annotation_property() {
    let store = store();
    let req = NewAnnotationProperty {
        name: "source".to_string(),
        domain: vec!["Well".to_string(), "Missing".to_string()],
    };
    let (property, snapshot) = store
        .edit(|base, graph| create_annotation_property(base, graph, &req))
        .unwrap();
    assert!(contains(
        &snapshot,
        property.as_str(),
        RDF_TYPE,
        "http://www.w3.org/2002/07/owl#AnnotationProperty"
    ));
    assert!(contains(
        &snapshot,
        property.as_str(),
        NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#domain"),
        &iri("Well")
    ));
}

#[test]
fn test_relationship_add_replace_remove() {
    let store = store();
    let (action, snapshot) = store
        .edit(|_, graph| change_relationship(graph, &relationship("add", "P1", None)))
        .unwrap();
    assert_eq!(action, RelationshipAction::Add);
    assert!(contains(&snapshot, &iri("W1"), connected_to(), &iri("P1")));

    let (_, snapshot) = store
        .edit(|_, graph| change_relationship(graph, &relationship("replace", "P1", Some("P2"))))
        .unwrap();
    assert!(!contains(&snapshot, &iri("W1"), connected_to(), &iri("P1")));
    assert!(contains(&snapshot, &iri("W1"), connected_to(), &iri("P2")));

    let (_, snapshot) = store
        .edit(|_, graph| change_relationship(graph, &relationship("Remove", "P2", None)))
        .unwrap();
    assert!(!contains(&snapshot, &iri("W1"), connected_to(), &iri("P2")));
}

#[test]
fn test_relationship_errors() {
    let store = store();
    let version = store.version();
    let attempt = |change: RelationshipChange| {
        store
            .edit(|_, graph| change_relationship(graph, &change))
            .unwrap_err()
    };

    let err = attempt(relationship("remove", "P1", None));
    assert!(matches!(err, OntologyError::Conflict(_)), "{:?}", err);

    let err = attempt(relationship("replace", "P1", None));
    assert!(matches!(err, OntologyError::BadRequest(_)), "{:?}", err);

    let err = attempt(relationship("replace", "P1", Some("P2")));
    assert!(matches!(err, OntologyError::Conflict(_)), "{:?}", err);

    let err = attempt(relationship("toggle", "P1", None));
    assert!(matches!(err, OntologyError::BadRequest(_)), "{:?}", err);

    let err = attempt(relationship("add", "P9", None));
    assert!(matches!(err, OntologyError::NotFound { .. }), "{:?}", err);

    let mut unknown_subject = relationship("add", "P1", None);
    unknown_subject.subject = Some("W9".to_string());
    let err = attempt(unknown_subject);
    assert!(matches!(err, OntologyError::NotFound { .. }), "{:?}", err);

    let mut data_property = relationship("add", "P1", None);
    data_property.object_property = Some("depth".to_string());
    let err = attempt(data_property);
    assert!(matches!(err, OntologyError::BadRequest(_)), "{:?}", err);

    let err = attempt(RelationshipChange {
        subject: Some("W1".to_string()),
        ..Default::default()
    });
    assert!(matches!(err, OntologyError::BadRequest(_)), "{:?}", err);

    assert_eq!(store.version(), version);
}
