//! Read-only views of a snapshot for the ontology management endpoints: the
//! class tree, property listings and individuals.

use crate::consts::*;
use crate::names::local_name;
use crate::ontology::{is_a, labels_of, named_subjects, types_of};
use crate::traversal::node_str;
use lazy_static::lazy_static;
use oxigraph::model::{Graph as OxigraphGraph, NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use petgraph::graph::{Graph as DiGraph, NodeIndex};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

lazy_static! {
    static ref WELL_TYPE: Regex = Regex::new(r"(?i)\b(well|po[cç]o)\b").unwrap();
}

// guards against malformed or cyclic rdf:List structures
const MAX_LIST_LENGTH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassNode {
    pub name: String,
    pub children: Vec<ClassNode>,
}

/// A domain or range entry: a named class, or the members of an
/// intersection or union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClassExpression {
    Named(String),
    Composite(Vec<ClassExpression>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyView {
    pub name: String,
    pub iri: String,
    pub label: Option<String>,
    pub domain: Vec<ClassExpression>,
    pub range: Vec<ClassExpression>,
    pub is_functional: bool,
    pub is_transitive: bool,
    pub is_symmetric: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndividualView {
    pub iri: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub types_local: Vec<String>,
    pub is_well: bool,
    pub name: String,
    pub label: Option<Vec<String>>,
    pub properties: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologySummary {
    pub classes: Vec<ClassNode>,
    pub classes_count: usize,
    pub object_properties: Vec<PropertyView>,
    pub data_properties: Vec<PropertyView>,
    pub annotation_properties: Vec<PropertyView>,
    pub individuals: Vec<IndividualView>,
    pub datatypes: Vec<String>,
}

fn declared<'a>(graph: &'a OxigraphGraph, kind: NamedNodeRef<'a>) -> Vec<NamedNodeRef<'a>> {
    let declared: HashSet<NamedNodeRef<'a>> = graph
        .subjects_for_predicate_object(TYPE, kind)
        .filter_map(|s| match s {
            NamedOrBlankNodeRef::NamedNode(n) => Some(n),
            _ => None,
        })
        .collect();
    named_subjects(graph)
        .into_iter()
        .filter(|s| declared.contains(s))
        .collect()
}

/// Named `owl:Class` subjects other than `owl:Thing`, in IRI order.
pub fn classes(graph: &OxigraphGraph) -> Vec<NamedNodeRef<'_>> {
    declared(graph, OWL_CLASS)
        .into_iter()
        .filter(|c| *c != THING)
        .collect()
}

/// The subclass forest. Roots are classes with no named parent; if every
/// class has one, all classes are listed as roots.
pub fn class_hierarchy(graph: &OxigraphGraph) -> Vec<ClassNode> {
    let classes = classes(graph);
    let mut tree: DiGraph<NamedNodeRef<'_>, (), petgraph::Directed> = DiGraph::new();
    let mut index: HashMap<NamedNodeRef<'_>, NodeIndex> = HashMap::new();
    for class in classes.iter() {
        index.insert(*class, tree.add_node(*class));
    }
    for class in classes.iter() {
        for parent in graph.objects_for_subject_predicate(*class, SUB_CLASS_OF) {
            if let TermRef::NamedNode(parent) = parent {
                if let (Some(p), Some(c)) = (index.get(&parent), index.get(class)) {
                    if p != c {
                        tree.update_edge(*p, *c, ());
                    }
                }
            }
        }
    }

    let mut roots: Vec<NodeIndex> = tree
        .node_indices()
        .filter(|i| {
            tree.neighbors_directed(*i, petgraph::Direction::Incoming)
                .next()
                .is_none()
        })
        .collect();
    if roots.is_empty() {
        roots = tree.node_indices().collect();
    }

    fn build(
        tree: &DiGraph<NamedNodeRef<'_>, (), petgraph::Directed>,
        idx: NodeIndex,
        path: &mut Vec<NodeIndex>,
    ) -> ClassNode {
        path.push(idx);
        let mut children: Vec<ClassNode> = tree
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .filter(|child| !path.contains(child))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|child| build(tree, child, path))
            .collect();
        path.pop();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        ClassNode {
            name: local_name(tree[idx].as_str()).to_string(),
            children,
        }
    }

    let mut forest: Vec<ClassNode> = roots
        .into_iter()
        .map(|root| build(&tree, root, &mut Vec::new()))
        .collect();
    forest.sort_by(|a, b| a.name.cmp(&b.name));
    forest
}

fn rdf_list<'a>(graph: &'a OxigraphGraph, head: TermRef<'a>) -> Vec<TermRef<'a>> {
    let mut items = Vec::new();
    let mut node = head;
    while items.len() < MAX_LIST_LENGTH {
        let subject = match node {
            TermRef::NamedNode(n) if n == NIL => break,
            TermRef::NamedNode(n) => NamedOrBlankNodeRef::from(n),
            TermRef::BlankNode(b) => NamedOrBlankNodeRef::from(b),
            _ => break,
        };
        match graph.object_for_subject_predicate(subject, FIRST) {
            Some(item) => items.push(item),
            None => break,
        }
        match graph.object_for_subject_predicate(subject, REST) {
            Some(rest) => node = rest,
            None => break,
        }
    }
    items
}

fn class_expression(graph: &OxigraphGraph, term: TermRef<'_>) -> ClassExpression {
    if let TermRef::BlankNode(b) = term {
        for operator in [INTERSECTION_OF, UNION_OF] {
            if let Some(list) = graph.object_for_subject_predicate(b, operator) {
                return ClassExpression::Composite(
                    rdf_list(graph, list)
                        .into_iter()
                        .map(|member| class_expression(graph, member))
                        .collect(),
                );
            }
        }
    }
    match term {
        TermRef::NamedNode(n) => ClassExpression::Named(local_name(n.as_str()).to_string()),
        other => ClassExpression::Named(node_str(other)),
    }
}

fn first_label(graph: &OxigraphGraph, node: NamedNodeRef<'_>) -> Option<String> {
    labels_of(graph, node.into()).first().map(|l| l.to_string())
}

/// Every property declared with `kind` (e.g. `owl:ObjectProperty`).
pub fn properties(graph: &OxigraphGraph, kind: NamedNodeRef<'_>) -> Vec<PropertyView> {
    declared(graph, kind)
        .into_iter()
        .map(|p| PropertyView {
            name: local_name(p.as_str()).to_string(),
            iri: p.as_str().to_string(),
            label: first_label(graph, p),
            domain: graph
                .objects_for_subject_predicate(p, DOMAIN)
                .map(|d| class_expression(graph, d))
                .collect(),
            range: graph
                .objects_for_subject_predicate(p, RANGE)
                .map(|r| class_expression(graph, r))
                .collect(),
            is_functional: is_a(graph, p.into(), FUNCTIONAL_PROPERTY),
            is_transitive: is_a(graph, p.into(), TRANSITIVE_PROPERTY),
            is_symmetric: is_a(graph, p.into(), SYMMETRIC_PROPERTY),
        })
        .collect()
}

fn is_individual(graph: &OxigraphGraph, subject: NamedNodeRef<'_>) -> bool {
    let types = types_of(graph, subject.into());
    if types.contains(&NAMED_INDIVIDUAL) {
        return true;
    }
    if types.iter().any(|t| SCHEMA_CLASSES.contains(t)) {
        return false;
    }
    types.iter().any(|t| is_a(graph, (*t).into(), OWL_CLASS))
}

pub fn individual_view(graph: &OxigraphGraph, subject: NamedNodeRef<'_>) -> IndividualView {
    let mut types = Vec::new();
    let mut types_local = Vec::new();
    let mut properties: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for triple in graph.triples_for_subject(subject) {
        if triple.predicate == TYPE {
            match triple.object {
                TermRef::NamedNode(t) if t == NAMED_INDIVIDUAL => {}
                TermRef::NamedNode(t) => {
                    types.push(local_name(t.as_str()).to_string());
                    types_local.push(local_name(t.as_str()).to_string());
                }
                other => types.push(node_str(other)),
            }
            continue;
        }
        if triple.predicate == LABEL {
            continue;
        }
        let value = match triple.object {
            TermRef::NamedNode(n) => local_name(n.as_str()).to_string(),
            other => node_str(other),
        };
        properties
            .entry(local_name(triple.predicate.as_str()).to_string())
            .or_default()
            .push(value);
    }
    let labels: Vec<String> = labels_of(graph, subject.into())
        .into_iter()
        .map(str::to_string)
        .collect();
    IndividualView {
        iri: subject.as_str().to_string(),
        is_well: types
            .iter()
            .chain(types_local.iter())
            .any(|t| WELL_TYPE.is_match(t)),
        types,
        types_local,
        name: local_name(subject.as_str()).to_string(),
        label: if labels.is_empty() { None } else { Some(labels) },
        properties,
    }
}

/// Named subjects typed `owl:NamedIndividual` or with a declared class.
pub fn individuals(graph: &OxigraphGraph) -> Vec<IndividualView> {
    named_subjects(graph)
        .into_iter()
        .filter(|s| is_individual(graph, *s))
        .map(|s| individual_view(graph, s))
        .collect()
}

/// The base datatypes plus every XSD range used by a data property.
pub fn datatypes(graph: &OxigraphGraph) -> Vec<String> {
    let mut datatypes: BTreeSet<String> = BASE_DATATYPES.iter().map(|d| d.to_string()).collect();
    for p in declared(graph, DATATYPE_PROPERTY) {
        for range in graph.objects_for_subject_predicate(p, RANGE) {
            if let TermRef::NamedNode(r) = range {
                if let Some(local) = r.as_str().strip_prefix(XSD_NAMESPACE) {
                    datatypes.insert(format!("xsd:{}", local));
                }
            }
        }
    }
    datatypes.into_iter().collect()
}

pub fn summary(graph: &OxigraphGraph) -> OntologySummary {
    OntologySummary {
        classes: class_hierarchy(graph),
        classes_count: classes(graph).len(),
        object_properties: properties(graph, OBJECT_PROPERTY),
        data_properties: properties(graph, DATATYPE_PROPERTY),
        annotation_properties: properties(graph, ANNOTATION_PROPERTY),
        individuals: individuals(graph),
        datatypes: datatypes(graph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse_graph;
    use oxigraph::io::RdfFormat;

    const TTL: &str = r#"
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        @prefix ex: <http://example.org/plant#> .
        ex:Asset a owl:Class .
        ex:Well a owl:Class ; rdfs:subClassOf ex:Asset .
        ex:Platform a owl:Class ; rdfs:subClassOf ex:Asset .
        ex:Loop a owl:Class ; rdfs:subClassOf ex:Loop .
        ex:connected_to a owl:ObjectProperty , owl:SymmetricProperty ;
            rdfs:domain [ a owl:Class ; owl:unionOf ( ex:Well ex:Platform ) ] ;
            rdfs:range ex:Platform .
        ex:depth a owl:DatatypeProperty ; rdfs:range xsd:decimal .
        ex:W1 a owl:NamedIndividual , ex:Well ;
            rdfs:label "Poço 1" ;
            ex:connected_to ex:P1 ;
            ex:depth 1200.5 .
        ex:P1 a ex:Platform .
    "#;

    fn graph() -> OxigraphGraph {
        parse_graph(TTL.as_bytes(), Some(RdfFormat::Turtle)).unwrap().0
    }

    #[test]
    fn test_class_hierarchy() {
        let g = graph();
        let forest = class_hierarchy(&g);
        let names: Vec<&str> = forest.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Asset", "Loop"]);
        let children: Vec<&str> = forest[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, vec!["Platform", "Well"]);
        assert!(forest[1].children.is_empty());
        assert_eq!(classes(&g).len(), 4);
    }

    #[test]
    fn test_property_views() {
        let g = graph();
        let object = properties(&g, OBJECT_PROPERTY);
        assert_eq!(object.len(), 1);
        let connected = &object[0];
        assert!(connected.is_symmetric);
        assert!(!connected.is_functional);
        assert_eq!(
            connected.domain,
            vec![ClassExpression::Composite(vec![
                ClassExpression::Named("Well".to_string()),
                ClassExpression::Named("Platform".to_string()),
            ])]
        );
        assert_eq!(connected.range, vec![ClassExpression::Named("Platform".to_string())]);
        assert!(datatypes(&g).contains(&"xsd:decimal".to_string()));
    }

    #[test]
    fn test_individual_views() {
        let g = graph();
        let all = individuals(&g);
        assert_eq!(all.len(), 2);
        // subjects are listed in IRI order
        assert_eq!(all[0].name, "P1");
        assert!(!all[0].is_well);
        let w1 = &all[1];
        assert_eq!(w1.name, "W1");
        assert_eq!(w1.types_local, vec!["Well"]);
        assert!(w1.is_well);
        assert_eq!(w1.label, Some(vec!["Poço 1".to_string()]));
        assert_eq!(w1.properties["connected_to"], vec!["P1"]);
        assert_eq!(w1.properties["depth"], vec!["1200.5"]);
    }
}
