//! Maps user-supplied identifiers (IRIs, labels, local names) to graph
//! subjects.

use crate::consts::LABEL;
use crate::names::{local_name, normalize_identifier, strip_brackets, strip_prefixed_local};
use crate::ontology::{has_subject, is_a, labels_of, named_subjects};
use log::debug;
use oxigraph::model::{
    Graph as OxigraphGraph, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, TermRef,
};
use serde::Serialize;

/// Which rule picked the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Iri,
    Label,
    LocalName,
}

/// Resolves `identifier` to a subject of `graph`; see [`resolve_with_rule`].
pub fn resolve(graph: &OxigraphGraph, identifier: &str) -> Option<NamedNode> {
    resolve_with_rule(graph, identifier).map(|(node, _)| node)
}

/// Tries, in order: the identifier as a subject IRI, an exact `rdfs:label`
/// match, then a scan of named subjects comparing their local name against
/// the identifier, its prefix-stripped local part and its normalized form.
/// Subjects are scanned in IRI order.
pub fn resolve_with_rule(graph: &OxigraphGraph, identifier: &str) -> Option<(NamedNode, Resolution)> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }

    if let Ok(node) = NamedNodeRef::new(strip_brackets(identifier)) {
        if has_subject(graph, node) {
            debug!("Resolved {} as subject IRI", identifier);
            return Some((node.into_owned(), Resolution::Iri));
        }
    }

    // smallest IRI wins when several subjects share the label
    let labelled = graph
        .triples_for_predicate(LABEL)
        .filter_map(|t| match (t.subject, t.object) {
            (NamedOrBlankNodeRef::NamedNode(subject), TermRef::Literal(label))
                if label.value() == identifier =>
            {
                Some(subject)
            }
            _ => None,
        })
        .min();
    if let Some(subject) = labelled {
        debug!("Resolved {} by label to {}", identifier, subject);
        return Some((subject.into_owned(), Resolution::Label));
    }

    let normalized = normalize_identifier(identifier);
    let forms: Vec<&str> = [identifier, strip_prefixed_local(identifier), normalized.as_str()]
        .into_iter()
        .filter(|f| !f.is_empty())
        .collect();
    let found = named_subjects(graph)
        .into_iter()
        .find(|subject| forms.contains(&local_name(subject.as_str())));
    match found {
        Some(subject) => {
            debug!("Resolved {} by local name to {}", identifier, subject);
            Some((subject.into_owned(), Resolution::LocalName))
        }
        None => {
            debug!("Could not resolve {} (forms tried: {:?})", identifier, forms);
            None
        }
    }
}

/// Looks up an entity named in an edit request, optionally restricted to
/// subjects typed `kind`. Matches the full IRI, then the local name, then a
/// label, then any IRI ending with `name`.
pub fn find_entity(
    graph: &OxigraphGraph,
    name: &str,
    kind: Option<NamedNodeRef<'_>>,
) -> Option<NamedNode> {
    let name = strip_brackets(name);
    if name.is_empty() {
        return None;
    }
    let subjects: Vec<NamedNodeRef<'_>> = named_subjects(graph)
        .into_iter()
        .filter(|s| kind.map_or(true, |k| is_a(graph, (*s).into(), k)))
        .collect();
    let local = strip_prefixed_local(name);
    subjects
        .iter()
        .find(|s| s.as_str() == name)
        .or_else(|| subjects.iter().find(|s| local_name(s.as_str()) == local))
        .or_else(|| {
            subjects
                .iter()
                .find(|s| labels_of(graph, (**s).into()).contains(&name))
        })
        .or_else(|| subjects.iter().find(|s| s.as_str().ends_with(name)))
        .map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::OWL_CLASS;
    use crate::util::parse_graph;
    use oxigraph::io::RdfFormat;

    const TTL: &str = r#"
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix ex: <http://example.org/plant#> .
        ex:Well a owl:Class ; rdfs:label "Poço" .
        ex:Poco_A ex:locatedIn ex:P1 .
        ex:P1 rdfs:label "Plataforma 1" .
    "#;

    fn graph() -> OxigraphGraph {
        parse_graph(TTL.as_bytes(), Some(RdfFormat::Turtle)).unwrap().0
    }

    #[test]
    fn test_find_entity_by_kind() {
        let g = graph();
        let well = find_entity(&g, "Well", Some(OWL_CLASS)).unwrap();
        assert_eq!(well.as_str(), "http://example.org/plant#Well");
        assert_eq!(find_entity(&g, "Poço", Some(OWL_CLASS)), Some(well.clone()));
        assert_eq!(find_entity(&g, "ex:Well", None), Some(well));
        assert!(find_entity(&g, "P1", Some(OWL_CLASS)).is_none());
        assert!(find_entity(&g, "", None).is_none());
    }

    #[test]
    fn test_normalized_form_matches() {
        let g = graph();
        let (node, rule) = resolve_with_rule(&g, "Poço A").unwrap();
        assert_eq!(node.as_str(), "http://example.org/plant#Poco_A");
        assert_eq!(rule, Resolution::LocalName);
    }
}
