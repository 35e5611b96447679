//! The three use-case traversals. Each is a nested sweep over candidate
//! IRIs; every hop is an index lookup on the in-memory graph, checked in
//! both edge directions where the ontologies disagree on orientation.

use crate::candidates::CandidateSet;
use crate::consts::TYPE;
use crate::errors::{OntologyError, Result};
use crate::names::local_name;
use crate::options::ProcessMatching;
use log::debug;
use oxigraph::model::{
    Graph as OxigraphGraph, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, TermRef, TripleRef,
};
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Wall-clock deadline for one traversal.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    limit: Duration,
    deadline: Option<Instant>,
}

impl Budget {
    pub fn new(limit: Duration) -> Self {
        Budget {
            limit,
            deadline: Instant::now().checked_add(limit),
        }
    }

    pub fn unlimited() -> Self {
        Budget {
            limit: Duration::MAX,
            deadline: None,
        }
    }

    pub fn check(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(OntologyError::Timeout(self.limit)),
            _ => Ok(()),
        }
    }
}

/// Candidate IRIs for every role a traversal may touch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleCandidates {
    pub measurement: CandidateSet,
    pub component: CandidateSet,
    pub quality: CandidateSet,
    pub tag: CandidateSet,
    pub participation: CandidateSet,
    /// `connected_to` expansions followed by the component candidates
    pub connected: CandidateSet,
    pub process_characteristic: CandidateSet,
    /// tag predicate expansions followed by the `about` expansions
    pub is_about: CandidateSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IcvTagMatch {
    pub file: String,
    pub file_name: String,
    pub icv: String,
    pub icv_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityTagMatch {
    pub tag_iri: String,
    pub tag_name: String,
    pub icv_iri: String,
    pub icv_name: String,
    pub component_predicate_used: String,
    pub quality_predicate_used: String,
    pub measurement_class_tried: String,
    // the tag repeated under the use_case_1 field names
    pub file: String,
    pub file_name: String,
    pub icv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowPredicates {
    #[serde(rename = "processCharacteristic_candidate_used")]
    pub process_characteristic: String,
    #[serde(rename = "isAbout_used")]
    pub is_about: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowTagMatch {
    pub tag_iri: String,
    pub tag_name: String,
    pub flow_iri: String,
    pub flow_name: String,
    pub process_iri: String,
    pub process_name: String,
    pub well_iri: String,
    pub well_name: String,
    pub predicates_used: FlowPredicates,
    pub measurement_class_tried: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Match {
    Icv(IcvTagMatch),
    Quality(QualityTagMatch),
    Flow(FlowTagMatch),
}

/// Wells and processes visited by [`flow_tags_for_platform`].
#[derive(Debug, Clone, Default)]
pub struct WellTrace {
    pub wells: Vec<String>,
    pub processes: Vec<String>,
}

pub(crate) fn node_str(term: TermRef<'_>) -> String {
    match term {
        TermRef::NamedNode(n) => n.as_str().to_string(),
        TermRef::BlankNode(b) => b.to_string(),
        TermRef::Literal(l) => l.value().to_string(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

fn as_subject(term: TermRef<'_>) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        TermRef::NamedNode(n) => Some(n.into()),
        TermRef::BlankNode(b) => Some(b.into()),
        _ => None,
    }
}

/// Nodes `x` with `(x p node)`, then nodes with `(node p x)`, without repeats.
fn linked_nodes<'g>(
    graph: &'g OxigraphGraph,
    node: TermRef<'g>,
    predicate: NamedNodeRef<'g>,
) -> Vec<TermRef<'g>> {
    let mut nodes: Vec<TermRef<'g>> = graph
        .subjects_for_predicate_object(predicate, node)
        .map(TermRef::from)
        .collect();
    if let Some(subject) = as_subject(node) {
        for object in graph.objects_for_subject_predicate(subject, predicate) {
            if !nodes.contains(&object) {
                nodes.push(object);
            }
        }
    }
    nodes
}

/// True if `(a p b)` or `(b p a)` is in the graph.
fn are_linked(graph: &OxigraphGraph, a: TermRef<'_>, predicate: NamedNodeRef<'_>, b: TermRef<'_>) -> bool {
    let forward = as_subject(a).is_some_and(|s| graph.contains(TripleRef::new(s, predicate, b)));
    forward || as_subject(b).is_some_and(|s| graph.contains(TripleRef::new(s, predicate, a)))
}

fn has_any_type(graph: &OxigraphGraph, node: NamedOrBlankNodeRef<'_>, classes: &[NamedNode]) -> bool {
    classes
        .iter()
        .any(|class| graph.contains(TripleRef::new(node, TYPE, class.as_ref())))
}

/// use_case_1: walks outward from the platform. Component edges lead to the
/// ICVs, quality edges lead back to the qualities of each ICV, the qualities
/// are kept when typed with a measurement class, and the tags are whatever
/// points at a kept quality through a tag predicate.
pub fn tags_for_icv_qualities(
    graph: &OxigraphGraph,
    platform: NamedNodeRef<'_>,
    candidates: &RoleCandidates,
    budget: &Budget,
) -> Result<Vec<IcvTagMatch>> {
    budget.check()?;
    let measurement = candidates.measurement.nodes();
    let component = candidates.component.nodes();
    let quality = candidates.quality.nodes();
    let tag = candidates.tag.nodes();

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for c in component.iter() {
        for icv in linked_nodes(graph, platform.into(), c.as_ref()) {
            budget.check()?;
            for q in quality.iter() {
                for anchor in graph.subjects_for_predicate_object(q.as_ref(), icv) {
                    if !has_any_type(graph, anchor, &measurement) {
                        continue;
                    }
                    for t in tag.iter() {
                        for file in graph.subjects_for_predicate_object(t.as_ref(), anchor) {
                            let file = node_str(file.into());
                            let icv = node_str(icv);
                            if !seen.insert((file.clone(), icv.clone())) {
                                continue;
                            }
                            found.push(IcvTagMatch {
                                file_name: local_name(&file).to_string(),
                                icv_name: local_name(&icv).to_string(),
                                file,
                                icv,
                            });
                        }
                    }
                }
            }
        }
    }
    debug!("use_case_1 found {} tags", found.len());
    Ok(found)
}

/// use_case_2: walks inward from every instance of a measurement class. An
/// instance counts when the first component candidate links it to the well
/// in either direction; its tags are the subjects of quality edges into it.
pub fn tags_for_typed_instances(
    graph: &OxigraphGraph,
    well: NamedNodeRef<'_>,
    candidates: &RoleCandidates,
    budget: &Budget,
) -> Result<Vec<QualityTagMatch>> {
    budget.check()?;
    let measurement = candidates.measurement.nodes();
    let component = candidates.component.nodes();
    let quality = candidates.quality.nodes();

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for m in measurement.iter() {
        for instance in graph.subjects_for_predicate_object(TYPE, m.as_ref()) {
            budget.check()?;
            let matched = component
                .iter()
                .find(|c| are_linked(graph, instance.into(), c.as_ref(), well.into()));
            let Some(matched) = matched else {
                continue;
            };
            for q in quality.iter() {
                for tag in graph.subjects_for_predicate_object(q.as_ref(), instance) {
                    let tag_iri = node_str(tag.into());
                    let icv_iri = node_str(instance.into());
                    if !seen.insert((tag_iri.clone(), icv_iri.clone(), q.as_str().to_string())) {
                        continue;
                    }
                    let tag_name = local_name(&tag_iri).to_string();
                    found.push(QualityTagMatch {
                        icv_name: local_name(&icv_iri).to_string(),
                        component_predicate_used: matched.as_str().to_string(),
                        quality_predicate_used: q.as_str().to_string(),
                        measurement_class_tried: m.as_str().to_string(),
                        file: tag_iri.clone(),
                        file_name: tag_name.clone(),
                        icv: icv_iri.clone(),
                        tag_iri,
                        tag_name,
                        icv_iri,
                    });
                }
            }
        }
    }
    debug!("use_case_2 found {} tags", found.len());
    Ok(found)
}

/// Wells linked to the platform through any connected candidate, in
/// discovery order.
fn wells_of<'g>(graph: &'g OxigraphGraph, platform: NamedNodeRef<'g>, connected: &'g [NamedNode]) -> Vec<TermRef<'g>> {
    let mut wells = Vec::new();
    for c in connected.iter() {
        for well in linked_nodes(graph, platform.into(), c.as_ref()) {
            if !wells.contains(&well) {
                wells.push(well);
            }
        }
    }
    wells
}

fn processes_of<'g>(
    graph: &'g OxigraphGraph,
    well: TermRef<'g>,
    participation: &'g [NamedNode],
    matching: ProcessMatching,
) -> Vec<NamedOrBlankNodeRef<'g>> {
    let mut processes = Vec::new();
    for p in participation.iter() {
        for process in graph.subjects_for_predicate_object(p.as_ref(), well) {
            if !processes.contains(&process) {
                processes.push(process);
            }
        }
    }
    if !matching.is_strict() {
        for triple in graph.triples_for_object(well) {
            if !processes.contains(&triple.subject) {
                processes.push(triple.subject);
            }
        }
    }
    processes
}

/// use_case_3: platform to wells, wells to the processes they take part in,
/// processes to the flow measurements characterizing them, and flows to the
/// tags about them.
pub fn flow_tags_for_platform(
    graph: &OxigraphGraph,
    platform: NamedNodeRef<'_>,
    candidates: &RoleCandidates,
    matching: ProcessMatching,
    budget: &Budget,
) -> Result<(Vec<FlowTagMatch>, WellTrace)> {
    budget.check()?;
    let measurement = candidates.measurement.nodes();
    let connected = candidates.connected.nodes();
    let participation = candidates.participation.nodes();
    let process_characteristic = candidates.process_characteristic.nodes();
    let is_about = candidates.is_about.nodes();

    let mut trace = WellTrace::default();
    let wells = wells_of(graph, platform, &connected);
    trace.wells = wells.iter().map(|w| node_str(*w)).collect();
    if wells.is_empty() {
        debug!("use_case_3 found no wells for {}", platform);
        return Ok((Vec::new(), trace));
    }

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for well in wells.iter() {
        let well_iri = node_str(*well);
        let processes = processes_of(graph, *well, &participation, matching);
        for process in processes.iter() {
            let process_iri = node_str((*process).into());
            if !trace.processes.contains(&process_iri) {
                trace.processes.push(process_iri.clone());
            }
            for m in measurement.iter() {
                budget.check()?;
                for flow in graph.subjects_for_predicate_object(TYPE, m.as_ref()) {
                    let used = process_characteristic
                        .iter()
                        .find(|pc| are_linked(graph, flow.into(), pc.as_ref(), (*process).into()));
                    let Some(used) = used else {
                        continue;
                    };
                    let flow_iri = node_str(flow.into());
                    for ia in is_about.iter() {
                        for tag in graph.subjects_for_predicate_object(ia.as_ref(), flow) {
                            let tag_iri = node_str(tag.into());
                            let key = (tag_iri.clone(), flow_iri.clone(), process_iri.clone());
                            if !seen.insert(key) {
                                continue;
                            }
                            found.push(FlowTagMatch {
                                tag_name: local_name(&tag_iri).to_string(),
                                tag_iri,
                                flow_iri: flow_iri.clone(),
                                flow_name: local_name(&flow_iri).to_string(),
                                process_iri: process_iri.clone(),
                                process_name: local_name(&process_iri).to_string(),
                                well_iri: well_iri.clone(),
                                well_name: local_name(&well_iri).to_string(),
                                predicates_used: FlowPredicates {
                                    process_characteristic: used.as_str().to_string(),
                                    is_about: ia.as_str().to_string(),
                                },
                                measurement_class_tried: m.as_str().to_string(),
                            });
                        }
                    }
                }
            }
        }
    }
    debug!(
        "use_case_3 visited {} wells and {} processes, found {} tags",
        trace.wells.len(),
        trace.processes.len(),
        found.len()
    );
    Ok((found, trace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_budget() {
        let budget = Budget::new(Duration::ZERO);
        assert!(matches!(budget.check(), Err(OntologyError::Timeout(_))));
        assert!(Budget::unlimited().check().is_ok());
        assert!(Budget::new(Duration::from_secs(60)).check().is_ok());
    }

    #[test]
    fn test_linked_nodes_both_directions() {
        let ttl = r#"
            @prefix ex: <http://example.org/> .
            ex:icv1 ex:component_of ex:P1 .
            ex:P1 ex:component_of ex:icv2 .
            ex:P1 ex:component_of ex:icv1 .
        "#;
        let (graph, _) =
            crate::util::parse_graph(ttl.as_bytes(), Some(oxigraph::io::RdfFormat::Turtle)).unwrap();
        let p1 = NamedNodeRef::new("http://example.org/P1").unwrap();
        let comp = NamedNodeRef::new("http://example.org/component_of").unwrap();
        let linked: Vec<String> = linked_nodes(&graph, p1.into(), comp)
            .into_iter()
            .map(node_str)
            .collect();
        assert_eq!(linked.len(), 2);
        assert!(linked.contains(&"http://example.org/icv1".to_string()));
        assert!(linked.contains(&"http://example.org/icv2".to_string()));
        let icv2 = NamedNodeRef::new("http://example.org/icv2").unwrap();
        assert!(are_linked(&graph, icv2.into(), comp, p1.into()));
    }
}
