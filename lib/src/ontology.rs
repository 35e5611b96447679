//! Defines the ontology snapshot: an immutable triple graph plus the metadata
//! describing where it came from. Requests read snapshots; edits derive new
//! ones.

use crate::consts::*;
use crate::util::{parse_graph, read_file};
use anyhow::Result;
use chrono::prelude::*;
use log::{debug, info};
use oxigraph::io::RdfFormat;
use oxigraph::model::{
    Graph as OxigraphGraph, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, TermRef, TripleRef,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Base used to mint entities when the ontology declares no IRI of its own.
pub const DEFAULT_BASE_IRI: &str = "http://www.semanticweb.org/ontotag/ontology#";

#[derive(Serialize, Deserialize, Hash, Clone, Eq, PartialEq, Debug)]
pub enum OntologyLocation {
    #[serde(rename = "file")]
    File(PathBuf),
    #[serde(rename = "in-memory")]
    InMemory { identifier: String },
}

impl std::fmt::Display for OntologyLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OntologyLocation::File(p) => write!(f, "file://{}", p.display()),
            OntologyLocation::InMemory { identifier } => write!(f, "memory://{}", identifier),
        }
    }
}

impl OntologyLocation {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            OntologyLocation::File(p) => Some(p.as_path()),
            OntologyLocation::InMemory { .. } => None,
        }
    }
}

/// Serializable description of a snapshot, for status output.
#[derive(Serialize, Debug, Clone)]
pub struct SnapshotInfo {
    pub location: String,
    pub name: Option<String>,
    pub num_triples: usize,
    pub content_hash: String,
    pub loaded_at: DateTime<Utc>,
    pub version: u64,
}

#[derive(Debug, Clone)]
pub struct OntologySnapshot {
    graph: OxigraphGraph,
    location: OntologyLocation,
    format: RdfFormat,
    name: Option<NamedNode>,
    base_iri: String,
    content_hash: String,
    loaded_at: DateTime<Utc>,
    version: u64,
}

fn hash_graph(graph: &OxigraphGraph) -> String {
    let mut lines: Vec<String> = graph.iter().map(|t| t.to_string()).collect();
    lines.sort();
    let mut hasher = blake3::Hasher::new();
    for line in lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

fn ontology_name(graph: &OxigraphGraph) -> Option<NamedNode> {
    graph
        .subjects_for_predicate_object(TYPE, ONTOLOGY)
        .find_map(|s| match s {
            NamedOrBlankNodeRef::NamedNode(n) => Some(n.into_owned()),
            _ => None,
        })
}

fn base_iri_for(name: Option<&NamedNode>) -> String {
    match name {
        Some(n) if n.as_str().ends_with('#') || n.as_str().ends_with('/') => n.as_str().to_string(),
        Some(n) => format!("{}#", n.as_str()),
        None => DEFAULT_BASE_IRI.to_string(),
    }
}

impl OntologySnapshot {
    pub fn from_graph(graph: OxigraphGraph, location: OntologyLocation, format: RdfFormat) -> Self {
        let name = ontology_name(&graph);
        let base_iri = base_iri_for(name.as_ref());
        let content_hash = hash_graph(&graph);
        OntologySnapshot {
            graph,
            location,
            format,
            name,
            base_iri,
            content_hash,
            loaded_at: Utc::now(),
            version: 0,
        }
    }

    /// Parses ontology bytes; `preferred` is tried before the other formats.
    pub fn from_bytes(
        location: OntologyLocation,
        bytes: &[u8],
        preferred: Option<RdfFormat>,
    ) -> Result<Self> {
        let (graph, format) = parse_graph(bytes, preferred)?;
        let mut snapshot = Self::from_graph(graph, location, format);
        // hash the source bytes so an unchanged re-upload is recognizable
        snapshot.content_hash = blake3::hash(bytes).to_hex().to_string();
        info!(
            "Parsed ontology {} ({} triples, {})",
            snapshot.location,
            snapshot.graph.len(),
            snapshot.format
        );
        Ok(snapshot)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let (graph, format) = read_file(path)?;
        let bytes = std::fs::read(path)?;
        let mut snapshot = Self::from_graph(graph, OntologyLocation::File(path.to_path_buf()), format);
        snapshot.content_hash = blake3::hash(&bytes).to_hex().to_string();
        info!(
            "Loaded ontology from {} ({} triples)",
            path.display(),
            snapshot.graph.len()
        );
        Ok(snapshot)
    }

    /// A snapshot with the same origin as `self` holding an edited graph.
    pub fn derive(&self, graph: OxigraphGraph) -> Self {
        let mut next = Self::from_graph(graph, self.location.clone(), self.format);
        if next.name.is_none() {
            next.name = self.name.clone();
            next.base_iri = self.base_iri.clone();
        }
        next
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn graph(&self) -> &OxigraphGraph {
        &self.graph
    }

    pub fn location(&self) -> &OntologyLocation {
        &self.location
    }

    pub fn format(&self) -> RdfFormat {
        self.format
    }

    pub fn name(&self) -> Option<NamedNodeRef<'_>> {
        self.name.as_ref().map(|n| n.as_ref())
    }

    pub fn base_iri(&self) -> &str {
        &self.base_iri
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Builds `base_iri + local` for a new entity.
    pub fn mint_iri(&self, local: &str) -> Result<NamedNode> {
        let iri = format!("{}{}", self.base_iri, local);
        debug!("Minting IRI {}", iri);
        Ok(NamedNode::new(iri)?)
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            location: self.location.to_string(),
            name: self.name.as_ref().map(|n| n.as_str().to_string()),
            num_triples: self.graph.len(),
            content_hash: self.content_hash.clone(),
            loaded_at: self.loaded_at,
            version: self.version,
        }
    }
}

/// Distinct named-node subjects of `graph`, sorted by IRI. The graph's own
/// iteration order depends on term interning, so scans that stop at the
/// first hit go through this to stay deterministic.
pub fn named_subjects(graph: &OxigraphGraph) -> Vec<NamedNodeRef<'_>> {
    let subjects: BTreeSet<NamedNodeRef<'_>> = graph
        .iter()
        .filter_map(|t| match t.subject {
            NamedOrBlankNodeRef::NamedNode(n) => Some(n),
            _ => None,
        })
        .collect();
    subjects.into_iter().collect()
}

pub fn has_subject<'a>(graph: &OxigraphGraph, node: impl Into<NamedOrBlankNodeRef<'a>>) -> bool {
    graph.triples_for_subject(node).next().is_some()
}

/// Named `rdf:type` objects of `node`.
pub fn types_of<'a>(graph: &'a OxigraphGraph, node: NamedOrBlankNodeRef<'a>) -> Vec<NamedNodeRef<'a>> {
    graph
        .objects_for_subject_predicate(node, TYPE)
        .filter_map(|o| match o {
            TermRef::NamedNode(n) => Some(n),
            _ => None,
        })
        .collect()
}

pub fn is_a<'a>(graph: &OxigraphGraph, node: NamedOrBlankNodeRef<'a>, class: NamedNodeRef<'a>) -> bool {
    graph.contains(TripleRef::new(node, TYPE, class))
}

pub fn labels_of<'a>(graph: &'a OxigraphGraph, node: NamedOrBlankNodeRef<'a>) -> Vec<&'a str> {
    graph
        .objects_for_subject_predicate(node, LABEL)
        .filter_map(|o| match o {
            TermRef::Literal(l) => Some(l.value()),
            _ => None,
        })
        .collect()
}
