//! Candidate expansion. A role value such as `qualityOf` or `o3po:ICV` is
//! turned into every full IRI the term may live under, so one request can
//! match ontologies authored against different namespace revisions.

use crate::names::{is_full_iri, split_prefixed, strip_brackets, strip_prefixed_local};
use crate::namespaces::{NamespaceTable, Vocabulary};
use log::debug;
use oxigraph::model::NamedNode;
use serde::Serialize;

/// The abstract predicate or class positions of a use-case query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    MeasurementClass,
    ComponentOf,
    ConnectedTo,
    QualityOf,
    IsAbout,
    ProcessCharacteristic,
}

impl Role {
    /// Vocabularies swept for a bare local name, in sweep order.
    pub fn vocabularies(self) -> &'static [Vocabulary] {
        match self {
            Role::MeasurementClass | Role::ComponentOf | Role::ConnectedTo => &[Vocabulary::O3po],
            Role::QualityOf | Role::IsAbout => &[Vocabulary::Core],
            Role::ProcessCharacteristic => &[Vocabulary::Core, Vocabulary::Obo],
        }
    }
}

/// Ordered, duplicate-free list of IRIs that stand in for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateSet {
    iris: Vec<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `iri` unless it is already present. Returns true if added.
    pub fn push(&mut self, iri: impl Into<String>) -> bool {
        let iri = iri.into();
        if self.iris.contains(&iri) {
            return false;
        }
        self.iris.push(iri);
        true
    }

    pub fn union(mut self, other: &CandidateSet) -> Self {
        for iri in other.iter() {
            self.push(iri);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.iris.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.iris
    }

    pub fn len(&self) -> usize {
        self.iris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iris.is_empty()
    }

    /// The candidates that parse as absolute IRIs. Others stay in the set for
    /// diagnostics but can never match a triple.
    pub fn nodes(&self) -> Vec<NamedNode> {
        self.iris
            .iter()
            .filter_map(|iri| match NamedNode::new(iri.as_str()) {
                Ok(node) => Some(node),
                Err(e) => {
                    debug!("Skipping candidate {} ({})", iri, e);
                    None
                }
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = CandidateSet::new();
        for iri in iter {
            set.push(iri);
        }
        set
    }
}

pub struct CandidateExpander<'a> {
    table: &'a NamespaceTable,
}

impl<'a> CandidateExpander<'a> {
    pub fn new(table: &'a NamespaceTable) -> Self {
        CandidateExpander { table }
    }

    /// Expands a role value into its candidate IRIs.
    ///
    /// A full IRI expands to itself alone. A known `prefix:local` expands to
    /// that prefix's IRI followed by the sweep over the role's vocabularies;
    /// a bare name or unknown prefix gets only the sweep.
    pub fn expand(&self, value: &str, role: Role) -> CandidateSet {
        let value = value.trim();
        let mut set = CandidateSet::new();
        if value.is_empty() {
            return set;
        }
        if is_full_iri(value) {
            set.push(strip_brackets(value));
            return set;
        }
        if let Some((prefix, local)) = split_prefixed(value) {
            if let Some(base) = self.table.base_for(prefix) {
                set.push(format!("{}{}", base, local));
            }
        }
        let local = strip_prefixed_local(value);
        for vocabulary in role.vocabularies() {
            for base in self.table.bases(*vocabulary) {
                set.push(format!("{}{}", base, local));
            }
        }
        set
    }

    /// Expands several local names for the same role into one set.
    pub fn expand_all<I, S>(&self, values: I, role: Role) -> CandidateSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .fold(CandidateSet::new(), |set, value| {
                set.union(&self.expand(value.as_ref(), role))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_base_table() -> NamespaceTable {
        NamespaceTable::with_bases(Vocabulary::O3po, [("a", "http://x#"), ("b", "http://y#")])
    }

    #[test]
    fn test_full_iri_expands_to_itself() {
        let table = NamespaceTable::builtin();
        let expander = CandidateExpander::new(&table);
        let set = expander.expand("http://example.org/onto#ICV", Role::MeasurementClass);
        assert_eq!(set.as_slice(), ["http://example.org/onto#ICV"]);
        let set = expander.expand("<http://example.org/onto#ICV>", Role::QualityOf);
        assert_eq!(set.as_slice(), ["http://example.org/onto#ICV"]);
    }

    #[test]
    fn test_bare_name_is_order_stable() {
        let table = two_base_table();
        let expander = CandidateExpander::new(&table);
        for _ in 0..3 {
            let set = expander.expand("ICV", Role::MeasurementClass);
            assert_eq!(set.as_slice(), ["http://x#ICV", "http://y#ICV"]);
        }
    }

    #[test]
    fn test_known_prefix_comes_first() {
        let table = two_base_table();
        let expander = CandidateExpander::new(&table);
        let set = expander.expand("b:ICV", Role::ComponentOf);
        assert_eq!(set.as_slice(), ["http://y#ICV", "http://x#ICV"]);
        // unknown prefixes are stripped and swept
        let set = expander.expand("zz:ICV", Role::ComponentOf);
        assert_eq!(set.as_slice(), ["http://x#ICV", "http://y#ICV"]);
    }

    #[test]
    fn test_role_picks_vocabulary() {
        let table = NamespaceTable::builtin();
        let expander = CandidateExpander::new(&table);
        let quality = expander.expand("core1:qualityOf", Role::QualityOf);
        assert_eq!(
            quality.as_slice(),
            [
                "https://purl.industrialontologies.org/ontology/core/Core/qualityOf",
                "https://spec.industrialontologies.org/ontology/core/Core/qualityOf",
                "http://www.ontologydesignpatterns.org/cp/owl/core#qualityOf",
            ]
        );
        let process = expander.expand("processCharacteristicOf", Role::ProcessCharacteristic);
        assert_eq!(process.len(), 4);
        assert_eq!(
            process.iter().last(),
            Some("http://purl.obolibrary.org/obo/processCharacteristicOf")
        );
    }

    #[test]
    fn test_expand_all_deduplicates() {
        let table = two_base_table();
        let expander = CandidateExpander::new(&table);
        let set = expander.expand_all(["ICV", "a:ICV", "flow"], Role::MeasurementClass);
        assert_eq!(
            set.as_slice(),
            ["http://x#ICV", "http://y#ICV", "http://x#flow", "http://y#flow"]
        );
    }

    #[test]
    fn test_invalid_candidates_are_not_nodes() {
        let set: CandidateSet = ["http://x#ok", "not an iri"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.nodes().len(), 1);
    }
}
