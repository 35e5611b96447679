//! The namespace table: short prefixes mapped to base IRIs, each tagged with
//! the vocabulary it belongs to. Ontology revisions have placed the same terms
//! under several of these bases, so candidate expansion sweeps all bases of a
//! vocabulary instead of trusting a single canonical one.

use serde::{Deserialize, Serialize};

/// The fixed "has participant" relation linking processes to wells.
pub const PARTICIPATION_RELATION: &str = "http://purl.obolibrary.org/obo/RO_0000057";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    /// The O3PO oil-and-gas ontology, in its original, merged and inferred revisions
    O3po,
    /// The IOF core ontology and the ODP core pattern
    Core,
    /// OBO relation ontology
    Obo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub prefix: String,
    pub base: String,
    pub vocabulary: Vocabulary,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, base: impl Into<String>, vocabulary: Vocabulary) -> Self {
        Namespace {
            prefix: prefix.into(),
            base: base.into(),
            vocabulary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceTable {
    entries: Vec<Namespace>,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NamespaceTable {
    pub fn new(entries: Vec<Namespace>) -> Self {
        NamespaceTable { entries }
    }

    /// The namespaces the platform ontologies have used across revisions.
    pub fn builtin() -> Self {
        NamespaceTable::new(vec![
            Namespace::new(
                "o3po",
                "http://html.inf.ufrgs.br/home/pos/nosantos/public_html/o3po.owl#",
                Vocabulary::O3po,
            ),
            Namespace::new(
                "o3po_merged",
                "http://www.semanticweb.org/nicoy/ontologies/2023/1/o3po_merged#",
                Vocabulary::O3po,
            ),
            Namespace::new(
                "o3po_inferred",
                "http://www.semanticweb.org/tturb/ontologies/2025/3/o3po_inferred#",
                Vocabulary::O3po,
            ),
            Namespace::new(
                "core",
                "https://spec.industrialontologies.org/ontology/core/Core/",
                Vocabulary::Core,
            ),
            Namespace::new(
                "core1",
                "https://purl.industrialontologies.org/ontology/core/Core/",
                Vocabulary::Core,
            ),
            Namespace::new(
                "odp_core",
                "http://www.ontologydesignpatterns.org/cp/owl/core#",
                Vocabulary::Core,
            ),
            Namespace::new("obo", "http://purl.obolibrary.org/obo/", Vocabulary::Obo),
        ])
    }

    /// Builds a table where every `(prefix, base)` pair belongs to one vocabulary.
    pub fn with_bases<I, P, B>(vocabulary: Vocabulary, pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<String>,
    {
        NamespaceTable::new(
            pairs
                .into_iter()
                .map(|(prefix, base)| Namespace::new(prefix, base, vocabulary))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[Namespace] {
        &self.entries
    }

    pub fn base_for(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|ns| ns.prefix == prefix)
            .map(|ns| ns.base.as_str())
    }

    /// Bases of one vocabulary, in table order.
    pub fn bases(&self, vocabulary: Vocabulary) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(move |ns| ns.vocabulary == vocabulary)
            .map(|ns| ns.base.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bases_by_vocabulary() {
        let table = NamespaceTable::builtin();
        assert_eq!(table.bases(Vocabulary::O3po).count(), 3);
        assert_eq!(table.bases(Vocabulary::Core).count(), 3);
        assert_eq!(
            table.bases(Vocabulary::Obo).collect::<Vec<_>>(),
            vec!["http://purl.obolibrary.org/obo/"]
        );
        assert_eq!(
            table.base_for("core1"),
            Some("https://purl.industrialontologies.org/ontology/core/Core/")
        );
        assert_eq!(table.base_for("unknown"), None);
    }

    #[test]
    fn test_table_round_trips_through_json() {
        let table = NamespaceTable::with_bases(Vocabulary::Core, [("a", "http://x#")]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"[{"prefix":"a","base":"http://x#","vocabulary":"core"}]"#
        );
        let back: NamespaceTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
