//! Defines the configuration for the ontology store and the use-case queries.
//! A `Config` is built with `Config::builder()` or read from a JSON file.

use crate::namespaces::NamespaceTable;
use crate::options::{DebugPayloads, ProcessMatching};
use anyhow::Result;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Files tried, in order, under `media_root` when no ontology has been uploaded.
pub const DEFAULT_ONTOLOGY_FILES: [&str; 3] = ["o3po_inferred.owl", "o3po_merged.owl", "o3po.owl"];

const DEFAULT_QUERY_BUDGET_MS: u64 = 30_000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct Config {
    /// Ontology files tried before the defaults under `media_root`
    pub ontology_paths: Vec<PathBuf>,
    /// Directory holding uploaded and exported ontologies
    pub media_root: PathBuf,
    pub namespaces: NamespaceTable,
    pub process_matching: ProcessMatching,
    pub debug_payloads: DebugPayloads,
    /// Wall-clock budget for a single use-case traversal, in milliseconds
    pub query_budget_ms: u64,
    /// Write edits back to the ontology file they were loaded from
    pub persist_edits: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ontology_paths: vec![],
            media_root: PathBuf::from("media"),
            namespaces: NamespaceTable::builtin(),
            process_matching: ProcessMatching::default(),
            debug_payloads: DebugPayloads::default(),
            query_budget_ms: DEFAULT_QUERY_BUDGET_MS,
            persist_edits: true,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn query_budget(&self) -> Duration {
        Duration::from_millis(self.query_budget_ms)
    }

    /// Every path the store tries when it has to load an ontology lazily.
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.ontology_paths.clone();
        for file in DEFAULT_ONTOLOGY_FILES {
            let path = self.media_root.join(file);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder()
            .media_root("/srv/media")
            .process_matching(ProcessMatching::Strict)
            .build()
            .unwrap();
        assert_eq!(config.media_root, PathBuf::from("/srv/media"));
        assert!(config.process_matching.is_strict());
        assert!(!config.debug_payloads.is_exposed());
        assert_eq!(config.query_budget(), Duration::from_secs(30));
        assert!(config.persist_edits);
    }

    #[test]
    fn test_candidate_paths() {
        let config = Config::builder()
            .ontology_paths(vec![PathBuf::from("/data/custom.owl")])
            .media_root("m")
            .build()
            .unwrap();
        assert_eq!(
            config.candidate_paths(),
            vec![
                PathBuf::from("/data/custom.owl"),
                PathBuf::from("m/o3po_inferred.owl"),
                PathBuf::from("m/o3po_merged.owl"),
                PathBuf::from("m/o3po.owl"),
            ]
        );
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontotag.json");
        let config = Config::builder()
            .debug_payloads(DebugPayloads::Expose)
            .query_budget_ms(500u64)
            .build()
            .unwrap();
        config.save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);

        // missing keys fall back to defaults
        std::fs::write(&path, r#"{"persist_edits": false}"#).unwrap();
        let partial = Config::from_file(&path).unwrap();
        assert!(!partial.persist_edits);
        assert_eq!(partial.namespaces, NamespaceTable::builtin());
    }
}
