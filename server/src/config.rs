//! Server configuration

use clap::Parser;
use ontotag::config::Config;
use ontotag::options::{DebugPayloads, ProcessMatching};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "ontotag")]
#[command(about = "Finds measurement tags for wells and platforms in an O3PO ontology")]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "ONTOTAG_LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: SocketAddr,

    /// JSON configuration file; flags and environment variables override it
    #[arg(long, short, env = "ONTOTAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ontology files tried, in order, before the defaults under the media root
    #[arg(long = "ontology", env = "ONTOTAG_ONTOLOGY_PATHS", value_delimiter = ',')]
    pub ontology_paths: Vec<PathBuf>,

    /// Directory for uploaded and exported ontologies
    #[arg(long, env = "ONTOTAG_MEDIA_ROOT")]
    pub media_root: Option<PathBuf>,

    /// Include the tried candidate lists in error responses
    #[clap(long, action, env = "ONTOTAG_DEBUG_PAYLOADS")]
    pub debug_payloads: bool,

    /// Only count processes linked to a well through the participation relation
    #[clap(long, action, env = "ONTOTAG_STRICT_PROCESS_MATCHING")]
    pub strict_process_matching: bool,

    /// Time budget for a single use-case query, in milliseconds
    #[arg(long, env = "ONTOTAG_QUERY_BUDGET_MS")]
    pub query_budget_ms: Option<u64>,

    /// Keep edits in memory instead of writing them back to the ontology file
    #[clap(long, action, env = "ONTOTAG_NO_PERSIST")]
    pub no_persist: bool,

    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false")]
    pub verbose: bool,

    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false")]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            config: None,
            ontology_paths: Vec::new(),
            media_root: None,
            debug_payloads: false,
            strict_process_matching: false,
            query_budget_ms: None,
            no_persist: false,
            verbose: false,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// The library configuration: the config file (or defaults) with the
    /// command line and environment applied on top.
    pub fn to_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if !self.ontology_paths.is_empty() {
            config.ontology_paths = self.ontology_paths.clone();
        }
        if let Some(media_root) = &self.media_root {
            config.media_root = media_root.clone();
        }
        if self.debug_payloads {
            config.debug_payloads = DebugPayloads::Expose;
        }
        if self.strict_process_matching {
            config.process_matching = ProcessMatching::Strict;
        }
        if let Some(budget) = self.query_budget_ms {
            config.query_budget_ms = budget;
        }
        if self.no_persist {
            config.persist_edits = false;
        }
        Ok(config)
    }

    pub fn log_level(&self) -> &'static str {
        let log_level = if self.verbose { "info" } else { "warn" };
        if self.debug {
            "debug"
        } else {
            log_level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontotag.json");
        Config::builder()
            .media_root("/srv/from-file")
            .query_budget_ms(1000u64)
            .build()
            .unwrap()
            .save_to_file(&path)
            .unwrap();

        let cli = ServerConfig::parse_from([
            "ontotag",
            "--config",
            path.to_str().unwrap(),
            "--strict-process-matching",
            "--query-budget-ms",
            "250",
            "--ontology",
            "a.owl,b.ttl",
        ]);
        let config = cli.to_config().unwrap();
        assert_eq!(config.media_root, PathBuf::from("/srv/from-file"));
        assert_eq!(config.query_budget_ms, 250);
        assert!(config.process_matching.is_strict());
        assert_eq!(
            config.ontology_paths,
            vec![PathBuf::from("a.owl"), PathBuf::from("b.ttl")]
        );
        assert!(!config.debug_payloads.is_exposed());
        assert!(config.persist_edits);
    }

    #[test]
    fn test_log_level() {
        let mut cli = ServerConfig::default();
        assert_eq!(cli.log_level(), "warn");
        cli.verbose = true;
        assert_eq!(cli.log_level(), "info");
        cli.debug = true;
        assert_eq!(cli.log_level(), "debug");
    }
}
