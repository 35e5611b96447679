//! The snapshot store. Readers take an `Arc` to the current snapshot and
//! traverse it without holding a lock; writers build a complete new snapshot
//! and swap it in. Edits are serialized through a writer mutex so two
//! copy-on-write edits never overwrite each other.

use crate::config::Config;
use crate::errors::{OntologyError, Result};
use crate::ontology::{OntologyLocation, OntologySnapshot};
use crate::util::{format_for_path, write_graph_to_file};
use log::{debug, info, warn};
use oxigraph::model::Graph as OxigraphGraph;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

pub struct OntologyStore {
    config: Config,
    current: RwLock<Option<Arc<OntologySnapshot>>>,
    writer: Mutex<()>,
    version: AtomicU64,
}

impl OntologyStore {
    pub fn new(config: Config) -> Self {
        OntologyStore {
            config,
            current: RwLock::new(None),
            writer: Mutex::new(()),
            version: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Version of the most recently published snapshot; 0 before any load.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The published snapshot, if any. Never loads.
    pub fn current(&self) -> Option<Arc<OntologySnapshot>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The published snapshot, or `NotLoaded` if there is none.
    pub fn require(&self) -> Result<Arc<OntologySnapshot>> {
        self.current()
            .ok_or_else(|| OntologyError::NotLoaded("No ontology loaded".to_string()))
    }

    /// The published snapshot. If nothing is published yet, the configured
    /// candidate files are tried in order and the first one that parses is
    /// published.
    pub fn snapshot(&self) -> Result<Arc<OntologySnapshot>> {
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        let _guard = self.lock_writer();
        // another request may have loaded while we waited
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        let candidates = self.config.candidate_paths();
        for path in candidates.iter() {
            if !path.exists() {
                debug!("Ontology candidate {} does not exist", path.display());
                continue;
            }
            match OntologySnapshot::from_file(path) {
                Ok(snapshot) => return Ok(self.publish_locked(snapshot)),
                Err(e) => warn!("Failed to load ontology {}: {:#}", path.display(), e),
            }
        }
        let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
        Err(OntologyError::NotLoaded(format!(
            "No ontology loaded and none of the default files could be read: {}",
            tried.join(", ")
        )))
    }

    fn publish_locked(&self, snapshot: OntologySnapshot) -> Arc<OntologySnapshot> {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(snapshot.with_version(version));
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(snapshot.clone());
        info!(
            "Published ontology snapshot v{} from {} ({} triples)",
            version,
            snapshot.location(),
            snapshot.len()
        );
        snapshot
    }

    /// Replaces the current snapshot. Readers holding the old one keep it.
    pub fn publish(&self, snapshot: OntologySnapshot) -> Arc<OntologySnapshot> {
        let _guard = self.lock_writer();
        self.publish_locked(snapshot)
    }

    pub fn load_file(&self, path: &Path) -> Result<Arc<OntologySnapshot>> {
        let snapshot = OntologySnapshot::from_file(path)?;
        Ok(self.publish(snapshot))
    }

    /// Stores an uploaded ontology under `media_root` and publishes it. The
    /// stored copy becomes the snapshot's location, so later edits persist
    /// to it.
    pub fn load_upload(&self, file_name: &str, bytes: &[u8]) -> Result<Arc<OntologySnapshot>> {
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| OntologyError::bad_request("Invalid ontology file name"))?;
        let path: PathBuf = self.config.media_root.join(file_name);
        let snapshot = OntologySnapshot::from_bytes(
            OntologyLocation::File(path.clone()),
            bytes,
            format_for_path(&path),
        )
        .map_err(|e| OntologyError::bad_request(format!("Failed to parse ontology: {:#}", e)))?;
        // an edit persisting to the same path must not land between write and publish
        let _guard = self.lock_writer();
        std::fs::create_dir_all(&self.config.media_root).map_err(anyhow::Error::from)?;
        std::fs::write(&path, bytes).map_err(anyhow::Error::from)?;
        info!("Saved uploaded ontology to {}", path.display());
        Ok(self.publish_locked(snapshot))
    }

    /// Applies an edit to a copy of the current graph and publishes the
    /// result. `f` receives the snapshot it started from (for minting IRIs
    /// and lookups) and the graph to mutate. If `f` fails nothing changes.
    pub fn edit<T, F>(&self, f: F) -> Result<(T, Arc<OntologySnapshot>)>
    where
        F: FnOnce(&OntologySnapshot, &mut OxigraphGraph) -> Result<T>,
    {
        let _guard = self.lock_writer();
        let base = self.require()?;
        let mut graph = base.graph().clone();
        let value = f(&base, &mut graph)?;
        let next = base.derive(graph);
        if self.config.persist_edits {
            if let Some(path) = next.location().as_path() {
                write_graph_to_file(next.graph(), path, next.format(), &self.config.namespaces)?;
            }
        }
        debug!(
            "Edit changed triple count from {} to {}",
            base.len(),
            next.len()
        );
        Ok((value, self.publish_locked(next)))
    }
}
