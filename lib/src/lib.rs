//! `ontotag` finds the measurement tags attached to wells, platforms and
//! valves in an oil-platform ontology, and keeps that ontology editable
//! through a small set of OWL operations.
//!
//! The ontology lives in an [`store::OntologyStore`] as an immutable
//! [`ontology::OntologySnapshot`]. Queries go through [`query::execute`];
//! edits go through [`store::OntologyStore::edit`] with one of the
//! functions in [`edit`].

extern crate derive_builder;

pub mod candidates;
pub mod catalog;
pub mod config;
pub mod consts;
pub mod edit;
pub mod errors;
pub mod names;
pub mod namespaces;
pub mod ontology;
pub mod options;
pub mod query;
pub mod resolver;
pub mod store;
pub mod traversal;
pub mod util;

pub use errors::{OntologyError, Result};
pub use query::{execute, QueryOutcome, UseCase, UseCaseParams};
pub use store::OntologyStore;

pub fn init_logging() {
    // ONTOTAG_LOG takes precedence over RUST_LOG
    if let Ok(log_level) = std::env::var("ONTOTAG_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
