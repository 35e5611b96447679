//! Predefined use-case queries: parameter defaults, candidate construction,
//! identifier resolution and dispatch to the traversals.

use crate::candidates::{CandidateExpander, CandidateSet, Role};
use crate::config::Config;
use crate::errors::{OntologyError, Result};
use crate::namespaces::{NamespaceTable, PARTICIPATION_RELATION};
use crate::ontology::OntologySnapshot;
use crate::options::{DebugPayloads, ProcessMatching};
use crate::resolver::resolve_with_rule;
use crate::store::OntologyStore;
use crate::traversal::{
    flow_tags_for_platform, tags_for_icv_qualities, tags_for_typed_instances, Budget, Match,
    RoleCandidates,
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_QUALITY_PREDICATE: &str = "core:qualityOf";
pub const DEFAULT_COMPONENT_PREDICATE: &str = "o3po:component_of";
pub const DEFAULT_TAG_PREDICATE: &str = "isAbout";
const CONNECTED_TO: &str = "connected_to";
const ABOUT: &str = "about";
const PROCESS_CHARACTERISTIC_NAMES: [&str; 2] = ["processCharacteristicOf", "hasProcessCharacteristic"];

const MAX_DEBUG_WELLS: usize = 20;
const MAX_DEBUG_PROCESSES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseCase {
    /// Tags measuring qualities of the ICVs attached to a platform
    #[serde(rename = "use_case_1")]
    IcvQualities,
    /// Tags on typed instances attached to a well
    #[serde(rename = "use_case_2")]
    TypedInstances,
    /// Tags on flow measurements of the processes of a platform's wells
    #[serde(rename = "use_case_3")]
    PlatformFlows,
}

impl UseCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::IcvQualities => "use_case_1",
            UseCase::TypedInstances => "use_case_2",
            UseCase::PlatformFlows => "use_case_3",
        }
    }

    pub fn default_measurement_class(&self) -> &'static str {
        match self {
            UseCase::IcvQualities => "o3po:ICV_annular_pressure",
            UseCase::TypedInstances => "o3po:ICV",
            UseCase::PlatformFlows => "o3po:flow_rate",
        }
    }

    fn empty_message(&self) -> &'static str {
        match self {
            UseCase::IcvQualities => "Found 0 tags for analysis (use_case_1).",
            UseCase::TypedInstances => "Found 0 tags for use_case_2.",
            UseCase::PlatformFlows => "Found 0 tags for use_case_3.",
        }
    }

    fn subject_key(&self) -> &'static str {
        match self {
            UseCase::IcvQualities => "resolved_entity",
            UseCase::TypedInstances => "resolved_well",
            UseCase::PlatformFlows => "resolved_platform",
        }
    }
}

impl Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = OntologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_end_matches('/') {
            "use_case_1" => Ok(UseCase::IcvQualities),
            "use_case_2" => Ok(UseCase::TypedInstances),
            "use_case_3" => Ok(UseCase::PlatformFlows),
            other => Err(OntologyError::bad_request(format!("Unknown use_case: {}", other))),
        }
    }
}

/// Request parameters, from a query string or a JSON body. Blank values
/// count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCaseParams {
    pub identifier: Option<String>,
    pub measurement_class: Option<String>,
    pub quality_predicate: Option<String>,
    pub component_predicate: Option<String>,
    pub tag_predicate: Option<String>,
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl UseCaseParams {
    pub fn for_identifier(identifier: impl Into<String>) -> Self {
        UseCaseParams {
            identifier: Some(identifier.into()),
            ..Default::default()
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        given(&self.identifier)
    }
}

/// Expands every role of `use_case` from the request parameters.
pub fn build_candidates(
    use_case: UseCase,
    params: &UseCaseParams,
    table: &NamespaceTable,
) -> RoleCandidates {
    let expander = CandidateExpander::new(table);
    let measurement_class =
        given(&params.measurement_class).unwrap_or(use_case.default_measurement_class());
    let component = expander.expand(
        given(&params.component_predicate).unwrap_or(DEFAULT_COMPONENT_PREDICATE),
        Role::ComponentOf,
    );
    let tag = expander.expand(
        given(&params.tag_predicate).unwrap_or(DEFAULT_TAG_PREDICATE),
        Role::IsAbout,
    );
    RoleCandidates {
        measurement: expander.expand(measurement_class, Role::MeasurementClass),
        quality: expander.expand(
            given(&params.quality_predicate).unwrap_or(DEFAULT_QUALITY_PREDICATE),
            Role::QualityOf,
        ),
        participation: [PARTICIPATION_RELATION].into_iter().collect(),
        connected: expander
            .expand(CONNECTED_TO, Role::ConnectedTo)
            .union(&component),
        process_characteristic: expander
            .expand_all(PROCESS_CHARACTERISTIC_NAMES, Role::ProcessCharacteristic),
        is_about: tag.clone().union(&expander.expand(ABOUT, Role::IsAbout)),
        component,
        tag,
    }
}

/// The candidate lists reported when resolution or traversal finds nothing.
fn candidate_debug(candidates: &RoleCandidates) -> Map<String, Value> {
    let list = |set: &CandidateSet| json!(set.as_slice());
    let mut map = Map::new();
    map.insert("mc_candidates".to_string(), list(&candidates.measurement));
    map.insert("comp_candidates".to_string(), list(&candidates.component));
    map.insert("qual_candidates".to_string(), list(&candidates.quality));
    map.insert("tag_candidates".to_string(), list(&candidates.tag));
    map.insert("obo_candidates".to_string(), list(&candidates.participation));
    map
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub process_matching: ProcessMatching,
    /// No deadline when `None`
    pub budget: Option<Duration>,
}

impl From<&Config> for QueryOptions {
    fn from(config: &Config) -> Self {
        QueryOptions {
            process_matching: config.process_matching,
            budget: Some(config.query_budget()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Matches(Vec<Match>),
    /// Nothing matched. Reported with HTTP 200 and `status: "error"`.
    Empty { message: String, debug: Value },
}

impl QueryOutcome {
    pub fn total(&self) -> usize {
        match self {
            QueryOutcome::Matches(matches) => matches.len(),
            QueryOutcome::Empty { .. } => 0,
        }
    }

    pub fn matches(&self) -> &[Match] {
        match self {
            QueryOutcome::Matches(matches) => matches,
            QueryOutcome::Empty { .. } => &[],
        }
    }

    /// The response body. The debug object is only included when exposed.
    pub fn to_json(&self, debug: DebugPayloads) -> Value {
        match self {
            QueryOutcome::Matches(matches) => json!({
                "status": "success",
                "results": matches,
                "total": matches.len(),
            }),
            QueryOutcome::Empty {
                message,
                debug: payload,
            } => {
                let mut body = json!({
                    "status": "error",
                    "message": message,
                    "results": [],
                    "total": 0,
                });
                if debug.is_exposed() {
                    body["debug"] = payload.clone();
                }
                body
            }
        }
    }
}

fn outcome(matches: Vec<Match>, message: &str, debug: Map<String, Value>) -> QueryOutcome {
    if matches.is_empty() {
        QueryOutcome::Empty {
            message: message.to_string(),
            debug: Value::Object(debug),
        }
    } else {
        QueryOutcome::Matches(matches)
    }
}

/// Runs one use case against a snapshot.
pub fn run_use_case(
    snapshot: &OntologySnapshot,
    use_case: UseCase,
    params: &UseCaseParams,
    table: &NamespaceTable,
    options: &QueryOptions,
) -> Result<QueryOutcome> {
    let identifier = params
        .identifier()
        .ok_or_else(|| OntologyError::bad_request("\"identifier\" is required"))?;
    let candidates = build_candidates(use_case, params, table);
    let mut debug = candidate_debug(&candidates);

    let graph = snapshot.graph();
    if graph.is_empty() {
        info!("{}: the ontology holds no triples", use_case);
        return Ok(outcome(Vec::new(), use_case.empty_message(), debug));
    }
    let Some((subject, rule)) = resolve_with_rule(graph, identifier) else {
        return Err(OntologyError::NotFound {
            message: format!(
                "Could not resolve identifier \"{}\" to a resource in the ontology",
                identifier
            ),
            debug: Some(Value::Object(debug)),
        });
    };
    info!(
        "{}: resolved {} to {} ({:?})",
        use_case, identifier, subject, rule
    );
    let budget = options.budget.map(Budget::new).unwrap_or_else(Budget::unlimited);
    debug.insert(use_case.subject_key().to_string(), json!(subject.as_str()));

    let result = match use_case {
        UseCase::IcvQualities => {
            let found = tags_for_icv_qualities(graph, subject.as_ref(), &candidates, &budget)?;
            let matches = found.into_iter().map(Match::Icv).collect();
            outcome(matches, use_case.empty_message(), debug)
        }
        UseCase::TypedInstances => {
            let found = tags_for_typed_instances(graph, subject.as_ref(), &candidates, &budget)?;
            let matches = found.into_iter().map(Match::Quality).collect();
            outcome(matches, use_case.empty_message(), debug)
        }
        UseCase::PlatformFlows => {
            let (found, trace) = flow_tags_for_platform(
                graph,
                subject.as_ref(),
                &candidates,
                options.process_matching,
                &budget,
            )?;
            debug.insert("wells_found_count".to_string(), json!(trace.wells.len()));
            debug.insert(
                "connected_candidates".to_string(),
                json!(candidates.connected.as_slice()),
            );
            if trace.wells.is_empty() {
                return Ok(outcome(
                    Vec::new(),
                    "Found 0 wells connected to platform (use_case_3).",
                    debug,
                ));
            }
            let wells: Vec<&String> = trace.wells.iter().take(MAX_DEBUG_WELLS).collect();
            let sample: Vec<&String> = trace.processes.iter().take(MAX_DEBUG_PROCESSES).collect();
            debug.insert("wells_found".to_string(), json!(wells));
            debug.insert("proc_candidates_count".to_string(), json!(trace.processes.len()));
            debug.insert("proc_candidates_sample".to_string(), json!(sample));
            debug.insert(
                "proc_char_candidates".to_string(),
                json!(candidates.process_characteristic.as_slice()),
            );
            debug.insert(
                "tag_preds_tried".to_string(),
                json!(candidates.is_about.as_slice()),
            );
            let matches = found.into_iter().map(Match::Flow).collect();
            outcome(matches, use_case.empty_message(), debug)
        }
    };
    info!("{}: {} results for {}", use_case, result.total(), identifier);
    Ok(result)
}

/// Parses the use case, takes the current snapshot (loading one if needed)
/// and runs the query. An unknown use case fails before the store is touched.
pub fn execute(store: &OntologyStore, use_case: &str, params: &UseCaseParams) -> Result<QueryOutcome> {
    let use_case: UseCase = use_case.parse()?;
    let snapshot = store.snapshot()?;
    let config = store.config();
    run_use_case(
        &snapshot,
        use_case,
        params,
        &config.namespaces,
        &QueryOptions::from(config),
    )
}
