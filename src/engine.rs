//! Rule evaluation engine.
//!
//! This module is the *public entry point* for everything that happens after a
//! user agent has been parsed into a [`SyntaxTree`](crate::SyntaxTree). It is
//! split into focused submodules under `src/engine/` while keeping public paths
//! flat (for example `crate::engine::Chain` and `crate::engine::Analyzer`).
//!
//! ## How the parts work together
//!
//! ```text
//! matchers (all) ──┐
//!                  │  MatcherRegistry::new            (registry.rs)
//!                  └───────────────┬───────────────
//!                                  │
//! tree.input() ── TriggerInfo::scan ─┼─ select candidates (anchors + fields)
//!                (trigger.rs)       │
//!                                  v
//!                        Analyzer::run (analyzer.rs)
//!                          - guards        (matcher.rs)
//!                          - field chains  (step.rs)
//!                                  │
//!                                  v
//!                        FieldResolver (resolve.rs)
//!                          - priority, then registration order
//!                                  │
//!                                  v
//!                           AnalysisResult
//! ```
//!
//! ## Responsibilities by module
//!
//! - `step.rs`: the step kinds and the chain interpreter (`WalkResult`).
//! - `text.rs`: case-insensitive comparisons and the string transforms.
//! - `lookup.rs`: immutable lookup tables and sets shared by steps.
//! - `matcher.rs`: guards + field chains, field filtering.
//! - `registry.rs`: the immutable matcher list and its anchor index.
//! - `trigger.rs`: scans the raw input for anchors.
//! - `analyzer.rs`: candidate selection and evaluation for one tree.
//! - `resolve.rs`: merges competing field assignments.
//! - `metrics.rs`: optional timing/trace data for runs.
//!
//! ## Debugging
//!
//! Set `AGENTMATCH_LOG=agentmatch=trace` to log candidate selection per input.

#[path = "engine/analyzer.rs"]
mod analyzer;
#[path = "engine/lookup.rs"]
mod lookup;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/registry.rs"]
mod registry;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/step.rs"]
mod step;
#[path = "engine/text.rs"]
mod text;
#[path = "engine/trigger.rs"]
mod trigger;


pub use analyzer::Analyzer;
pub use lookup::{LookupSet, LookupTable, Lookups};
pub use matcher::{Emission, FieldChain, FieldFilter, Matcher, MatcherId};
pub use metrics::{MatcherTrace, RunMetrics, RunResult};
pub use registry::{AnchorIndex, MatcherRegistry};
pub use step::{Chain, Step, StepFlags, StepKind, WalkResult};
pub use text::ElementRange;
pub use trigger::TriggerInfo;
