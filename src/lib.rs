//! Rule-driven user agent analysis.
//!
//! A raw user agent is parsed into a labeled [`SyntaxTree`] by a
//! [`TreeParser`]. Compiled [`Matcher`]s then walk that tree with chains of
//! [`StepKind`]s (navigate, compare, look up, transform) and emit field
//! assignments. Competing assignments are merged by matcher priority, with the
//! earlier registered matcher winning ties.
//!
//! ```text
//! raw input ── TreeParser ──▶ SyntaxTree
//!                                │
//!   RulesetDefinition ── compile ─▶ MatcherRegistry ─┐
//!                                                    v
//!                                  Analyzer (anchor scan, chains, resolve)
//!                                                    │
//!                                                    v
//!                                   AnalysisResult ──▶ ResultCache (LRU)
//! ```
//!
//! [`AgentAnalyzer`] bundles all of it behind a single `analyze` call.

#[macro_use]
mod macros;
mod api;
mod cache;
mod engine;
mod error;
mod ruleset;
mod tree;

pub use api::{
    AgentAnalyzer, AnalysisDetails, AnalysisResult, DEFAULT_CACHE_SIZE, FieldValue, FiredMatcher, Options,
    UNKNOWN_VALUE,
};
pub use cache::ResultCache;
pub use engine::{
    Analyzer, AnchorIndex, Chain, ElementRange, Emission, FieldChain, FieldFilter, LookupSet, LookupTable, Lookups,
    Matcher, MatcherId, MatcherRegistry, MatcherTrace, RunMetrics, RunResult, Step, StepFlags, StepKind, TriggerInfo,
    WalkResult,
};
pub use error::{BuildError, CompileError};
pub use ruleset::{ExtractDefinition, MatcherDefinition, RulesetDefinition, StepDefinition};
pub use tree::{NodeId, ProductTreeParser, SyntaxTree, TreeBuilder, TreeParser};
