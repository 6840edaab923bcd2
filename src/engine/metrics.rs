//! Engine run metrics.
//!
//! This module defines a small set of structs used to observe and debug what a
//! single analysis did.
//!
//! The intended usage is:
//!
//! - `Analyzer::run` for normal operation.
//! - `Analyzer::run_with_metrics` for profiling, rule debugging and the
//!   verbose CLI report.
//!
//! Metrics are *opt-in*: the plain run collects no traces and allocates nothing
//! beyond the result itself.

use super::matcher::MatcherId;
use crate::AnalysisResult;
use std::time::Duration;

/// Timings for one run.
#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for `Analyzer::run_with_metrics`.
    pub total: Duration,
    /// Anchor scan and candidate selection.
    pub scan: Duration,
    /// Guard and field chain evaluation over all candidates.
    pub evaluation: Duration,
    /// Field conflict resolution.
    pub resolve: Duration,
}

/// What one candidate matcher did.
#[derive(Debug, Clone)]
pub struct MatcherTrace {
    pub matcher: MatcherId,
    /// Whether all guards passed.
    pub fired: bool,
    /// `(field, value)` assignments before conflict resolution.
    pub emissions: Vec<(String, String)>,
}

/// Analyzer output bundled with traces and timings.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub result: AnalysisResult,
    /// Matchers selected by the anchor index (registration order).
    pub candidates: Vec<MatcherId>,
    pub traces: Vec<MatcherTrace>,
    pub metrics: RunMetrics,
}
