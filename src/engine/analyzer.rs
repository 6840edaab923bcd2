//! Analyzer: evaluate candidate matchers against one tree and merge the result.
//!
//! ```text
//! (0) trigger scan     -> anchors present in the raw input
//! (1) candidate select -> always-on + anchored matchers, registration order,
//!                         restricted to matchers producing a wanted field
//! (2) evaluate         -> guards, then field chains per fired matcher
//! (3) resolve          -> per field: highest priority, then earliest matcher
//! ```
//!
//! The analyzer only borrows the registry and field filter; every run owns its
//! scratch state, so one analyzer can serve any number of threads.

use super::matcher::{FieldFilter, MatcherId};
use super::metrics::{MatcherTrace, RunMetrics, RunResult};
use super::registry::MatcherRegistry;
use super::resolve::FieldResolver;
use super::trigger::TriggerInfo;
use crate::AnalysisResult;
use crate::tree::SyntaxTree;
use std::time::Instant;

/// Stateless evaluation of a registry against syntax trees.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<'r> {
    registry: &'r MatcherRegistry,
    fields: &'r FieldFilter,
}

impl<'r> Analyzer<'r> {
    pub fn new(registry: &'r MatcherRegistry, fields: &'r FieldFilter) -> Self {
        Analyzer { registry, fields }
    }

    /// Matchers worth evaluating for `tree`, in registration order.
    pub fn candidates(&self, tree: &SyntaxTree) -> Vec<MatcherId> {
        let trigger = TriggerInfo::scan(tree.input(), self.registry.index());
        let mut active = self.registry.index().active(&trigger);
        active.retain(|&id| self.registry.get(id).is_some_and(|m| m.produces_any(self.fields)));

        tracing::trace!(
            anchors_present = trigger.present_count(),
            candidates = active.len(),
            matchers = self.registry.len(),
            "trigger scan"
        );
        active
    }

    pub fn run(&self, tree: &SyntaxTree) -> AnalysisResult {
        let candidates = self.candidates(tree);
        self.evaluate(tree, &candidates, None)
    }

    /// Like [`run`](Self::run) but also returns per-matcher traces and timings.
    pub fn run_with_metrics(&self, tree: &SyntaxTree) -> RunResult {
        let total_start = Instant::now();

        let scan_start = Instant::now();
        let candidates = self.candidates(tree);
        let scan = scan_start.elapsed();

        let mut traces = Vec::with_capacity(candidates.len());
        let mut metrics = RunMetrics { scan, ..RunMetrics::default() };
        let result = self.evaluate(tree, &candidates, Some((&mut traces, &mut metrics)));
        metrics.total = total_start.elapsed();

        RunResult { result, candidates, traces, metrics }
    }

    /// Evaluate every matcher, bypassing the anchor index.
    #[cfg(test)]
    pub(crate) fn run_exhaustive(&self, tree: &SyntaxTree) -> AnalysisResult {
        let all: Vec<MatcherId> = (0..self.registry.len()).collect();
        self.evaluate(tree, &all, None)
    }

    fn evaluate(
        &self,
        tree: &SyntaxTree,
        candidates: &[MatcherId],
        mut observe: Option<(&mut Vec<MatcherTrace>, &mut RunMetrics)>,
    ) -> AnalysisResult {
        let eval_start = Instant::now();
        let mut resolver = FieldResolver::new();

        for &id in candidates {
            let Some(matcher) = self.registry.get(id) else {
                continue;
            };
            let emissions = matcher.evaluate(tree, self.fields);

            if let Some((traces, _)) = observe.as_mut() {
                traces.push(MatcherTrace {
                    matcher: id,
                    fired: emissions.is_some(),
                    emissions: emissions
                        .iter()
                        .flatten()
                        .map(|e| (e.field.to_string(), e.value.to_string()))
                        .collect(),
                });
            }

            for emission in emissions.into_iter().flatten() {
                resolver.offer(id, matcher.priority(), emission);
            }
        }

        let resolve_start = Instant::now();
        let result = resolver.finish();

        if let Some((_, metrics)) = observe {
            metrics.evaluation = resolve_start.duration_since(eval_start);
            metrics.resolve = resolve_start.elapsed();
        }
        result
    }
}
