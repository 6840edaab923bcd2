//! Matcher registry and anchor indexing.
//!
//! This module holds the *static* side of the engine: the compiled matchers in
//! registration order plus a cheap index that lets a run skip matchers which
//! cannot fire for the given input.
//!
//! Analysis is split into two phases:
//!
//! 1. **Compile/index** (this module, fed by `ruleset`): build the immutable
//!    [`MatcherRegistry`] and its [`AnchorIndex`].
//! 2. **Run** (see `analyzer.rs`): scan the raw input for anchors
//!    (`trigger.rs`), select the candidate matchers, evaluate them and resolve
//!    field conflicts.
//!
//! ## Anchors
//!
//! Anchors are derived from guard chains (see [`Chain::anchors`]); they are
//! necessary conditions, so skipping a matcher with a missing anchor never
//! changes a result. A matcher without anchors is *always on*.
//!
//! ## Invariants
//!
//! - `MatcherId` is an index into `MatcherRegistry::matchers` and
//!   `AnchorIndex::requirements`. Those vectors stay aligned.
//! - Each anchored matcher is listed in `by_anchor` exactly once, under its
//!   first anchor, so candidate collection never needs a set.
//!
//! [`Chain::anchors`]: super::step::Chain::anchors

use super::matcher::{Matcher, MatcherId};
use super::trigger::TriggerInfo;
use std::collections::{BTreeSet, HashMap};

/// Anchor table plus per-matcher requirements.
#[derive(Debug, Default, Clone)]
pub struct AnchorIndex {
    /// Matchers with no anchors.
    pub always_on: Vec<MatcherId>,
    /// Distinct lowercased anchors; positions are anchor ids.
    pub anchors: Vec<String>,
    /// Anchor ids required by each matcher (aligned with the matchers).
    pub requirements: Vec<Vec<usize>>,
    /// Anchored matchers keyed by their first anchor id.
    pub by_anchor: Vec<Vec<MatcherId>>,
}

impl AnchorIndex {
    fn build(matchers: &[Matcher]) -> Self {
        let mut index = AnchorIndex::default();
        let mut ids: HashMap<&str, usize> = HashMap::new();

        for (id, matcher) in matchers.iter().enumerate() {
            let mut required = Vec::with_capacity(matcher.anchors().len());
            for anchor in matcher.anchors() {
                let anchor_id = *ids.entry(anchor.as_str()).or_insert_with(|| {
                    index.anchors.push(anchor.clone());
                    index.by_anchor.push(Vec::new());
                    index.anchors.len() - 1
                });
                required.push(anchor_id);
            }

            match required.first() {
                Some(&first) => index.by_anchor[first].push(id),
                None => index.always_on.push(id),
            }
            index.requirements.push(required);
        }

        index
    }

    /// Matchers whose anchors are all present, in registration order.
    pub fn active(&self, trigger: &TriggerInfo) -> Vec<MatcherId> {
        let mut active = self.always_on.clone();
        for (anchor_id, listed) in self.by_anchor.iter().enumerate() {
            if !trigger.has(anchor_id) {
                continue;
            }
            active.extend(listed.iter().copied().filter(|&id| trigger.satisfies(&self.requirements[id])));
        }
        active.sort_unstable();
        active
    }
}

/// The compiled, immutable collection of matchers.
#[derive(Debug, Clone)]
pub struct MatcherRegistry {
    matchers: Vec<Matcher>,
    index: AnchorIndex,
    field_names: BTreeSet<String>,
}

impl MatcherRegistry {
    /// Index `matchers`; their order is the registration order used for tie-breaks.
    pub fn new(matchers: Vec<Matcher>) -> Self {
        let index = AnchorIndex::build(&matchers);
        let field_names =
            matchers.iter().flat_map(|m| m.fields().iter().map(|f| f.field().to_string())).collect();

        tracing::debug!(
            matchers = matchers.len(),
            anchors = index.anchors.len(),
            always_on = index.always_on.len(),
            "indexed matcher registry"
        );

        MatcherRegistry { matchers, index, field_names }
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn get(&self, id: MatcherId) -> Option<&Matcher> {
        self.matchers.get(id)
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn index(&self) -> &AnchorIndex {
        &self.index
    }

    /// Every field some matcher can produce, sorted.
    pub fn all_field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names.iter().map(String::as_str)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_names.contains(field)
    }
}
