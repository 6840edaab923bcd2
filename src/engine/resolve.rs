//! Field conflict resolution.
//!
//! Every fired matcher offers its assignments here. Per field, the assignment
//! from the matcher with the highest priority wins; on equal priority the
//! matcher registered first wins. The comparison only looks at
//! `(priority, matcher id)`, so the outcome does not depend on the order in
//! which assignments are offered.
//!
//! ```text
//! offer(#3, p=10, AgentName=Foo)   -> kept
//! offer(#1, p=10, AgentName=Bar)   -> replaces (same priority, earlier matcher)
//! offer(#7, p=5,  AgentName=Baz)   -> ignored  (lower priority)
//! finish()                         -> AgentName = Bar (confidence 10)
//! ```

use super::matcher::{Emission, MatcherId};
use crate::{AnalysisResult, FieldValue};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
struct Candidate<'a> {
    value: Cow<'a, str>,
    priority: u32,
    matcher: MatcherId,
}

impl Candidate<'_> {
    fn outranks(&self, other: &Candidate<'_>) -> bool {
        self.priority > other.priority || (self.priority == other.priority && self.matcher < other.matcher)
    }
}

/// Collects competing assignments and keeps the winner per field.
#[derive(Debug, Default)]
pub(crate) struct FieldResolver<'a> {
    best: HashMap<&'a str, Candidate<'a>>,
}

impl<'a> FieldResolver<'a> {
    pub(crate) fn new() -> Self {
        FieldResolver { best: HashMap::new() }
    }

    pub(crate) fn offer(&mut self, matcher: MatcherId, priority: u32, emission: Emission<'a>) {
        let candidate = Candidate { value: emission.value, priority, matcher };
        match self.best.get_mut(emission.field) {
            Some(current) => {
                if candidate.outranks(current) {
                    *current = candidate;
                }
            }
            None => {
                self.best.insert(emission.field, candidate);
            }
        }
    }

    pub(crate) fn finish(self) -> AnalysisResult {
        let fields: BTreeMap<String, FieldValue> = self
            .best
            .into_iter()
            .map(|(field, c)| (field.to_string(), FieldValue { value: c.value.into_owned(), confidence: c.priority }))
            .collect();
        AnalysisResult::from_fields(fields)
    }
}
