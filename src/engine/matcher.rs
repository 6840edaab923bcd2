//! Matchers: guard chains plus field-producing chains.
//!
//! A matcher fires when every guard chain walks without `Fail`. Once fired,
//! each field chain is evaluated independently; a chain that fails, or that
//! succeeds without a value, simply contributes nothing.
//!
//! ```text
//! Matcher "firefox" (priority 100)
//!   require: Down(product) > Down(name) > Equals(firefox)
//!   extract: AgentName    <- Down(product) > Down(name) > Equals(firefox) > NormalizeBrand()
//!            AgentVersion <- Down(product) > Down(version) > CleanVersion()
//! ```

use super::step::Chain;
use crate::tree::SyntaxTree;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Matcher identifier (index into the registry, i.e. registration order).
pub type MatcherId = usize;

/// A chain bound to the output field it produces.
#[derive(Debug, Clone)]
pub struct FieldChain {
    field: String,
    chain: Chain,
}

impl FieldChain {
    pub fn new(field: impl Into<String>, chain: Chain) -> Self {
        FieldChain { field: field.into(), chain }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }
}

/// One `(field, value)` assignment emitted by a fired matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission<'a> {
    pub field: &'a str,
    pub value: Cow<'a, str>,
}

/// Which output fields an analysis should produce.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    wanted: Option<BTreeSet<String>>,
}

impl FieldFilter {
    /// Produce every field.
    pub fn all() -> Self {
        FieldFilter { wanted: None }
    }

    /// Produce only the named fields.
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldFilter { wanted: Some(fields.into_iter().map(Into::into).collect()) }
    }

    pub fn wants(&self, field: &str) -> bool {
        self.wanted.as_ref().is_none_or(|w| w.contains(field))
    }

    /// The requested fields, or `None` when everything is wanted.
    pub fn requested(&self) -> Option<&BTreeSet<String>> {
        self.wanted.as_ref()
    }
}

/// Compiled, immutable rule.
#[derive(Debug, Clone)]
pub struct Matcher {
    name: String,
    priority: u32,
    guards: Vec<Chain>,
    fields: Vec<FieldChain>,
    anchors: Vec<String>,
}

impl Matcher {
    pub fn new(name: impl Into<String>, priority: u32, mut guards: Vec<Chain>, fields: Vec<FieldChain>) -> Self {
        // Guards that can fail go first so a non-applying matcher is rejected early.
        guards.sort_by_key(|g| !g.can_fail());

        let mut anchors: Vec<String> = guards.iter().flat_map(Chain::anchors).collect();
        anchors.sort();
        anchors.dedup();

        Matcher { name: name.into(), priority, guards, fields, anchors }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn guards(&self) -> &[Chain] {
        &self.guards
    }

    pub fn fields(&self) -> &[FieldChain] {
        &self.fields
    }

    /// Lowercased literals that must all occur in the raw input for this
    /// matcher to fire.
    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    /// Whether this matcher produces at least one field wanted by `filter`.
    pub fn produces_any(&self, filter: &FieldFilter) -> bool {
        self.fields.iter().any(|f| filter.wants(f.field()))
    }

    pub fn guards_pass(&self, tree: &SyntaxTree) -> bool {
        self.guards.iter().all(|guard| !guard.evaluate(tree).is_fail())
    }

    /// `None` when a guard fails, otherwise the non-absent assignments of the
    /// wanted fields, in declaration order.
    pub fn evaluate<'a>(&'a self, tree: &'a SyntaxTree, filter: &FieldFilter) -> Option<Vec<Emission<'a>>> {
        if !self.guards_pass(tree) {
            return None;
        }
        let emissions = self
            .fields
            .iter()
            .filter(|fc| filter.wants(fc.field()))
            .filter_map(|fc| fc.chain.evaluate(tree).into_value().map(|value| Emission { field: fc.field(), value }))
            .collect();
        Some(emissions)
    }
}
