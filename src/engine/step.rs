//! Step chains: the tree-walking interpreter.
//!
//! A [`Chain`] is a singly linked list of [`Step`]s. Each step either moves the
//! current node (navigation), tests the working value (comparison / lookup
//! membership) or rewrites it (lookup translation / transform), and then hands
//! the result to the next step:
//!
//! ```text
//! root, None ──Down(version)──▶ version node, None
//!                              ──CleanVersion──▶ version node, Some("3.1")
//!                                              ──(end)──▶ Success
//! ```
//!
//! ## Fail vs absent
//!
//! [`WalkResult::Fail`] means "this chain does not apply". A
//! [`WalkResult::Success`] may still carry an absent value (navigation moved
//! somewhere but no text was picked yet). The two are never merged: only
//! `DefaultIfNull` deliberately turns a failing or absent remainder into a value.
//!
//! Any step that needs text while the value is absent reads the raw text of the
//! node it is positioned at.

use super::lookup::{LookupSet, LookupTable};
use super::text::{self, ElementRange};
use crate::tree::{NodeId, SyntaxTree};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

bitflags::bitflags! {
    /// Static properties of a step.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StepFlags: u8 {
        /// The step can return [`WalkResult::Fail`] by itself.
        const CAN_FAIL         = 1 << 0;
        /// Moves the current node; the working value becomes absent.
        const NAVIGATES        = 1 << 1;
        /// Replaces the working value with derived text.
        const TRANSFORMS       = 1 << 2;
        /// Replaces the working value with the raw node text.
        const RESETS_VALUE     = 1 << 3;
        /// Turns a failing remainder into a success.
        const RECOVERS         = 1 << 4;
        /// Passes only when its literal occurs in the tested value.
        const REQUIRES_LITERAL = 1 << 5;
    }
}

/// Outcome of evaluating a chain from some node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkResult<'a> {
    /// The chain does not apply.
    Fail,
    /// The chain applied; `value` is `None` when no text is held.
    Success { value: Option<Cow<'a, str>>, node: NodeId },
}

impl<'a> WalkResult<'a> {
    pub fn is_fail(&self) -> bool {
        matches!(self, WalkResult::Fail)
    }

    /// The held value, if the walk succeeded with one.
    pub fn value(&self) -> Option<&str> {
        match self {
            WalkResult::Success { value: Some(v), .. } => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Cow<'a, str>> {
        match self {
            WalkResult::Success { value, .. } => value,
            WalkResult::Fail => None,
        }
    }
}

/// The closed set of step kinds with their parameters.
#[derive(Debug, Clone)]
pub enum StepKind {
    // Navigation
    Up,
    /// Children in `range` (1-based, counted among children passing `label`).
    Down { range: ElementRange, label: Option<String> },
    Next,
    Prev,
    NextN(usize),
    PrevN(usize),

    // Comparison
    Equals(String),
    NotEquals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    IsNull,
    IsInSet(Arc<LookupSet>),
    IsNotInSet(Arc<LookupSet>),

    // Lookup
    IsInLookupContains(Arc<LookupTable>),
    IsInLookupPrefix(Arc<LookupTable>),
    IsNotInLookupPrefix(Arc<LookupTable>),
    Lookup { table: Arc<LookupTable>, default: Option<String> },
    LookupPrefix { table: Arc<LookupTable>, default: Option<String> },
    LookupContains { table: Arc<LookupTable>, default: Option<String> },

    // Transform
    Concat { prefix: String, postfix: String },
    ConcatPrefix(String),
    ConcatPostfix(String),
    ReplaceString { search: String, replace: String },
    CleanVersion,
    NormalizeBrand,
    BackToFull,
    DefaultIfNull(Option<String>),
    SegmentRange(ElementRange),
    WordRange(ElementRange),
}

impl StepKind {
    /// `Down` over every child carrying `label`.
    pub fn down(label: &str) -> Self {
        StepKind::Down { range: ElementRange::ALL, label: Some(label.to_string()) }
    }

    /// `Down` restricted to the `position`-th child carrying `label`.
    pub fn down_nth(label: &str, position: usize) -> Self {
        StepKind::Down { range: ElementRange::single(position), label: Some(label.to_string()) }
    }

    pub fn flags(&self) -> StepFlags {
        use StepKind::*;
        match self {
            Up | Down { .. } | Next | Prev | NextN(_) | PrevN(_) => StepFlags::CAN_FAIL | StepFlags::NAVIGATES,
            Equals(_) | Contains(_) | StartsWith(_) | EndsWith(_) => {
                StepFlags::CAN_FAIL | StepFlags::REQUIRES_LITERAL
            }
            NotEquals(_) | IsNull | IsInSet(_) | IsNotInSet(_) => StepFlags::CAN_FAIL,
            IsInLookupContains(_) | IsInLookupPrefix(_) | IsNotInLookupPrefix(_) => StepFlags::CAN_FAIL,
            Lookup { default, .. } | LookupPrefix { default, .. } | LookupContains { default, .. } => {
                if default.is_some() {
                    StepFlags::TRANSFORMS
                } else {
                    StepFlags::TRANSFORMS | StepFlags::CAN_FAIL
                }
            }
            Concat { .. }
            | ConcatPrefix(_)
            | ConcatPostfix(_)
            | ReplaceString { .. }
            | CleanVersion
            | NormalizeBrand => StepFlags::TRANSFORMS,
            BackToFull => StepFlags::RESETS_VALUE,
            DefaultIfNull(_) => StepFlags::TRANSFORMS | StepFlags::RECOVERS,
            SegmentRange(_) | WordRange(_) => StepFlags::TRANSFORMS | StepFlags::CAN_FAIL,
        }
    }

    /// Advisory: whether this step can ever emit `Fail` on its own.
    ///
    /// Only used to order guard chains; evaluation never consults it.
    pub fn can_fail(&self) -> bool {
        self.flags().contains(StepFlags::CAN_FAIL)
    }

    /// The literal a `REQUIRES_LITERAL` step tests for.
    pub fn literal(&self) -> Option<&str> {
        match self {
            StepKind::Equals(s) | StepKind::Contains(s) | StepKind::StartsWith(s) | StepKind::EndsWith(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use StepKind::*;
        match self {
            Up => write!(f, "Up()"),
            Down { range, label } => write!(f, "Down({}{})", range, label.as_deref().unwrap_or("")),
            Next => write!(f, "Next()"),
            Prev => write!(f, "Prev()"),
            NextN(n) => write!(f, "Next({n})"),
            PrevN(n) => write!(f, "Prev({n})"),
            Equals(s) => write!(f, "Equals({s})"),
            NotEquals(s) => write!(f, "NotEquals({s})"),
            Contains(s) => write!(f, "Contains({s})"),
            StartsWith(s) => write!(f, "StartsWith({s})"),
            EndsWith(s) => write!(f, "EndsWith({s})"),
            IsNull => write!(f, "IsNull()"),
            IsInSet(set) => write!(f, "IsInSet(@{})", set.name()),
            IsNotInSet(set) => write!(f, "IsNotInSet(@{})", set.name()),
            IsInLookupContains(t) => write!(f, "IsInLookupContains(@{})", t.name()),
            IsInLookupPrefix(t) => write!(f, "IsInLookupPrefix(@{})", t.name()),
            IsNotInLookupPrefix(t) => write!(f, "IsNotInLookupPrefix(@{})", t.name()),
            Lookup { table, default } => write_lookup(f, "Lookup", table, default),
            LookupPrefix { table, default } => write_lookup(f, "LookupPrefix", table, default),
            LookupContains { table, default } => write_lookup(f, "LookupContains", table, default),
            Concat { prefix, postfix } => write!(f, "Concat({prefix};{postfix})"),
            ConcatPrefix(s) => write!(f, "ConcatPrefix({s})"),
            ConcatPostfix(s) => write!(f, "ConcatPostfix({s})"),
            ReplaceString { search, replace } => write!(f, "ReplaceString({search};{replace})"),
            CleanVersion => write!(f, "CleanVersion()"),
            NormalizeBrand => write!(f, "NormalizeBrand()"),
            BackToFull => write!(f, "BackToFull()"),
            DefaultIfNull(d) => write!(f, "DefaultIfNull({})", d.as_deref().unwrap_or("")),
            SegmentRange(r) => write!(f, "SegmentRange({r})"),
            WordRange(r) => write!(f, "WordRange({r})"),
        }
    }
}

fn write_lookup(f: &mut fmt::Formatter<'_>, name: &str, table: &LookupTable, default: &Option<String>) -> fmt::Result {
    match default {
        Some(d) => write!(f, "{name}(@{};{d})", table.name()),
        None => write!(f, "{name}(@{})", table.name()),
    }
}

/// One link of a chain: its own parameters plus the rest of the chain.
#[derive(Debug, Clone)]
pub struct Step {
    kind: StepKind,
    next: Option<Box<Step>>,
}

impl Step {
    fn link(kind: StepKind, next: Option<Step>) -> Self {
        Step { kind, next: next.map(Box::new) }
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn next(&self) -> Option<&Step> {
        self.next.as_deref()
    }

    /// Evaluate this step and the remainder of the chain.
    pub fn evaluate<'a>(&'a self, tree: &'a SyntaxTree, node: NodeId, value: Option<Cow<'a, str>>) -> WalkResult<'a> {
        use StepKind::*;
        match &self.kind {
            Up => match tree.parent(node) {
                Some(parent) => self.walk_next(tree, parent, None),
                None => WalkResult::Fail,
            },
            Down { range, label } => self.walk_down(tree, node, *range, label.as_deref()),
            Next => self.walk_sibling(tree, node, 1),
            Prev => self.walk_sibling(tree, node, -1),
            NextN(n) => match isize::try_from(*n) {
                Ok(offset) => self.walk_sibling(tree, node, offset),
                Err(_) => WalkResult::Fail,
            },
            PrevN(n) => match isize::try_from(*n) {
                Ok(offset) => self.walk_sibling(tree, node, -offset),
                Err(_) => WalkResult::Fail,
            },

            Equals(expected) => self.test(tree, node, value, |v| v.eq_ignore_ascii_case(expected)),
            NotEquals(expected) => self.test(tree, node, value, |v| !v.eq_ignore_ascii_case(expected)),
            Contains(needle) => self.test(tree, node, value, |v| text::contains_ignore_case(v, needle)),
            StartsWith(prefix) => self.test(tree, node, value, |v| text::starts_with_ignore_case(v, prefix)),
            EndsWith(suffix) => self.test(tree, node, value, |v| text::ends_with_ignore_case(v, suffix)),
            // The fallback node text only counts as absent when it is empty.
            IsNull => match value {
                None if tree.text(node).is_empty() => self.walk_next(tree, node, None),
                _ => WalkResult::Fail,
            },
            IsInSet(set) => self.test(tree, node, value, |v| set.contains(v)),
            IsNotInSet(set) => self.test(tree, node, value, |v| !set.contains(v)),

            IsInLookupContains(table) => self.test(tree, node, value, |v| table.get_contains(v).is_some()),
            IsInLookupPrefix(table) => self.test(tree, node, value, |v| table.get_prefix(v).is_some()),
            IsNotInLookupPrefix(table) => self.test(tree, node, value, |v| table.get_prefix(v).is_none()),
            Lookup { table, default } => {
                let actual = actual_value(tree, node, value);
                self.translate(tree, node, table.get(&actual), default)
            }
            LookupPrefix { table, default } => {
                let actual = actual_value(tree, node, value);
                self.translate(tree, node, table.get_prefix(&actual), default)
            }
            LookupContains { table, default } => {
                let actual = actual_value(tree, node, value);
                self.translate(tree, node, table.get_contains(&actual), default)
            }

            Concat { prefix, postfix } => {
                let actual = actual_value(tree, node, value);
                self.walk_next(tree, node, Some(Cow::Owned(format!("{prefix}{actual}{postfix}"))))
            }
            ConcatPrefix(prefix) => {
                let actual = actual_value(tree, node, value);
                self.walk_next(tree, node, Some(Cow::Owned(format!("{prefix}{actual}"))))
            }
            ConcatPostfix(postfix) => {
                let actual = actual_value(tree, node, value);
                self.walk_next(tree, node, Some(Cow::Owned(format!("{actual}{postfix}"))))
            }
            ReplaceString { search, replace } => {
                let actual = actual_value(tree, node, value);
                self.walk_next(tree, node, Some(text::replace_literal(actual, search, replace)))
            }
            CleanVersion => {
                let actual = actual_value(tree, node, value);
                self.walk_next(tree, node, Some(text::clean_version(actual)))
            }
            NormalizeBrand => {
                let actual = actual_value(tree, node, value);
                self.walk_next(tree, node, Some(Cow::Owned(text::normalize_brand(&actual))))
            }
            BackToFull => self.walk_next(tree, node, Some(Cow::Borrowed(tree.text(node)))),
            DefaultIfNull(default) => {
                let fallback = || default.as_deref().map(Cow::Borrowed);
                match self.walk_next(tree, node, value) {
                    WalkResult::Success { value: Some(v), node: at } => {
                        WalkResult::Success { value: Some(v), node: at }
                    }
                    WalkResult::Success { value: None, node: at } => {
                        WalkResult::Success { value: fallback(), node: at }
                    }
                    WalkResult::Fail => WalkResult::Success { value: fallback(), node },
                }
            }
            SegmentRange(range) => match value {
                Some(v) => match text::segment_range(&v, *range) {
                    Some(selected) => self.walk_next(tree, node, Some(Cow::Owned(selected))),
                    None => WalkResult::Fail,
                },
                None => WalkResult::Fail,
            },
            WordRange(range) => match value {
                Some(v) => match text::word_range(&v, *range) {
                    Some(selected) => self.walk_next(tree, node, Some(Cow::Owned(selected))),
                    None => WalkResult::Fail,
                },
                None => WalkResult::Fail,
            },
        }
    }

    fn walk_next<'a>(&'a self, tree: &'a SyntaxTree, node: NodeId, value: Option<Cow<'a, str>>) -> WalkResult<'a> {
        match &self.next {
            Some(next) => next.evaluate(tree, node, value),
            None => WalkResult::Success { value, node },
        }
    }

    /// Forward the (fallback-resolved) value unchanged when `pass` holds.
    fn test<'a>(
        &'a self,
        tree: &'a SyntaxTree,
        node: NodeId,
        value: Option<Cow<'a, str>>,
        pass: impl FnOnce(&str) -> bool,
    ) -> WalkResult<'a> {
        let actual = actual_value(tree, node, value);
        if pass(&actual) { self.walk_next(tree, node, Some(actual)) } else { WalkResult::Fail }
    }

    fn translate<'a>(
        &'a self,
        tree: &'a SyntaxTree,
        node: NodeId,
        found: Option<&'a str>,
        default: &'a Option<String>,
    ) -> WalkResult<'a> {
        match found.or(default.as_deref()) {
            Some(v) => self.walk_next(tree, node, Some(Cow::Borrowed(v))),
            None => WalkResult::Fail,
        }
    }

    fn walk_sibling<'a>(&'a self, tree: &'a SyntaxTree, node: NodeId, offset: isize) -> WalkResult<'a> {
        match tree.sibling(node, offset) {
            Some(sibling) => self.walk_next(tree, sibling, None),
            None => WalkResult::Fail,
        }
    }

    /// Try each selected child in order; the first non-failing remainder wins.
    fn walk_down<'a>(
        &'a self,
        tree: &'a SyntaxTree,
        node: NodeId,
        range: ElementRange,
        label: Option<&str>,
    ) -> WalkResult<'a> {
        let mut position = 0;
        for &child in tree.children(node) {
            if label.is_some_and(|l| tree.label(child) != l) {
                continue;
            }
            position += 1;
            if range.is_past(position) {
                break;
            }
            if !range.contains(position) {
                continue;
            }
            let result = self.walk_next(tree, child, None);
            if !result.is_fail() {
                return result;
            }
        }
        WalkResult::Fail
    }
}

fn actual_value<'a>(tree: &'a SyntaxTree, node: NodeId, value: Option<Cow<'a, str>>) -> Cow<'a, str> {
    value.unwrap_or_else(|| Cow::Borrowed(tree.text(node)))
}

/// A non-empty, immutable chain of steps.
#[derive(Debug, Clone)]
pub struct Chain {
    head: Box<Step>,
}

impl Chain {
    /// Link `first` and `rest` into a chain, evaluated left to right.
    pub fn new(first: StepKind, rest: impl IntoIterator<Item = StepKind>) -> Self {
        let rest: Vec<StepKind> = rest.into_iter().collect();
        let tail = rest.into_iter().rev().fold(None, |next, kind| Some(Step::link(kind, next)));
        Chain { head: Box::new(Step::link(first, tail)) }
    }

    /// `None` for an empty list.
    pub fn from_kinds(kinds: Vec<StepKind>) -> Option<Self> {
        let mut iter = kinds.into_iter();
        let first = iter.next()?;
        Some(Chain::new(first, iter))
    }

    pub fn head(&self) -> &Step {
        &self.head
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        std::iter::successors(Some(&*self.head), |step| step.next())
    }

    pub fn step_count(&self) -> usize {
        self.steps().count()
    }

    /// Evaluate from the root of `tree` with an absent value.
    pub fn evaluate<'a>(&'a self, tree: &'a SyntaxTree) -> WalkResult<'a> {
        self.head.evaluate(tree, tree.root(), None)
    }

    pub fn evaluate_from<'a>(
        &'a self,
        tree: &'a SyntaxTree,
        node: NodeId,
        value: Option<Cow<'a, str>>,
    ) -> WalkResult<'a> {
        self.head.evaluate(tree, node, value)
    }

    /// Whether any step can fail on its own.
    pub fn can_fail(&self) -> bool {
        self.steps().any(|s| s.kind().can_fail())
    }

    /// Lowercased literals that must occur in the raw input for this chain to
    /// succeed.
    ///
    /// While the working value is still raw node text (start of chain, after
    /// navigation or `BackToFull`) an `Equals`/`Contains`/`StartsWith`/`EndsWith`
    /// literal can only match text that is part of the input. Transforms end
    /// that guarantee until the next navigation; `DefaultIfNull` ends it for
    /// the rest of the chain.
    pub fn anchors(&self) -> Vec<String> {
        let mut anchors = Vec::new();
        let mut raw_text = true;
        for step in self.steps() {
            let flags = step.kind().flags();
            if flags.contains(StepFlags::RECOVERS) {
                break;
            }
            if flags.intersects(StepFlags::NAVIGATES | StepFlags::RESETS_VALUE) {
                raw_text = true;
            } else if flags.contains(StepFlags::TRANSFORMS) {
                raw_text = false;
            }
            if raw_text && flags.contains(StepFlags::REQUIRES_LITERAL) {
                if let Some(literal) = step.kind().literal().filter(|l| !l.is_empty()) {
                    anchors.push(literal.to_ascii_lowercase());
                }
            }
        }
        anchors.sort();
        anchors.dedup();
        anchors
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps().enumerate() {
            if idx > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{}", step.kind())?;
        }
        Ok(())
    }
}
