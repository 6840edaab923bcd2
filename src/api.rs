use crate::cache::ResultCache;
use crate::engine::{Analyzer, FieldFilter, MatcherRegistry};
use crate::error::BuildError;
use crate::ruleset::RulesetDefinition;
use crate::tree::{ProductTreeParser, SyntaxTree, TreeParser};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Value reported for fields no matcher assigned.
pub const UNKNOWN_VALUE: &str = "Unknown";

/// Default number of cached results.
pub const DEFAULT_CACHE_SIZE: usize = 10_000;

/// Options that affect how an [`AgentAnalyzer`] is built.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum number of cached results; `0` disables the cache.
    pub cache_size: usize,
    /// Only produce these fields (`None` = every field the ruleset knows).
    pub fields: Option<Vec<String>>,
}

impl Default for Options {
    fn default() -> Self {
        Options { cache_size: DEFAULT_CACHE_SIZE, fields: None }
    }
}

/// One resolved field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub value: String,
    /// Priority of the matcher that produced the value.
    pub confidence: u32,
}

/// Result of one analysis: field name -> value, sorted by field name.
///
/// Fields no matcher assigned are simply absent; use
/// [`value_or_unknown`](Self::value_or_unknown) for a display value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    fields: BTreeMap<String, FieldValue>,
}

impl AnalysisResult {
    pub(crate) fn from_fields(fields: BTreeMap<String, FieldValue>) -> Self {
        AnalysisResult { fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|f| f.value.as_str())
    }

    pub fn value_or_unknown(&self, field: &str) -> &str {
        self.value(field).unwrap_or(UNKNOWN_VALUE)
    }

    /// Names of the fields that were set.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A matcher that fired during a verbose run.
#[derive(Debug, Clone)]
pub struct FiredMatcher {
    pub name: String,
    pub priority: u32,
    /// `(field, value)` assignments before conflict resolution.
    pub emissions: Vec<(String, String)>,
}

/// Additional details returned by [`AgentAnalyzer::analyze_verbose`].
///
/// This is meant for rule debugging and performance inspection; the default
/// [`AgentAnalyzer::analyze`] path does not collect any of it.
#[derive(Debug, Clone)]
pub struct AnalysisDetails {
    pub input: String,
    pub result: AnalysisResult,
    /// Names of the matchers selected by the anchor index.
    pub active_matchers: Vec<String>,
    /// Matchers whose guards passed, in registration order.
    pub fired: Vec<FiredMatcher>,
    /// Total elapsed time including tree parsing.
    pub total: Duration,
    pub parse: Duration,
    pub scan: Duration,
    pub evaluation: Duration,
    pub resolve: Duration,
}

/// Analyzes raw user agents with a compiled registry, a tree parser and a
/// result cache.
///
/// The analyzer is `Send + Sync`; share it through an `Arc` across threads.
///
/// # Example
/// ```
/// use agentmatch::{AgentAnalyzer, Options, RulesetDefinition};
///
/// let rules = RulesetDefinition::from_yaml_str(
///     "matchers: [ { extract: [ { field: AgentVersion, chain: [ { step: down, label: product }, { step: down, label: version } , { step: clean_version } ] } ] } ]",
/// )
/// .unwrap();
/// let analyzer = AgentAnalyzer::from_ruleset(&rules, &Options::default()).unwrap();
/// assert_eq!(analyzer.analyze("SomeBrowser/3_14").value("AgentVersion"), Some("3.14"));
/// ```
pub struct AgentAnalyzer {
    registry: Arc<MatcherRegistry>,
    fields: FieldFilter,
    parser: Box<dyn TreeParser>,
    cache: ResultCache,
}

impl std::fmt::Debug for AgentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentAnalyzer")
            .field("matchers", &self.registry.len())
            .field("fields", &self.fields)
            .field("parser", &"<parser>")
            .field("cache_capacity", &self.cache.capacity())
            .finish()
    }
}

impl AgentAnalyzer {
    /// Build an analyzer over `registry` using the reference [`ProductTreeParser`].
    ///
    /// Fails when `options.fields` names a field no matcher can produce.
    pub fn new(registry: Arc<MatcherRegistry>, options: &Options) -> Result<Self, BuildError> {
        let fields = match &options.fields {
            None => FieldFilter::all(),
            Some(requested) => {
                if let Some(unknown) = requested.iter().find(|f| !registry.has_field(f)) {
                    return Err(BuildError::UnknownField {
                        field: unknown.clone(),
                        available: registry.all_field_names().map(str::to_string).collect(),
                    });
                }
                FieldFilter::only(requested.iter().cloned())
            }
        };

        tracing::debug!(
            matchers = registry.len(),
            cache_size = options.cache_size,
            fields = ?fields.requested(),
            "built analyzer"
        );

        Ok(AgentAnalyzer {
            registry,
            fields,
            parser: Box::new(ProductTreeParser),
            cache: ResultCache::new(options.cache_size),
        })
    }

    /// Compile `ruleset` and build an analyzer over it.
    pub fn from_ruleset(ruleset: &RulesetDefinition, options: &Options) -> Result<Self, BuildError> {
        let registry = ruleset.compile()?;
        Self::new(Arc::new(registry), options)
    }

    /// Replace the tree parser. Cached results are dropped.
    pub fn with_parser(mut self, parser: impl TreeParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self.cache.clear();
        self
    }

    /// Analyze one raw user agent, consulting the cache first.
    pub fn analyze(&self, input: &str) -> Arc<AnalysisResult> {
        self.cache.get_or_insert_with(input, || self.analyze_tree(&self.parser.parse(input)))
    }

    /// Analyze an already parsed tree (never cached).
    pub fn analyze_tree(&self, tree: &SyntaxTree) -> AnalysisResult {
        Analyzer::new(&self.registry, &self.fields).run(tree)
    }

    /// Analyze `input` bypassing the cache and return traces and timings.
    pub fn analyze_verbose(&self, input: &str) -> AnalysisDetails {
        let start = Instant::now();
        let tree = self.parser.parse(input);
        let parse = start.elapsed();

        let run = Analyzer::new(&self.registry, &self.fields).run_with_metrics(&tree);
        let name_of = |id| self.registry.get(id).map(|m| m.name().to_string()).unwrap_or_default();

        let active_matchers = run.candidates.iter().map(|&id| name_of(id)).collect();
        let fired = run
            .traces
            .iter()
            .filter(|t| t.fired)
            .map(|t| FiredMatcher {
                name: name_of(t.matcher),
                priority: self.registry.get(t.matcher).map_or(0, |m| m.priority()),
                emissions: t.emissions.clone(),
            })
            .collect();

        AnalysisDetails {
            input: input.to_string(),
            result: run.result,
            active_matchers,
            fired,
            total: start.elapsed(),
            parse,
            scan: run.metrics.scan,
            evaluation: run.metrics.evaluation,
            resolve: run.metrics.resolve,
        }
    }

    /// Every field this analyzer can produce, sorted.
    pub fn all_possible_field_names(&self) -> Vec<String> {
        match self.fields.requested() {
            Some(requested) => requested.iter().cloned().collect(),
            None => self.registry.all_field_names().map(str::to_string).collect(),
        }
    }

    pub fn registry(&self) -> &Arc<MatcherRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}
