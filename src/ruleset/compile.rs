//! Compilation of ruleset definitions into a matcher registry.
//!
//! Every structural problem (unknown lookup, malformed range, empty chain,
//! missing field name) is reported here, once, so that analysis itself never
//! has to deal with configuration errors.

use super::definition::{MatcherDefinition, RulesetDefinition, StepDefinition};
use crate::engine::{
    Chain, ElementRange, FieldChain, LookupSet, LookupTable, Lookups, Matcher, MatcherRegistry, StepKind,
};
use crate::error::CompileError;

impl RulesetDefinition {
    /// Compile into an immutable registry; matchers keep their document order.
    pub fn compile(&self) -> Result<MatcherRegistry, CompileError> {
        let mut lookups = Lookups::new();
        for (name, entries) in &self.lookups {
            lookups.add_table(LookupTable::new(name.clone(), entries.iter().map(|(k, v)| (k, v.clone()))));
        }
        for (name, members) in &self.sets {
            lookups.add_set(LookupSet::new(name.clone(), members));
        }

        let matchers = self
            .matchers
            .iter()
            .enumerate()
            .map(|(idx, def)| compile_matcher(idx, def, &lookups))
            .collect::<Result<Vec<_>, _>>()?;

        let registry = MatcherRegistry::new(matchers);
        tracing::info!(
            matchers = registry.len(),
            anchors = registry.index().anchors.len(),
            always_on = registry.index().always_on.len(),
            lookups = lookups.table_count(),
            sets = lookups.set_count(),
            "compiled ruleset"
        );
        Ok(registry)
    }
}

fn compile_matcher(idx: usize, def: &MatcherDefinition, lookups: &Lookups) -> Result<Matcher, CompileError> {
    let name = def.name.clone().unwrap_or_else(|| format!("matcher-{idx}"));
    let ctx = StepCompiler { matcher: &name, lookups };

    if def.extract.is_empty() {
        return Err(CompileError::NoExtractions { matcher: name });
    }

    let guards = def.require.iter().map(|steps| ctx.chain(steps)).collect::<Result<Vec<_>, _>>()?;

    let mut fields = Vec::with_capacity(def.extract.len());
    for extract in &def.extract {
        let field = extract.field.trim();
        if field.is_empty() {
            return Err(CompileError::EmptyFieldName { matcher: name });
        }
        fields.push(FieldChain::new(field, ctx.chain(&extract.chain)?));
    }

    let matcher = Matcher::new(name.as_str(), def.priority, guards, fields);
    tracing::debug!(
        matcher = %name,
        priority = matcher.priority(),
        guards = matcher.guards().len(),
        fields = matcher.fields().len(),
        anchors = ?matcher.anchors(),
        "compiled matcher"
    );
    Ok(matcher)
}

/// Resolves step definitions of one matcher against the named lookups.
struct StepCompiler<'a> {
    matcher: &'a str,
    lookups: &'a Lookups,
}

impl StepCompiler<'_> {
    fn chain(&self, steps: &[StepDefinition]) -> Result<Chain, CompileError> {
        let kinds = steps.iter().map(|step| self.step(step)).collect::<Result<Vec<_>, _>>()?;
        Chain::from_kinds(kinds).ok_or_else(|| CompileError::EmptyChain { matcher: self.matcher.to_string() })
    }

    fn step(&self, step: &StepDefinition) -> Result<StepKind, CompileError> {
        use StepDefinition as D;
        let kind = match step {
            D::Up => StepKind::Up,
            D::Down { label, from, to } => StepKind::Down { range: self.range(*from, *to)?, label: label.clone() },
            D::Next => StepKind::Next,
            D::Prev => StepKind::Prev,
            D::NextN { count } => StepKind::NextN(self.count(*count, "next_n")?),
            D::PrevN { count } => StepKind::PrevN(self.count(*count, "prev_n")?),

            D::Equals { value } => StepKind::Equals(value.clone()),
            D::NotEquals { value } => StepKind::NotEquals(value.clone()),
            D::Contains { value } => StepKind::Contains(value.clone()),
            D::StartsWith { value } => StepKind::StartsWith(value.clone()),
            D::EndsWith { value } => StepKind::EndsWith(value.clone()),
            D::IsNull => StepKind::IsNull,
            D::IsInSet { set } => StepKind::IsInSet(self.set(set)?),
            D::IsNotInSet { set } => StepKind::IsNotInSet(self.set(set)?),

            D::IsInLookupContains { lookup } => StepKind::IsInLookupContains(self.table(lookup)?),
            D::IsInLookupPrefix { lookup } => StepKind::IsInLookupPrefix(self.table(lookup)?),
            D::IsNotInLookupPrefix { lookup } => StepKind::IsNotInLookupPrefix(self.table(lookup)?),
            D::Lookup { lookup, default } => StepKind::Lookup { table: self.table(lookup)?, default: default.clone() },
            D::LookupPrefix { lookup, default } => {
                StepKind::LookupPrefix { table: self.table(lookup)?, default: default.clone() }
            }
            D::LookupContains { lookup, default } => {
                StepKind::LookupContains { table: self.table(lookup)?, default: default.clone() }
            }

            D::Concat { prefix, postfix } => StepKind::Concat { prefix: prefix.clone(), postfix: postfix.clone() },
            D::ConcatPrefix { value } => StepKind::ConcatPrefix(value.clone()),
            D::ConcatPostfix { value } => StepKind::ConcatPostfix(value.clone()),
            D::ReplaceString { search, replace } => {
                StepKind::ReplaceString { search: search.clone(), replace: replace.clone() }
            }
            D::CleanVersion => StepKind::CleanVersion,
            D::NormalizeBrand => StepKind::NormalizeBrand,
            D::BackToFull => StepKind::BackToFull,
            D::DefaultIfNull { default } => StepKind::DefaultIfNull(default.clone()),
            D::SegmentRange { from, to } => StepKind::SegmentRange(self.range(*from, *to)?),
            D::WordRange { from, to } => StepKind::WordRange(self.range(*from, *to)?),
        };
        Ok(kind)
    }

    fn range(&self, from: usize, to: Option<usize>) -> Result<ElementRange, CompileError> {
        let range = ElementRange::new(from, to);
        if range.is_valid() {
            Ok(range)
        } else {
            Err(CompileError::InvalidRange {
                matcher: self.matcher.to_string(),
                start: from,
                end: to.map_or_else(String::new, |end| end.to_string()),
            })
        }
    }

    fn count(&self, count: usize, step: &'static str) -> Result<usize, CompileError> {
        if count == 0 {
            return Err(CompileError::InvalidCount { matcher: self.matcher.to_string(), step });
        }
        Ok(count)
    }

    fn table(&self, name: &str) -> Result<std::sync::Arc<LookupTable>, CompileError> {
        self.lookups
            .table(name)
            .ok_or_else(|| CompileError::UnknownLookup { matcher: self.matcher.to_string(), name: name.to_string() })
    }

    fn set(&self, name: &str) -> Result<std::sync::Arc<LookupSet>, CompileError> {
        self.lookups
            .set(name)
            .ok_or_else(|| CompileError::UnknownSet { matcher: self.matcher.to_string(), name: name.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ProductTreeParser, TreeParser};
    use crate::{Analyzer, FieldFilter};
    use rstest::rstest;

    fn compile(yaml: &str) -> Result<MatcherRegistry, CompileError> {
        RulesetDefinition::from_yaml_str(yaml)?.compile()
    }

    #[test]
    fn shared_tables_are_not_copied_per_step() {
        let registry = compile(
            r#"
lookups:
  brands: { firefox: Mozilla }
matchers:
  - extract:
      - field: A
        chain: [ { step: down, label: product }, { step: down, label: name }, { step: lookup, lookup: brands } ]
      - field: B
        chain: [ { step: down, label: product }, { step: down, label: name }, { step: lookup, lookup: brands } ]
"#,
        )
        .unwrap();

        let tables: Vec<_> = registry.matchers()[0]
            .fields()
            .iter()
            .filter_map(|f| f.chain().steps().find_map(|s| match s.kind() {
                StepKind::Lookup { table, .. } => Some(table.clone()),
                _ => None,
            }))
            .collect();
        assert_eq!(tables.len(), 2);
        assert!(std::sync::Arc::ptr_eq(&tables[0], &tables[1]));
    }

    #[test]
    fn compiled_rules_run_end_to_end() {
        let registry = compile(
            r#"
matchers:
  - name: firefox
    priority: 10
    require:
      - [ { step: down, label: product }, { step: down, label: name }, { step: equals, value: firefox } ]
    extract:
      - field: AgentName
        chain: [ { step: down, label: product }, { step: down, label: name }, { step: equals, value: firefox }, { step: normalize_brand } ]
      - field: AgentVersion
        chain:
          - { step: down, label: product }
          - { step: down, label: name }
          - { step: equals, value: firefox }
          - { step: up }
          - { step: down, label: version }
          - { step: clean_version }
"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.matchers()[0].name(), "firefox");
        assert_eq!(registry.index().anchors, vec!["firefox".to_string()]);

        let tree = ProductTreeParser.parse("Mozilla/5.0 (X11; Linux) Gecko/20100101 Firefox/120_0");
        let filter = FieldFilter::all();
        let result = Analyzer::new(&registry, &filter).run(&tree);
        assert_eq!(result.value("AgentVersion"), Some("120.0"));
        assert_eq!(result.value("AgentName"), Some("Firefox"));
    }

    #[test]
    fn unnamed_matchers_get_positional_names() {
        let registry =
            compile("matchers: [ { extract: [ { field: F, chain: [ { step: back_to_full } ] } ] } ]").unwrap();
        assert_eq!(registry.matchers()[0].name(), "matcher-0");
        assert!(registry.has_field("F"));
    }

    #[rstest]
    #[case("[ { step: lookup, lookup: nope } ]", "unknown lookup table `nope`")]
    #[case("[ { step: is_in_set, set: nope } ]", "unknown lookup set `nope`")]
    #[case("[ { step: down, label: x, from: 3, to: 2 } ]", "invalid range [3-2]")]
    #[case("[ { step: word_range, from: 0 } ]", "invalid range [0-]")]
    #[case("[ { step: prev_n, count: 0 } ]", "`prev_n` needs a count")]
    #[case("[]", "empty step chain")]
    fn structural_errors_abort_compilation(#[case] chain: &str, #[case] message: &str) {
        let yaml = format!("matchers: [ {{ name: bad, extract: [ {{ field: F, chain: {chain} }} ] }} ]");
        let err = compile(&yaml).unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
        assert!(err.to_string().starts_with("matcher `bad`"), "{err}");
    }

    #[test]
    fn matcher_needs_named_extractions() {
        let err = compile("matchers: [ { name: m, extract: [] } ]").unwrap_err();
        assert!(matches!(err, CompileError::NoExtractions { .. }));

        let err =
            compile("matchers: [ { name: m, extract: [ { field: ' ', chain: [ { step: up } ] } ] } ]").unwrap_err();
        assert!(matches!(err, CompileError::EmptyFieldName { .. }));
    }

    #[test]
    fn empty_guard_chains_are_rejected() {
        let yaml = "matchers: [ { name: m, require: [ [] ], extract: [ { field: F, chain: [ { step: up } ] } ] } ]";
        let err = compile(yaml).unwrap_err();
        assert!(matches!(err, CompileError::EmptyChain { .. }));
    }
}
