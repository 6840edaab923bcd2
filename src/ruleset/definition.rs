//! Serde definitions of a ruleset document.
//!
//! These types mirror the compiled engine types but are deserializable from
//! YAML or JSON. [`RulesetDefinition::compile`] turns them into an immutable
//! [`MatcherRegistry`](crate::MatcherRegistry).
//!
//! | Definition type | Compiled type |
//! |-----------------|---------------|
//! | [`RulesetDefinition`] | [`MatcherRegistry`](crate::MatcherRegistry) |
//! | [`MatcherDefinition`] | [`Matcher`](crate::Matcher) |
//! | [`ExtractDefinition`] | [`FieldChain`](crate::FieldChain) |
//! | `Vec<StepDefinition>` | [`Chain`](crate::Chain) |
//!
//! ```yaml
//! lookups:
//!   brands: { sm: Samsung, lg: LG }
//! sets:
//!   engines: [gecko, webkit]
//! matchers:
//!   - name: firefox
//!     priority: 100
//!     require:
//!       - [ { step: down, label: product }, { step: down, label: name }, { step: equals, value: Firefox } ]
//!     extract:
//!       - field: AgentVersion
//!         chain: [ { step: down, label: product }, { step: down, label: version }, { step: clean_version } ]
//! ```

use crate::error::CompileError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A complete ruleset document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesetDefinition {
    /// Named string -> string tables.
    #[serde(default)]
    pub lookups: BTreeMap<String, BTreeMap<String, String>>,

    /// Named string sets.
    #[serde(default)]
    pub sets: BTreeMap<String, Vec<String>>,

    /// Matchers in registration order.
    #[serde(default)]
    pub matchers: Vec<MatcherDefinition>,
}

/// One matcher: guards, extractions and a priority.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherDefinition {
    /// Display name; defaults to `matcher-<index>`.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub priority: u32,

    /// Guard chains; all must not fail for the matcher to fire.
    #[serde(default)]
    pub require: Vec<Vec<StepDefinition>>,

    pub extract: Vec<ExtractDefinition>,
}

/// A chain bound to an output field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractDefinition {
    pub field: String,
    pub chain: Vec<StepDefinition>,
}

fn first() -> usize {
    1
}

/// One step, tagged by `step`:
///
/// ```json
/// { "step": "down", "label": "version" }
/// { "step": "lookup", "lookup": "brands", "default": "Unknown" }
/// { "step": "word_range", "from": 2, "to": 3 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepDefinition {
    Up,
    Down {
        #[serde(default)]
        label: Option<String>,
        #[serde(default = "first")]
        from: usize,
        #[serde(default)]
        to: Option<usize>,
    },
    Next,
    Prev,
    NextN {
        count: usize,
    },
    PrevN {
        count: usize,
    },

    Equals {
        value: String,
    },
    NotEquals {
        value: String,
    },
    Contains {
        value: String,
    },
    StartsWith {
        value: String,
    },
    EndsWith {
        value: String,
    },
    IsNull,
    IsInSet {
        set: String,
    },
    IsNotInSet {
        set: String,
    },

    IsInLookupContains {
        lookup: String,
    },
    IsInLookupPrefix {
        lookup: String,
    },
    IsNotInLookupPrefix {
        lookup: String,
    },
    Lookup {
        lookup: String,
        #[serde(default)]
        default: Option<String>,
    },
    LookupPrefix {
        lookup: String,
        #[serde(default)]
        default: Option<String>,
    },
    LookupContains {
        lookup: String,
        #[serde(default)]
        default: Option<String>,
    },

    Concat {
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        postfix: String,
    },
    ConcatPrefix {
        value: String,
    },
    ConcatPostfix {
        value: String,
    },
    ReplaceString {
        search: String,
        replace: String,
    },
    CleanVersion,
    NormalizeBrand,
    BackToFull,
    DefaultIfNull {
        #[serde(default)]
        default: Option<String>,
    },
    SegmentRange {
        #[serde(default = "first")]
        from: usize,
        #[serde(default)]
        to: Option<usize>,
    },
    WordRange {
        #[serde(default = "first")]
        from: usize,
        #[serde(default)]
        to: Option<usize>,
    },
}

impl RulesetDefinition {
    pub fn from_yaml_str(source: &str) -> Result<Self, CompileError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, CompileError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a ruleset file; `.json` files are JSON, everything else YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|source| CompileError::Io { path: path.to_path_buf(), source })?;

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        tracing::debug!(path = %path.display(), format = if is_json { "json" } else { "yaml" }, "loading ruleset");
        if is_json { Self::from_json_str(&source) } else { Self::from_yaml_str(&source) }
    }

    /// Append the lookups, sets and matchers of `other`.
    ///
    /// Matchers of `other` register after the existing ones. A lookup or set
    /// defined in both is replaced by the one from `other`.
    pub fn merge(&mut self, other: RulesetDefinition) {
        self.lookups.extend(other.lookups);
        self.sets.extend(other.sets);
        self.matchers.extend(other.matchers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_steps_are_tagged_maps() {
        let def = RulesetDefinition::from_yaml_str(
            r#"
lookups:
  brands: { sm: Samsung }
matchers:
  - name: version
    priority: 3
    extract:
      - field: AgentVersion
        chain:
          - { step: down, label: version }
          - { step: clean_version }
          - { step: word_range, from: 2 }
          - { step: lookup, lookup: brands, default: Other }
"#,
        )
        .unwrap();

        assert_eq!(def.lookups["brands"]["sm"], "Samsung");
        let matcher = &def.matchers[0];
        assert_eq!(matcher.name.as_deref(), Some("version"));
        assert_eq!(matcher.priority, 3);
        assert!(matcher.require.is_empty());
        assert_eq!(
            matcher.extract[0].chain,
            vec![
                StepDefinition::Down { label: Some("version".into()), from: 1, to: None },
                StepDefinition::CleanVersion,
                StepDefinition::WordRange { from: 2, to: None },
                StepDefinition::Lookup { lookup: "brands".into(), default: Some("Other".into()) },
            ]
        );
    }

    #[test]
    fn json_is_accepted_too() {
        let def = RulesetDefinition::from_json_str(
            r#"{ "matchers": [ { "extract": [ { "field": "F", "chain": [ { "step": "next_n", "count": 2 } ] } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(def.matchers[0].extract[0].chain, vec![StepDefinition::NextN { count: 2 }]);
        assert_eq!(def.matchers[0].priority, 0);
    }

    #[test]
    fn unknown_step_kinds_are_rejected() {
        let yaml = "matchers: [ { extract: [ { field: F, chain: [ { step: teleport } ] } ] } ]";
        let err = RulesetDefinition::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, CompileError::Definition(msg) if msg.contains("teleport")));
    }

    #[test]
    fn missing_files_report_the_path() {
        let err = RulesetDefinition::load("/nonexistent/rules.yaml").unwrap_err();
        assert!(matches!(err, CompileError::Io { ref path, .. } if path.ends_with("rules.yaml")));
    }

    #[test]
    fn merge_appends_matchers() {
        let mut a = RulesetDefinition::from_yaml_str("sets: { s: [a] }\nmatchers: []").unwrap();
        let b = RulesetDefinition::from_yaml_str(
            "sets: { s: [b] }\nmatchers: [ { extract: [ { field: F, chain: [ { step: up } ] } ] } ]",
        )
        .unwrap();
        a.merge(b);
        assert_eq!(a.sets["s"], vec!["b".to_string()]);
        assert_eq!(a.matchers.len(), 1);
    }
}
