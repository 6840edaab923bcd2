//! Ruleset documents and their compilation.
//!
//! ```text
//! rules.yaml / rules.json
//!        │  RulesetDefinition::load          (definition.rs)
//!        v
//! RulesetDefinition  (lookups, sets, matchers as plain data)
//!        │  RulesetDefinition::compile       (compile.rs)
//!        │    - named lookups -> shared Arc tables
//!        │    - step definitions -> StepKind chains
//!        │    - structural validation (CompileError)
//!        v
//! MatcherRegistry  (immutable, anchor indexed)
//! ```

#[path = "ruleset/compile.rs"]
mod compile;
#[path = "ruleset/definition.rs"]
mod definition;

pub use definition::{ExtractDefinition, MatcherDefinition, RulesetDefinition, StepDefinition};
