//! Immutable lookup tables and sets.
//!
//! Both are built once when a ruleset is compiled and then shared through `Arc`
//! by every step that names them. Keys are stored lowercased; probing is ASCII
//! case-insensitive.
//!
//! Prefix and contains probes hash candidate slices of the probed value, one
//! distinct key length at a time from the longest down. Their cost depends on
//! the value length and the number of distinct key lengths, never on the number
//! of keys. The longest key wins; among contained keys of equal length the
//! smallest key wins.

use super::text::ascii_lowercase;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Immutable string -> string dictionary.
#[derive(Debug, Clone)]
pub struct LookupTable {
    name: String,
    exact: HashMap<String, String>,
    /// Distinct key lengths in bytes, longest first.
    key_lengths: Vec<usize>,
}

impl LookupTable {
    pub fn new<I, K, V>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let exact: HashMap<String, String> =
            entries.into_iter().map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into())).collect();
        let mut key_lengths: Vec<usize> = exact.keys().map(String::len).collect();
        key_lengths.sort_unstable_by(|a, b| b.cmp(a));
        key_lengths.dedup();
        LookupTable { name: name.into(), exact, key_lengths }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Value for the key equal to `value`.
    pub fn get(&self, value: &str) -> Option<&str> {
        self.exact.get(ascii_lowercase(value).as_ref()).map(String::as_str)
    }

    /// Value for the longest key that `value` starts with.
    pub fn get_prefix(&self, value: &str) -> Option<&str> {
        let lowered = ascii_lowercase(value);
        self.key_lengths
            .iter()
            .filter_map(|&len| lowered.get(..len))
            .find_map(|prefix| self.exact.get(prefix))
            .map(String::as_str)
    }

    /// Value for the longest key contained in `value`.
    pub fn get_contains(&self, value: &str) -> Option<&str> {
        let lowered = ascii_lowercase(value);
        self.key_lengths.iter().find_map(|&len| {
            (0..=lowered.len().saturating_sub(len))
                .filter_map(|start| lowered.get(start..start + len))
                .filter_map(|window| self.exact.get_key_value(window))
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, v)| v.as_str())
        })
    }
}

/// Immutable set of strings.
#[derive(Debug, Clone)]
pub struct LookupSet {
    name: String,
    members: HashSet<String>,
}

impl LookupSet {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        LookupSet { name: name.into(), members: members.into_iter().map(|m| m.as_ref().to_ascii_lowercase()).collect() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.members.contains(ascii_lowercase(value).as_ref())
    }
}

/// Named tables and sets available to a ruleset compilation.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    tables: HashMap<String, Arc<LookupTable>>,
    sets: HashMap<String, Arc<LookupSet>>,
}

impl Lookups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: LookupTable) -> Arc<LookupTable> {
        let table = Arc::new(table);
        self.tables.insert(table.name().to_string(), Arc::clone(&table));
        table
    }

    pub fn add_set(&mut self, set: LookupSet) -> Arc<LookupSet> {
        let set = Arc::new(set);
        self.sets.insert(set.name().to_string(), Arc::clone(&set));
        set
    }

    pub fn table(&self, name: &str) -> Option<Arc<LookupTable>> {
        self.tables.get(name).cloned()
    }

    pub fn set(&self, name: &str) -> Option<Arc<LookupSet>> {
        self.sets.get(name).cloned()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_probes() {
        let table = LookupTable::new("t", [("foo", "FooFoo"), ("bar", "BarBar"), ("foobar", "Both")]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("FOO"), Some("FooFoo"));
        assert_eq!(table.get("fo"), None);
        assert_eq!(table.get_prefix("FooBarBaz"), Some("Both"));
        assert_eq!(table.get_prefix("Foo!"), Some("FooFoo"));
        assert_eq!(table.get_prefix("xfoo"), None);
        assert_eq!(table.get_contains("xxBARxx"), Some("BarBar"));
        assert_eq!(table.get_contains("nothing"), None);
    }

    #[test]
    fn contains_ties_resolve_by_key_order() {
        let table = LookupTable::new("t", [("bbb", "B"), ("aaa", "A")]);
        assert_eq!(table.get_contains("bbbaaa"), Some("A"));
    }

    #[test]
    fn probes_skip_slices_that_split_a_character() {
        let table = LookupTable::new("t", [("é", "E"), ("xé", "XE"), ("ab", "AB")]);
        assert_eq!(table.get_prefix("éclair"), Some("E"));
        assert_eq!(table.get_contains("caféxé"), Some("XE"));
        assert_eq!(table.get_contains("ÉAB"), Some("AB"));
        assert_eq!(table.get_prefix("a"), None);
    }

    #[test]
    fn probes_agree_with_a_longest_first_scan() {
        let keys: Vec<String> = (0..500).map(|i| format!("k{i}")).collect();
        let table = LookupTable::new("t", keys.iter().map(|k| (k.as_str(), k.to_uppercase())));
        for value in ["xxK42yy", "k499", "K7", "none", "k1000"] {
            let lowered = value.to_ascii_lowercase();
            let longest_contained = keys
                .iter()
                .filter(|k| lowered.contains(k.as_str()))
                .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
                .map(|k| k.to_uppercase());
            let longest_prefix = keys
                .iter()
                .filter(|k| lowered.starts_with(k.as_str()))
                .max_by_key(|k| k.len())
                .map(|k| k.to_uppercase());
            assert_eq!(table.get_contains(value).map(str::to_string), longest_contained, "{value}");
            assert_eq!(table.get_prefix(value).map(str::to_string), longest_prefix, "{value}");
        }
    }

    #[test]
    fn set_membership_ignores_ascii_case() {
        let set = LookupSet::new("s", ["Foo", "bar"]);
        assert!(set.contains("FOO"));
        assert!(set.contains("bar"));
        assert!(!set.contains("baz"));
    }

    #[test]
    fn lookups_share_by_reference() {
        let mut lookups = Lookups::new();
        let table = lookups.add_table(LookupTable::new("names", [("a", "b")]));
        let again = lookups.table("names").unwrap();
        assert!(Arc::ptr_eq(&table, &again));
        assert!(lookups.set("missing").is_none());
    }
}
