//! String helpers shared by comparison, lookup and transform steps.
//!
//! Comparisons are ASCII case-insensitive and never allocate. Transforms return
//! `Cow` so that an unchanged value stays borrowed from the tree.

use std::borrow::Cow;

pub(crate) fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len() && value.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

pub(crate) fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    value.len() >= suffix.len()
        && value.as_bytes()[value.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}

pub(crate) fn contains_ignore_case(value: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    value.as_bytes().windows(needle.len()).any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Lowercase only when needed.
pub(crate) fn ascii_lowercase(value: &str) -> Cow<'_, str> {
    if value.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(value.to_ascii_lowercase())
    } else {
        Cow::Borrowed(value)
    }
}

/// Literal (non-regex) replacement of every occurrence of `search`.
pub(crate) fn replace_literal<'a>(value: Cow<'a, str>, search: &str, replace: &str) -> Cow<'a, str> {
    if search.is_empty() || !value.contains(search) {
        return value;
    }
    Cow::Owned(value.replace(search, replace))
}

/// `1_2_3` -> `1.2.3`, `1/2/3` -> `1 2 3`.
pub(crate) fn clean_version(value: Cow<'_, str>) -> Cow<'_, str> {
    replace_literal(replace_literal(value, "_", "."), "/", " ")
}

/// Brand style casing per alphanumeric word.
///
/// ```text
/// "something"   -> "Something"
/// "DuMmY"       -> "Dummy"
/// "NielsBasjes" -> "NielsBasjes"   (CamelCase kept)
/// "lg"          -> "LG"
/// ```
pub(crate) fn normalize_brand(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start: Option<usize> = None;

    for (idx, ch) in value.char_indices() {
        if ch.is_alphanumeric() {
            word_start.get_or_insert(idx);
        } else {
            if let Some(start) = word_start.take() {
                push_brand_word(&mut out, &value[start..idx]);
            }
            out.push(ch);
        }
    }
    if let Some(start) = word_start {
        push_brand_word(&mut out, &value[start..]);
    }
    out
}

fn push_brand_word(out: &mut String, word: &str) {
    if word.chars().count() <= 2 {
        out.extend(word.chars().flat_map(char::to_uppercase));
        return;
    }
    if is_camel_case(word) {
        out.push_str(word);
        return;
    }
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.extend(chars.flat_map(char::to_lowercase));
    }
}

/// A lowercase run of at least two letters followed later by an uppercase letter.
fn is_camel_case(word: &str) -> bool {
    let mut lower_run = 0;
    let mut seen_run = false;
    for ch in word.chars() {
        if ch.is_lowercase() {
            lower_run += 1;
            if lower_run >= 2 {
                seen_run = true;
            }
        } else {
            if ch.is_uppercase() && seen_run {
                return true;
            }
            lower_run = 0;
        }
    }
    false
}

/// 1-based inclusive range over `|` segments or whitespace separated words.
///
/// `end == None` means "up to the last element".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl ElementRange {
    pub const ALL: ElementRange = ElementRange { start: 1, end: None };

    pub fn new(start: usize, end: Option<usize>) -> Self {
        ElementRange { start, end }
    }

    pub fn single(position: usize) -> Self {
        ElementRange { start: position, end: Some(position) }
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && self.end.is_none_or(|end| position <= end)
    }

    /// True once `position` is past the end of the range.
    pub fn is_past(&self, position: usize) -> bool {
        self.end.is_some_and(|end| position > end)
    }

    /// Well formed ranges start at 1 and do not end before they start.
    pub fn is_valid(&self) -> bool {
        self.start >= 1 && self.end.is_none_or(|end| end >= self.start)
    }
}

impl std::fmt::Display for ElementRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "[{}]", self.start),
            Some(end) => write!(f, "[{}-{}]", self.start, end),
            None => write!(f, "[{}-]", self.start),
        }
    }
}

/// Select a sub-range of the elements, rejoined with `separator`.
///
/// `None` when the start lies beyond the available elements; the end is clamped.
fn select<'a>(elements: impl Iterator<Item = &'a str>, range: ElementRange, separator: &str) -> Option<String> {
    let mut out: Option<String> = None;
    for (idx, element) in elements.enumerate() {
        let position = idx + 1;
        if range.is_past(position) {
            break;
        }
        if position < range.start {
            continue;
        }
        match out.as_mut() {
            Some(buf) => {
                buf.push_str(separator);
                buf.push_str(element);
            }
            None => out = Some(element.to_string()),
        }
    }
    out
}

pub(crate) fn segment_range(value: &str, range: ElementRange) -> Option<String> {
    select(value.split('|'), range, "|")
}

pub(crate) fn word_range(value: &str, range: ElementRange) -> Option<String> {
    select(value.split_whitespace(), range, " ")
}
