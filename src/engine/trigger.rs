//! Trigger scanning (input pre-classification).
//!
//! Before any chain is walked, the raw input is lowercased once and every
//! distinct anchor of the registry is tested against it. The resulting bitmap
//! drives candidate selection in [`AnchorIndex::active`].
//!
//! ## Design notes
//!
//! - The scan is exact, not heuristic: an anchor is present iff it occurs as an
//!   ASCII case-insensitive substring of the input, which matches how the
//!   comparison steps test node text.
//! - The cost is one lowercase copy of the input plus one substring search per
//!   distinct anchor, independent of the number of matchers sharing it.
//!
//! [`AnchorIndex::active`]: super::registry::AnchorIndex::active

use super::registry::AnchorIndex;

/// Which anchors occur in one input.
#[derive(Debug, Clone)]
pub struct TriggerInfo {
    present: Vec<bool>,
}

impl TriggerInfo {
    /// Test every anchor of `index` against `input`.
    pub fn scan(input: &str, index: &AnchorIndex) -> Self {
        let lower = input.to_ascii_lowercase();
        let present = index.anchors.iter().map(|anchor| lower.contains(anchor.as_str())).collect();
        TriggerInfo { present }
    }

    pub fn has(&self, anchor_id: usize) -> bool {
        self.present.get(anchor_id).copied().unwrap_or(false)
    }

    /// True when every anchor in `required` is present.
    pub fn satisfies(&self, required: &[usize]) -> bool {
        required.iter().all(|&id| self.has(id))
    }

    pub fn present_count(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }
}
