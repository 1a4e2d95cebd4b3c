//! Collection shapes persisted by a record store.
//!
//! Keyed collections serialize as `{ "<id>": {...} }`; counter collections as
//! `{ "items": { "<n>": {...} }, "next_id": N }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Collection keyed by an opaque string identifier.
pub type Keyed<R> = BTreeMap<String, R>;

/// Collection keyed by a monotonically increasing integer.
///
/// Ids handed out by [`Counter::next_id`] are never reused, even after the
/// record that consumed them is gone, because the counter is persisted in the
/// same document as the items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Counter<R> {
    #[serde(default = "BTreeMap::new")]
    pub items: BTreeMap<u64, R>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

fn first_id() -> u64 { 1 }

impl<R> Default for Counter<R> {
    fn default() -> Self {
        Self { items: BTreeMap::new(), next_id: first_id() }
    }
}

impl<R> Counter<R> {
    /// Issue the next id and advance the counter.
    pub fn next_id(&mut self) -> u64 {
        // a hand-edited document may carry a counter behind its own items
        let floor = self.items.keys().next_back().map(|k| k + 1).unwrap_or(first_id());
        let id = self.next_id.max(floor);
        self.next_id = id + 1;
        id
    }

    /// Insert a record built from a freshly issued id; returns the id.
    pub fn push_with(&mut self, build: impl FnOnce(u64) -> R) -> u64 {
        let id = self.next_id();
        self.items.insert(id, build(id));
        id
    }

    pub fn get(&self, id: u64) -> Option<&R> { self.items.get(&id) }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut R> { self.items.get_mut(&id) }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_one_and_advances() {
        let mut c: Counter<String> = Counter::default();
        assert_eq!(c.next_id(), 1);
        assert_eq!(c.next_id(), 2);
        assert_eq!(c.next_id, 3);
    }

    #[test]
    fn counter_never_reissues_after_removal() {
        let mut c: Counter<&str> = Counter::default();
        let a = c.push_with(|_| "a");
        let b = c.push_with(|_| "b");
        c.items.remove(&b);
        let d = c.push_with(|_| "d");
        assert_eq!((a, b, d), (1, 2, 3));
    }

    #[test]
    fn counter_skips_past_existing_items() {
        let mut c: Counter<&str> = Counter::default();
        c.items.insert(7, "x");
        assert_eq!(c.next_id(), 8);
    }

    #[test]
    fn counter_document_layout() {
        let mut c: Counter<String> = Counter::default();
        c.push_with(|id| format!("m{id}"));
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v, serde_json::json!({"items": {"1": "m1"}, "next_id": 2}));
        let back: Counter<String> = serde_json::from_value(v).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn counter_missing_fields_default() {
        let c: Counter<String> = serde_json::from_str("{}").unwrap();
        assert!(c.is_empty());
        assert_eq!(c.next_id, 1);
    }
}
