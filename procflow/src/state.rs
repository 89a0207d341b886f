//! Pipeline state, stage fragments and the execution trace.
//!
//! A [`State`] is the record accumulated while one request flows through a
//! pipeline: an ordered mapping from field name to value, plus the
//! engine-owned trace of what each stage produced. Stages never see a
//! mutable state; they return a [`Fragment`] and the executor performs the
//! single shallow merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A partial state update returned by a single stage invocation.
///
/// Keys present in a fragment replace same-named keys in the running state;
/// keys absent are left untouched. Merge is a shallow key replace, not a
/// deep append: a stage extending a sequence field (such as `logs`) must
/// return the full updated sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment {
    entries: Map<String, Value>,
}

impl Fragment {
    /// Creates an empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the fragment.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Inserts a field, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the number of fields in the fragment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the fragment carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

impl From<Map<String, Value>> for Fragment {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

/// One step of the audit trail: which stage ran and what it produced.
///
/// Trace entries are appended by the executor only, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// The node name of the stage that ran.
    pub stage: String,
    /// The fragment the stage returned.
    pub fragment: Fragment,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl TraceEntry {
    /// Creates a trace entry recorded now.
    #[must_use]
    pub fn new(stage: impl Into<String>, fragment: Fragment) -> Self {
        Self {
            stage: stage.into(),
            fragment,
            recorded_at: Utc::now(),
        }
    }
}

/// The accumulated key/value record for one pipeline run.
///
/// Created by the caller as the initial state, merged into once per stage
/// execution, and returned (including the trace) when the run reaches EXIT.
/// A state instance is never shared across concurrent runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    fields: Map<String, Value>,
    #[serde(default)]
    trace: Vec<TraceEntry>,
}

impl State {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the state.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Inserts a field, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Returns the value under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the string value under `key`, if present and a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Returns the integer value under `key`, if present and an integer.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    /// Returns the boolean value under `key`, if present and a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Returns the sequence of strings under `key`, or an empty sequence.
    ///
    /// Non-string elements are skipped. This is the accessor stages use to
    /// extend the user-level `logs` field.
    #[must_use]
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `true` if a field named `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns the fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Merges a fragment into the state.
    ///
    /// Shallow key replace: fragment keys overwrite same-named fields, all
    /// other fields are carried forward unchanged. The executor is the
    /// engine's single call site; merging the same fragment twice is
    /// equivalent to merging it once.
    pub fn merge(&mut self, fragment: &Fragment) {
        for (key, value) in fragment.iter() {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Appends a trace entry. Executor-owned.
    pub(crate) fn record_trace(&mut self, entry: TraceEntry) {
        self.trace.push(entry);
    }

    /// Returns the execution trace in execution order.
    #[must_use]
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn merge_overwrites_only_fragment_keys() {
        let mut state = State::new()
            .with_field("item", "laptop")
            .with_field("quantity", 3);

        let fragment = Fragment::new().with("supplier", "Acme Computers").with("quantity", 5);
        state.merge(&fragment);

        assert_eq!(state.get_str("item"), Some("laptop"));
        assert_eq!(state.get_i64("quantity"), Some(5));
        assert_eq!(state.get_str("supplier"), Some("Acme Computers"));
    }

    #[test]
    fn merge_is_idempotent() {
        let fragment = Fragment::new().with("approved", true).with("reason", "ok");

        let mut once = State::new().with_field("quantity", 2);
        let mut twice = once.clone();

        once.merge(&fragment);
        twice.merge(&fragment);
        twice.merge(&fragment);

        assert_eq!(once, twice);
    }

    #[test]
    fn merge_never_deletes() {
        let mut state = State::new().with_field("original_request", "Order 3 laptops");
        state.merge(&Fragment::new());
        assert!(state.contains("original_request"));
    }

    #[test]
    fn fields_preserve_insertion_order() {
        let state = State::new()
            .with_field("b", 1)
            .with_field("a", 2)
            .with_field("c", 3);

        let keys: Vec<&str> = state.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn string_list_defaults_to_empty() {
        let state = State::new().with_field("quantity", 3);
        assert!(state.string_list("logs").is_empty());

        let state = state.with_field("logs", json!(["first", "second"]));
        assert_eq!(state.string_list("logs"), vec!["first", "second"]);
    }

    #[test]
    fn trace_entries_keep_execution_order() {
        let mut state = State::new();
        state.record_trace(TraceEntry::new("a", Fragment::new()));
        state.record_trace(TraceEntry::new("b", Fragment::new().with("k", 1)));

        let stages: Vec<&str> = state.trace().iter().map(|e| e.stage.as_str()).collect();
        assert_eq!(stages, vec!["a", "b"]);
        assert_eq!(state.trace()[1].fragment.get("k"), Some(&json!(1)));
    }

    #[test]
    fn state_serializes_fields_and_trace() {
        let mut state = State::new().with_field("item", "desk");
        state.record_trace(TraceEntry::new("intake", Fragment::new().with("item", "desk")));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["fields"]["item"], json!("desk"));
        assert_eq!(value["trace"][0]["stage"], json!("intake"));
    }
}
