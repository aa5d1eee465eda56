//! Result documents returned to the web UI.
//!
//! Both shapes are advisory: the provider is asked to produce them, but what
//! comes back is whatever the model wrote. See [`crate::repair`] for how
//! replies are turned into these types.

mod review;
mod summary;

pub use review::{LiteratureReviewResult, ReviewContext};
pub use summary::{SummaryContext, SummaryResult};

use serde_json::{Map, Value};

/// A structured document the provider is asked to emit as a JSON object.
pub trait ReplyShape: Sized {
    /// Extra information needed to build the fallback document.
    type Context;

    /// Top-level keys the prompt requests, in wire (camelCase) form.
    const EXPECTED_KEYS: &'static [&'static str];

    /// Build a value from a parsed JSON object. Fields with the wrong type
    /// or that are absent take their default.
    fn from_object(object: &Map<String, Value>) -> Self;

    /// Build the fixed-shape placeholder used when the reply is not an object.
    fn fallback(cleaned_reply: &str, context: &Self::Context) -> Self;
}

/// Read a string field, accepting numbers and booleans by their JSON text.
pub(crate) fn string_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

/// Read a list of strings. A bare string becomes a one-element list;
/// non-string items are dropped.
pub(crate) fn string_list_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(_) | Value::Bool(_) => Some(item.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
