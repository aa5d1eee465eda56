//! Tolerant structured-output extraction from generative-AI replies.
//!
//! Providers are asked for a bare JSON object but routinely wrap it in
//! markdown fences, prepend chatter, or cut it off mid-string. This module
//! turns any reply into a [`Repaired`] value and never fails: a reply that
//! is not a JSON object degrades to the shape's fallback document.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::ReplyShape;

/// Opening ```` ```json ```` fence with its newline, or a closing fence with
/// the newline before it.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```json\n?|\n?```").unwrap());

/// Why a reply could not be used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Nothing left after removing fences and whitespace.
    Empty,
    /// The text was not valid JSON.
    InvalidJson(String),
    /// Valid JSON, but not an object (array, string, number, ...).
    NotAnObject(&'static str),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::Empty => write!(f, "empty reply"),
            FallbackReason::InvalidJson(msg) => write!(f, "invalid JSON: {}", msg),
            FallbackReason::NotAnObject(kind) => write!(f, "expected object, got {}", kind),
        }
    }
}

/// Outcome of repairing one provider reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Repaired<T> {
    /// The reply was a JSON object.
    ///
    /// `raw` is the object exactly as the model wrote it and is what gets
    /// sent to clients; `value` is a typed view of it. Expected keys the
    /// model left out are listed in `missing_keys`, not filled in.
    Parsed {
        value: T,
        raw: Map<String, Value>,
        missing_keys: Vec<&'static str>,
    },
    /// The reply was unusable and `value` is the placeholder document.
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Repaired<T> {
    pub fn value(&self) -> &T {
        match self {
            Repaired::Parsed { value, .. } | Repaired::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Repaired::Fallback { .. })
    }

    /// Expected keys missing from a parsed reply. Always empty on fallback.
    pub fn missing_keys(&self) -> &[&'static str] {
        match self {
            Repaired::Parsed { missing_keys, .. } => missing_keys,
            Repaired::Fallback { .. } => &[],
        }
    }
}

impl<T: Serialize> Repaired<T> {
    /// JSON body for the HTTP response.
    pub fn into_body(self) -> Value {
        match self {
            Repaired::Parsed { raw, .. } => Value::Object(raw),
            Repaired::Fallback { value, .. } => {
                serde_json::to_value(value).unwrap_or_else(|_| Value::Object(Map::new()))
            }
        }
    }
}

/// Remove markdown code fences and surrounding whitespace.
pub fn strip_code_fences(reply: &str) -> String {
    CODE_FENCE.replace_all(reply, "").trim().to_string()
}

/// Repair a raw provider reply into the shape `T`.
pub fn repair<T: ReplyShape>(reply: &str, context: &T::Context) -> Repaired<T> {
    let cleaned = strip_code_fences(reply);

    let reason = if cleaned.is_empty() {
        FallbackReason::Empty
    } else {
        match serde_json::from_str::<Value>(&cleaned) {
            Ok(Value::Object(raw)) => {
                let missing_keys: Vec<&'static str> = T::EXPECTED_KEYS
                    .iter()
                    .copied()
                    .filter(|key| !raw.contains_key(*key))
                    .collect();
                if missing_keys.is_empty() {
                    debug!("Provider reply parsed as JSON object");
                } else {
                    warn!(missing = ?missing_keys, "Provider reply is missing expected keys");
                }
                return Repaired::Parsed {
                    value: T::from_object(&raw),
                    raw,
                    missing_keys,
                };
            }
            Ok(other) => FallbackReason::NotAnObject(json_kind(&other)),
            Err(e) => FallbackReason::InvalidJson(e.to_string()),
        }
    };

    warn!(
        %reason,
        preview = %crate::utils::truncate_chars(&cleaned, 200),
        "Provider reply unusable, substituting fallback"
    );
    Repaired::Fallback {
        value: T::fallback(&cleaned, context),
        reason,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        LiteratureReviewResult, ReviewContext, SummaryContext, SummaryResult,
    };
    use serde_json::json;

    fn summary(reply: &str) -> Repaired<SummaryResult> {
        repair::<SummaryResult>(reply, &SummaryContext::default())
    }

    fn review(reply: &str) -> Repaired<LiteratureReviewResult> {
        repair::<LiteratureReviewResult>(
            reply,
            &ReviewContext {
                topic: "quantum error correction".to_string(),
            },
        )
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json```"), "");
    }

    #[test]
    fn test_fenced_object_round_trip() {
        let repaired = repair::<SummaryResult>("```json\n{\"a\":1}\n```", &SummaryContext::default());
        match repaired {
            Repaired::Parsed { raw, .. } => assert_eq!(Value::Object(raw), json!({"a": 1})),
            other => panic!("expected parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_summary_parses() {
        let reply = r#"```json
{
  "title": "Attention Is All You Need",
  "summary": "Introduces the transformer.",
  "keyPoints": ["Self-attention", "No recurrence"],
  "methodology": "Machine translation benchmarks",
  "conclusions": "Attention suffices"
}
```"#;
        let repaired = summary(reply);
        assert!(!repaired.is_fallback());
        assert!(repaired.missing_keys().is_empty());
        let value = repaired.value();
        assert_eq!(value.title, "Attention Is All You Need");
        assert_eq!(value.key_points, vec!["Self-attention", "No recurrence"]);
    }

    #[test]
    fn test_non_json_reply_falls_back_with_every_key() {
        let repaired = summary("Here is a summary of the paper: it is good.");
        assert!(repaired.is_fallback());
        let body = repaired.into_body();
        let object = body.as_object().unwrap();
        for key in SummaryResult::EXPECTED_KEYS {
            assert!(object.contains_key(*key), "missing {}", key);
        }
        assert_eq!(body["title"], "Research Paper");
        assert_eq!(body["summary"], "Here is a summary of the paper: it is good.");
    }

    #[test]
    fn test_review_fallback_has_every_key() {
        let repaired = review("{\"topic\": \"truncated");
        assert!(matches!(
            repaired,
            Repaired::Fallback {
                reason: FallbackReason::InvalidJson(_),
                ..
            }
        ));
        let body = repaired.into_body();
        for key in LiteratureReviewResult::EXPECTED_KEYS {
            assert!(body.get(*key).is_some(), "missing {}", key);
        }
        assert_eq!(body["topic"], "quantum error correction");
    }

    #[test]
    fn test_missing_key_is_flagged_not_injected() {
        let reply = r#"{"title": "T", "summary": "S", "keyPoints": [], "conclusions": "C"}"#;
        let repaired = summary(reply);
        assert!(!repaired.is_fallback());
        assert_eq!(repaired.missing_keys(), &["methodology"]);

        let body = repaired.into_body();
        assert!(body.get("methodology").is_none());
        assert_eq!(body["title"], "T");
    }

    #[test]
    fn test_extra_keys_pass_through() {
        let reply = r#"{"title": "T", "summary": "S", "keyPoints": [], "methodology": "M", "conclusions": "C", "confidence": 0.9}"#;
        let body = summary(reply).into_body();
        assert_eq!(body["confidence"], 0.9);
    }

    #[test]
    fn test_empty_reply_after_stripping() {
        let repaired = summary("```json\n\n```");
        assert!(matches!(
            repaired,
            Repaired::Fallback {
                reason: FallbackReason::Empty,
                ..
            }
        ));
        assert_eq!(repaired.value().summary, "");
    }

    #[test]
    fn test_array_reply_falls_back() {
        let repaired = summary(r#"[{"title": "T"}]"#);
        match &repaired {
            Repaired::Fallback { reason, value } => {
                assert_eq!(*reason, FallbackReason::NotAnObject("array"));
                assert_eq!(value.summary, r#"[{"title": "T"}]"#);
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_long_reply_is_truncated_in_fallback() {
        let reply = "a".repeat(5000);
        let summary_value = summary(&reply).into_body();
        assert_eq!(summary_value["summary"].as_str().unwrap().len(), 1000);

        let review_value = review(&reply).into_body();
        assert_eq!(review_value["introduction"].as_str().unwrap().len(), 500);
    }

    #[test]
    fn test_wrongly_typed_fields_default_in_typed_view() {
        let reply = r#"{"title": 42, "summary": null, "keyPoints": "single point", "methodology": "M", "conclusions": "C"}"#;
        let repaired = summary(reply);
        let value = repaired.value();
        assert_eq!(value.title, "42");
        assert_eq!(value.summary, "");
        assert_eq!(value.key_points, vec!["single point"]);
    }
}
