//! Single-paper summary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{string_field, string_list_field, ReplyShape};
use crate::utils::truncate_chars;

/// Title used when the paper did not come from a named upload.
pub const DEFAULT_TITLE: &str = "Research Paper";

/// Characters of raw reply kept in the fallback summary.
pub const FALLBACK_SUMMARY_CHARS: usize = 1000;

/// Structured summary of one research paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryResult {
    pub title: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub methodology: String,
    pub conclusions: String,
}

/// Fallback context for a summary: the uploaded filename, if any.
#[derive(Debug, Clone, Default)]
pub struct SummaryContext {
    pub original_filename: Option<String>,
}

impl SummaryContext {
    pub fn fallback_title(&self) -> &str {
        self.original_filename.as_deref().unwrap_or(DEFAULT_TITLE)
    }
}

impl ReplyShape for SummaryResult {
    type Context = SummaryContext;

    const EXPECTED_KEYS: &'static [&'static str] =
        &["title", "summary", "keyPoints", "methodology", "conclusions"];

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            title: string_field(object, "title"),
            summary: string_field(object, "summary"),
            key_points: string_list_field(object, "keyPoints"),
            methodology: string_field(object, "methodology"),
            conclusions: string_field(object, "conclusions"),
        }
    }

    fn fallback(cleaned_reply: &str, context: &SummaryContext) -> Self {
        Self {
            title: context.fallback_title().to_string(),
            summary: truncate_chars(cleaned_reply, FALLBACK_SUMMARY_CHARS).to_string(),
            key_points: vec!["Analysis completed - see summary for details".to_string()],
            methodology: "See detailed summary".to_string(),
            conclusions: "See detailed summary".to_string(),
        }
    }
}
