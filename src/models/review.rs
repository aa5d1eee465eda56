//! Multi-paper literature review.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{string_field, string_list_field, ReplyShape};
use crate::utils::truncate_chars;

/// Characters of raw reply kept in the fallback introduction.
pub const FALLBACK_INTRODUCTION_CHARS: usize = 500;

/// Synthesized literature review for a research topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiteratureReviewResult {
    pub topic: String,
    pub introduction: String,
    pub key_themes: Vec<String>,
    pub major_findings: Vec<String>,
    pub research_gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub references: Vec<String>,
}

/// Fallback context for a review: the topic the caller asked about.
#[derive(Debug, Clone, Default)]
pub struct ReviewContext {
    pub topic: String,
}

impl ReplyShape for LiteratureReviewResult {
    type Context = ReviewContext;

    const EXPECTED_KEYS: &'static [&'static str] = &[
        "topic",
        "introduction",
        "keyThemes",
        "majorFindings",
        "researchGaps",
        "recommendations",
        "references",
    ];

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            topic: string_field(object, "topic"),
            introduction: string_field(object, "introduction"),
            key_themes: string_list_field(object, "keyThemes"),
            major_findings: string_list_field(object, "majorFindings"),
            research_gaps: string_list_field(object, "researchGaps"),
            recommendations: string_list_field(object, "recommendations"),
            references: string_list_field(object, "references"),
        }
    }

    fn fallback(cleaned_reply: &str, context: &ReviewContext) -> Self {
        Self {
            topic: context.topic.clone(),
            introduction: truncate_chars(cleaned_reply, FALLBACK_INTRODUCTION_CHARS).to_string(),
            key_themes: vec!["See full text for details".to_string()],
            major_findings: vec!["See full text for details".to_string()],
            research_gaps: vec!["Further analysis needed".to_string()],
            recommendations: vec!["Continue research in this area".to_string()],
            references: Vec::new(),
        }
    }
}
