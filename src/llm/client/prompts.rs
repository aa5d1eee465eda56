//! Prompt templates for paper analysis.
//!
//! The JSON shapes described here must use the same keys as
//! [`crate::models::SummaryResult`] and [`crate::models::LiteratureReviewResult`].

/// Prompt for summarizing one paper. Uses the `{content}` placeholder.
pub const SUMMARY_PROMPT: &str = r#"You are an expert academic research assistant. Analyze the following research paper and provide a comprehensive summary.

Research Paper Text:
{content}

Please provide a detailed analysis in the following JSON format:
{
    "title": "Extracted or inferred title of the paper",
    "summary": "A comprehensive 150-200 word summary of the entire paper covering main objectives, methods, and conclusions",
    "keyPoints": [
        "5-7 key points or findings from the paper as separate bullet points"
    ],
    "methodology": "A brief description of the research methodology used in the study",
    "conclusions": "Main conclusions and implications of the research"
}

Make sure to extract actual information from the provided text, not generic responses. Be specific and accurate. Respond with the JSON object only."#;

/// Prompt for a literature review. Uses `{topic}`, `{keywords}` and `{num_papers}`.
pub const LITERATURE_REVIEW_PROMPT: &str = r#"You are an expert academic researcher. Generate a comprehensive literature review on the topic: "{topic}".{keywords}

Create a structured literature review that synthesizes findings from approximately {num_papers} recent research papers.

Provide your response in the following JSON format:
{
    "topic": "{topic}",
    "introduction": "A 150-200 word introduction explaining the significance of this research area and what this review covers",
    "keyThemes": [
        "4-5 major themes or areas of focus in current research"
    ],
    "majorFindings": [
        "5-7 significant findings across the literature"
    ],
    "researchGaps": [
        "3-5 identified gaps in current research that need further investigation"
    ],
    "recommendations": [
        "4-5 specific recommendations for future research directions"
    ],
    "references": [
        "8-12 realistic-looking academic references in proper citation format (Author(s), Year, Title, Journal/Conference)"
    ]
}

Make this a scholarly, well-structured literature review with specific and actionable insights. Respond with the JSON object only."#;

/// Build the summary prompt around already-truncated paper text.
pub fn summary_prompt(paper_text: &str) -> String {
    SUMMARY_PROMPT.replace("{content}", paper_text)
}

/// Build the literature review prompt.
pub fn literature_review_prompt(topic: &str, keywords: Option<&str>, num_papers: u32) -> String {
    let keywords = match keywords.map(str::trim).filter(|k| !k.is_empty()) {
        Some(k) => format!(" Keywords to focus on: {}.", k),
        None => String::new(),
    };

    // Topic last: user text must not be re-scanned for placeholders.
    LITERATURE_REVIEW_PROMPT
        .replace("{num_papers}", &num_papers.to_string())
        .replace("{keywords}", &keywords)
        .replace("{topic}", topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LiteratureReviewResult, ReplyShape, SummaryResult};

    #[test]
    fn test_summary_prompt_names_every_key() {
        let prompt = summary_prompt("paper body");
        assert!(prompt.contains("paper body"));
        assert!(!prompt.contains("{content}"));
        for key in SummaryResult::EXPECTED_KEYS {
            assert!(prompt.contains(&format!("\"{}\"", key)), "prompt lacks {}", key);
        }
    }

    #[test]
    fn test_review_prompt_names_every_key() {
        let prompt = literature_review_prompt("federated learning", None, 10);
        for key in LiteratureReviewResult::EXPECTED_KEYS {
            assert!(prompt.contains(&format!("\"{}\"", key)), "prompt lacks {}", key);
        }
    }

    #[test]
    fn test_review_prompt_substitutions() {
        let prompt = literature_review_prompt("federated learning", Some(" privacy, edge "), 7);
        assert!(prompt.contains("topic: \"federated learning\"."));
        assert!(prompt.contains(" Keywords to focus on: privacy, edge."));
        assert!(prompt.contains("approximately 7 recent"));
        assert!(!prompt.contains("{topic}"));
        assert!(!prompt.contains("{keywords}"));
    }

    #[test]
    fn test_review_prompt_blank_keywords_omitted() {
        let prompt = literature_review_prompt("robotics", Some("   "), 10);
        assert!(!prompt.contains("Keywords to focus on"));
    }

    #[test]
    fn test_topic_with_placeholder_text_is_literal() {
        let prompt = literature_review_prompt("{num_papers} things", None, 3);
        assert!(prompt.contains("\"{num_papers} things\""));
    }
}
