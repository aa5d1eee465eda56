//! Literature review endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::info;

use super::super::{ApiError, AppState};

const REVIEW_FAILED: &str = "Failed to generate literature review. Please try again.";

/// Body of `POST /literature-review`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewRequest {
    pub topic: Option<String>,
    pub keywords: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub num_papers: Option<u32>,
}

/// Accept `numPapers` as a number or a numeric string. Anything else, or a
/// negative value, counts as absent or as the lower bound.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(|n| n.clamp(0, u32::MAX as i64) as u32),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok().map(|n| n.max(0) as u32),
        _ => None,
    };
    Ok(parsed)
}

pub async fn literature_review(
    State(state): State<AppState>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let topic = request.topic.unwrap_or_default();
    info!(topic = %topic.trim(), "Generating literature review");

    let review = state
        .summarizer
        .literature_review(&topic, request.keywords.as_deref(), request.num_papers)
        .await
        .map_err(|e| ApiError::service(e, REVIEW_FAILED))?;

    Ok(Json(review.into_body()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ReviewRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_num_papers_forms() {
        assert_eq!(parse(r#"{"topic":"t"}"#).num_papers, None);
        assert_eq!(parse(r#"{"numPapers":12}"#).num_papers, Some(12));
        assert_eq!(parse(r#"{"numPapers":"7"}"#).num_papers, Some(7));
        assert_eq!(parse(r#"{"numPapers":-3}"#).num_papers, Some(0));
        assert_eq!(parse(r#"{"numPapers":"lots"}"#).num_papers, None);
        assert_eq!(parse(r#"{"numPapers":null}"#).num_papers, None);
    }
}
