//! Summarize a local paper without the HTTP server.

use std::path::Path;

use crate::cli::icons;
use crate::config::Settings;
use crate::extract::{extract_text, DocumentKind};
use crate::models::SummaryContext;
use crate::service::Summarizer;
use crate::utils::char_len;

/// Run the summary pipeline on one file and print the JSON result.
pub async fn cmd_summarize(settings: Settings, file: &Path) -> anyhow::Result<()> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Not a file path: {}", file.display()))?
        .to_string();

    let kind = DocumentKind::from_filename(&filename)?;
    let generator = super::gemini_client(&settings)?;
    let summarizer = Summarizer::new(generator, &settings);

    let text = extract_text(file, kind).await?;
    eprintln!(
        "{} Extracted {} characters from {}",
        icons::info(),
        char_len(&text),
        filename
    );

    let summary = summarizer
        .summarize(
            &text,
            SummaryContext {
                original_filename: Some(filename),
            },
        )
        .await?;

    if summary.is_fallback() {
        eprintln!(
            "{} Model reply was not valid JSON; showing fallback summary",
            icons::warn()
        );
    } else if !summary.missing_keys().is_empty() {
        eprintln!(
            "{} Model reply is missing: {}",
            icons::warn(),
            summary.missing_keys().join(", ")
        );
    }

    println!("{}", serde_json::to_string_pretty(&summary.into_body())?);
    Ok(())
}
