//! Provider model diagnostics.

use console::style;

use crate::cli::icons;
use crate::config::Settings;
use crate::llm::probe_candidates;

/// List available models and probe the configured candidates.
pub async fn cmd_models(settings: &Settings) -> anyhow::Result<()> {
    let config = &settings.llm;

    println!("\n{}", style("Gemini Configuration").bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Endpoint:", config.endpoint);
    println!(
        "{:<20} {}",
        "API Key:",
        if config.has_api_key() { "Set" } else { "Not set" }
    );
    println!("{:<20} {}", "Candidates:", config.models.join(", "));
    println!("{:<20} {}", "Max Tokens:", config.max_output_tokens);
    println!("{:<20} {:.2}", "Temperature:", config.temperature);
    println!("{:<20} {}s", "Timeout:", config.provider_timeout_secs);

    let client = super::gemini_client(settings)?;

    println!("\n{}", style("Available Models").bold());
    println!("{}", "-".repeat(40));

    match client.list_models().await {
        Ok(models) => {
            let usable: Vec<_> = models
                .iter()
                .filter(|m| m.supports_generate_content())
                .collect();
            if usable.is_empty() {
                println!("  No models support generateContent");
            }
            for model in usable {
                let marker = if config.models.iter().any(|c| c == model.id()) {
                    style("*").green().to_string()
                } else {
                    " ".to_string()
                };
                match model.display_name {
                    Some(ref name) => println!("{} {:<32} {}", marker, model.id(), style(name).dim()),
                    None => println!("{} {}", marker, model.id()),
                }
            }
        }
        Err(e) => println!("{} Failed to list models: {}", icons::error(), e),
    }

    println!("\n{}", style("Model Selection").bold());
    println!("{}", "-".repeat(40));

    match probe_candidates(&config.models, client.as_ref()).await {
        Ok(model) => println!("{} Would use {}", icons::success(), style(model).green()),
        Err(e) => println!("{} {}", icons::error(), e),
    }

    Ok(())
}
