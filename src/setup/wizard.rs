//! First-run interactive setup wizard.
//!
//! Steps:
//! 1. Model endpoint (URL, API key, model id)
//! 2. Items backend (REST API URL or in-memory)
//! 3. Write crudagent.toml

use crate::config::{self, AgentConfig, ItemsBackend};
use anyhow::{bail, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Run the interactive setup wizard on stdin.
pub fn run_setup_wizard(config_path: &Path) -> Result<AgentConfig> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    run_setup_with(&mut reader, config_path)
}

/// Run the wizard against any line reader. Existing values are offered as
/// defaults.
pub fn run_setup_with(reader: &mut impl BufRead, config_path: &Path) -> Result<AgentConfig> {
    println!("crudagent setup\n");

    let current = config::load_config(config_path)?;

    // Step 1: Model endpoint
    println!("[1/3] Model endpoint");
    let model_api_url = prompt_with_default(
        reader,
        "  OpenAI-compatible base URL",
        &current.model_api_url,
    )?;
    let model_api_key = prompt_with_default(
        reader,
        "  API key (Enter for none)",
        &current.model_api_key,
    )?;
    let model = prompt_with_default(reader, "  Model", &current.model)?;

    // Step 2: Items backend
    println!("\n[2/3] Items");
    let backend = match current.items_backend {
        ItemsBackend::Http => "http",
        ItemsBackend::Memory => "memory",
    };
    let items_backend = match prompt_with_default(reader, "  Backend (http/memory)", backend)?
        .to_lowercase()
        .as_str()
    {
        "http" => ItemsBackend::Http,
        "memory" => ItemsBackend::Memory,
        other => bail!("Unknown items backend '{}'", other),
    };
    let items_api_url = if items_backend == ItemsBackend::Http {
        prompt_with_default(reader, "  Items API URL", &current.items_api_url)?
    } else {
        current.items_api_url.clone()
    };

    // Step 3: Write config
    println!("\n[3/3] Writing configuration...");

    let config = AgentConfig {
        model_api_url,
        model_api_key,
        model,
        items_backend,
        items_api_url,
        ..current
    };
    config::save_config(&config, config_path)?;
    println!("  Written: {}", config_path.display());

    println!("\nSetup complete! Run `crudagent chat` to start.\n");

    Ok(config)
}

/// Prompt with a default value.
fn prompt_with_default(reader: &mut impl BufRead, label: &str, default: &str) -> Result<String> {
    if default.is_empty() {
        print!("{}: ", label);
    } else {
        print!("{} [{}]: ", label, default);
    }
    io::stdout().flush()?;
    let mut input = String::new();
    reader.read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}
