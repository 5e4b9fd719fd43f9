pub mod schema;

pub use schema::{AgentConfig, ItemsBackend};

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Default crudagent home directory (~/.crudagent).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".crudagent"))
        .unwrap_or_else(|| PathBuf::from(".crudagent"))
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("crudagent.toml")
}

/// Expand a leading `~` in a user-supplied path.
pub fn resolve_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read crudagent config file")?;
        let config: AgentConfig =
            toml::from_str(&contents).context("Failed to parse crudagent config (TOML)")?;
        validate_config(&config)?;
        Ok(config)
    } else {
        Ok(AgentConfig::default())
    }
}

/// Reject settings the dispatcher cannot run with.
pub fn validate_config(config: &AgentConfig) -> Result<()> {
    if config.inline_call_open.is_empty() || config.inline_call_close.is_empty() {
        bail!("inline_call_open and inline_call_close must not be empty");
    }
    if config.request_timeout_secs == 0 {
        bail!("request_timeout_secs must be at least 1");
    }
    if !matches!(config.tool_choice.as_str(), "auto" | "none" | "required") {
        bail!(
            "tool_choice must be auto, none or required, got '{}'",
            config.tool_choice
        );
    }
    Ok(())
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &AgentConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, AgentConfig::default());
        assert_eq!(cfg.model_api_url, "http://localhost:1234/v1");
        assert_eq!(cfg.inline_call_open, "<call>");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("crudagent.toml");
        let cfg = AgentConfig {
            model: "qwen2.5-7b-instruct".into(),
            temperature: Some(0.2),
            items_backend: ItemsBackend::Memory,
            ..AgentConfig::default()
        };
        save_config(&cfg, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crudagent.toml");
        std::fs::write(&path, "model = \"openthinker-7b\"\nitems_backend = \"memory\"\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.model, "openthinker-7b");
        assert_eq!(cfg.items_backend, ItemsBackend::Memory);
        assert_eq!(cfg.request_timeout_secs, 60);
        assert_eq!(cfg.tool_choice, "auto");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crudagent.toml");
        std::fs::write(&path, "model = [").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn empty_inline_marker_is_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crudagent.toml");
        std::fs::write(&path, "inline_call_close = \"\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("inline_call_open and inline_call_close"));
    }

    #[test]
    fn zero_timeout_and_unknown_tool_choice_are_rejected() {
        let cfg = AgentConfig {
            request_timeout_secs: 0,
            ..AgentConfig::default()
        };
        assert!(validate_config(&cfg).is_err());

        let cfg = AgentConfig {
            tool_choice: "sometimes".into(),
            ..AgentConfig::default()
        };
        assert!(validate_config(&cfg).is_err());
        assert!(validate_config(&AgentConfig::default()).is_ok());
    }
}
