//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use quotebook_core::Config;

use crate::output::{Output, OutputFormat};

/// Valid keys for `config set`
const KEYS: &str = "data_dir, remote_url, auto_sync, sync_interval_secs, \
                    conflict_window_secs, remote_quote_limit, request_timeout_secs, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "remote_url": config.remote_url,
                    "auto_sync": config.auto_sync,
                    "sync_interval_secs": config.sync_interval_secs,
                    "conflict_window_secs": config.conflict_window_secs,
                    "remote_quote_limit": config.remote_quote_limit,
                    "request_timeout_secs": config.request_timeout_secs,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:             {}", config.data_dir.display());
            println!("  remote_url:           {}", config.remote_url);
            println!("  auto_sync:            {}", config.auto_sync);
            println!("  sync_interval_secs:   {}", config.sync_interval_secs);
            println!("  conflict_window_secs: {}", config.conflict_window_secs);
            println!("  remote_quote_limit:   {}", config.remote_quote_limit);
            println!("  request_timeout_secs: {}", config.request_timeout_secs);
            println!(
                "  log_file:             {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config = Config::load_for_edit(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;
    config.validate()?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply one `key = value` pair to `config`
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "remote_url" => {
            if value.trim().is_empty() {
                bail!("remote_url cannot be empty");
            }
            config.remote_url = value.trim().to_string();
        }
        "auto_sync" => {
            config.auto_sync = value
                .parse()
                .context("Invalid value for auto_sync. Use 'true' or 'false'.")?;
        }
        "sync_interval_secs" => {
            let secs: u64 = value
                .parse()
                .context("Invalid value for sync_interval_secs. Use a whole number of seconds.")?;
            if secs == 0 {
                bail!("sync_interval_secs must be at least 1");
            }
            config.sync_interval_secs = secs;
        }
        "conflict_window_secs" => {
            config.conflict_window_secs = value
                .parse()
                .context("Invalid value for conflict_window_secs. Use a whole number of seconds.")?;
        }
        "remote_quote_limit" => {
            config.remote_quote_limit = value
                .parse()
                .context("Invalid value for remote_quote_limit. Use a whole number.")?;
        }
        "request_timeout_secs" => {
            config.request_timeout_secs = value
                .parse()
                .context("Invalid value for request_timeout_secs. Use a whole number of seconds.")?;
            if config.request_timeout_secs == 0 {
                bail!("request_timeout_secs must be at least 1");
            }
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                KEYS
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "auto_sync", "true").unwrap();
        apply(&mut config, "conflict_window_secs", "0").unwrap();
        apply(&mut config, "remote_url", " http://localhost:8080/quotes ").unwrap();
        apply(&mut config, "log_file", "/tmp/quotebook.log").unwrap();

        assert!(config.auto_sync);
        assert_eq!(config.conflict_window_secs, 0);
        assert_eq!(config.remote_url, "http://localhost:8080/quotes");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/quotebook.log")));

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();

        assert!(apply(&mut config, "auto_sync", "sometimes").is_err());
        assert!(apply(&mut config, "sync_interval_secs", "0").is_err());
        assert!(apply(&mut config, "request_timeout_secs", "0").is_err());
        assert!(apply(&mut config, "remote_url", "  ").is_err());

        let err = apply(&mut config, "favorite_tag", "x").unwrap_err();
        assert!(err.to_string().contains("Valid keys"));
    }

    #[test]
    fn test_set_writes_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!("data_dir = {:?}\n", temp_dir.path().join("data")),
        )
        .unwrap();
        let output = Output::new(OutputFormat::Quiet);

        set(
            "sync_interval_secs".to_string(),
            "45".to_string(),
            Some(&config_path),
            &output,
        )
        .unwrap();

        let saved = std::fs::read_to_string(&config_path).unwrap();
        assert!(saved.contains("sync_interval_secs = 45"));
    }

    #[test]
    fn test_set_repairs_rejected_interval() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "data_dir = {:?}\nsync_interval_secs = 0\n",
                temp_dir.path().join("data")
            ),
        )
        .unwrap();
        let output = Output::new(OutputFormat::Quiet);

        set(
            "sync_interval_secs".to_string(),
            "30".to_string(),
            Some(&config_path),
            &output,
        )
        .unwrap();

        assert_eq!(
            Config::load_from_path(&config_path).unwrap().sync_interval_secs,
            30
        );
    }
}
