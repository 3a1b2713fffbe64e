pub mod config;

use clap::{Parser, Subcommand};

/// brain: conversational backend service.
#[derive(Debug, Parser)]
#[command(name = "brain", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults and environment
    /// overrides) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `BRAIN_CONFIG` (or
/// `config.toml` by default), then apply environment overrides.  A
/// missing file yields the default config.  Returns the config and the
/// path that was used.
pub fn load_config() -> anyhow::Result<(brain_domain::config::Config, String)> {
    let config_path = std::env::var("BRAIN_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let mut config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        parse_config(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        brain_domain::config::Config::default()
    };
    config.apply_env_overrides();

    Ok((config, config_path))
}

fn parse_config(raw: &str) -> Result<brain_domain::config::Config, toml::de::Error> {
    toml::from_str(raw)
}
