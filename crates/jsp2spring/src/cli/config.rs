//! Configuration resolution and the `config` command
//!
//! Priority: `--config <file>`, then `./jsp2spring.toml` when present, then
//! built-in defaults.

use crate::cli::error::HelpfulError;
use crate::cli::output::print_json;
use jsp2spring_core::{EngineConfig, EngineError};
use jsp2spring_logging::{jsp2spring_home, logs_dir};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "jsp2spring.toml";

#[derive(Debug)]
pub struct ConfigArgs {
    pub json: bool,
    pub config: Option<PathBuf>,
}

/// Configuration plus the file it came from, if any
pub struct ResolvedConfig {
    pub config: EngineConfig,
    pub source: Option<PathBuf>,
}

pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let candidate = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.is_file().then_some(local)
        }
    };

    let Some(path) = candidate else {
        return Ok(ResolvedConfig {
            config: EngineConfig::default(),
            source: None,
        });
    };

    let config = EngineConfig::load(&path).map_err(|err| match err {
        EngineError::Config(reason) => HelpfulError::invalid_config(&reason)
            .with_context(format!("While loading {}", path.display())),
        other => HelpfulError::new(format!("Cannot read config file: {}", path.display()))
            .with_context(other.to_string())
            .with_suggestion(format!("TRY: Check the file exists: ls -la {}", path.display())),
    })?;
    Ok(ResolvedConfig {
        config,
        source: Some(path),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigReport<'a> {
    config_file: Option<String>,
    home: String,
    logs_dir: String,
    config: &'a EngineConfig,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let resolved = resolve(args.config.as_deref())?;
    let report = ConfigReport {
        config_file: resolved.source.as_ref().map(|p| p.display().to_string()),
        home: jsp2spring_home().display().to_string(),
        logs_dir: logs_dir().display().to_string(),
        config: &resolved.config,
    };

    if args.json {
        return print_json(&report);
    }

    println!("jsp2spring configuration");
    println!(
        "  Config file: {}",
        report.config_file.as_deref().unwrap_or("(defaults)")
    );
    println!("  Home:        {}", report.home);
    println!("  Logs:        {}", report.logs_dir);
    println!();
    println!("{}", resolved.config.to_toml()?);
    Ok(())
}
