use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use transcript::{Isolation, RunOptions};

/// Looked for next to the file under test when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "transcript.toml";

/// Settings from `transcript.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `"shared"` or `"fresh"`.
    pub isolation: Isolation,
    pub max_depth: usize,
    pub echo_prints: bool,
}

impl Default for Config {
    fn default() -> Self {
        let options = RunOptions::default();
        Config {
            isolation: options.isolation,
            max_depth: options.max_depth,
            echo_prints: options.echo_prints,
        }
    }
}

impl Config {
    /// Load `explicit` if given, else `transcript.toml` beside `source`, else
    /// the defaults.
    pub fn load(explicit: Option<&Path>, source: &Path) -> anyhow::Result<Config> {
        if let Some(path) = explicit {
            return Config::from_file(path);
        }
        let beside = config_beside(source);
        if beside.is_file() {
            return Config::from_file(&beside);
        }
        debug!("no config file, using defaults");
        Ok(Config::default())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config '{}'", path.display()))?;
        let config = Config::parse(&text)
            .with_context(|| format!("invalid config '{}'", path.display()))?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            isolation: self.isolation,
            max_depth: self.max_depth,
            echo_prints: self.echo_prints,
        }
    }
}

fn config_beside(source: &Path) -> PathBuf {
    match source.parent() {
        Some(dir) => dir.join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}
