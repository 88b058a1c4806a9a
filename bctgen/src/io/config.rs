//! Run configuration stored in `bctgen.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Generator configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenConfig {
    /// Directory holding prompt templates (`<prompts_dir>/<name>.txt`).
    pub prompts_dir: PathBuf,

    /// Directory holding per-dataset output (`<data_dir>/<name>/<code>.csv`).
    pub data_dir: PathBuf,

    /// Path to the BCT taxonomy CSV (columns `No`, `Label`, `Definition`).
    pub taxonomy_path: PathBuf,

    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Command to execute per generation call. `{system_prompt}` and `{count}`
    /// are substituted into arguments; the user prompt is piped to stdin.
    pub command: Vec<String>,

    /// Wall-clock budget for one generation call in seconds.
    pub timeout_secs: u64,

    /// Truncate generator stdout/stderr logs beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "llm".to_string(),
                "-s".to_string(),
                "{system_prompt}".to_string(),
            ],
            timeout_secs: 120,
            output_limit_bytes: 100_000,
        }
    }
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            prompts_dir: PathBuf::from("prompts"),
            data_dir: PathBuf::from("data"),
            taxonomy_path: PathBuf::from("taxonomy/bctt_v1.csv"),
            generator: GeneratorConfig::default(),
        }
    }
}

impl GenConfig {
    pub fn validate(&self) -> Result<()> {
        if self.generator.timeout_secs == 0 {
            return Err(anyhow!("generator.timeout_secs must be > 0"));
        }
        if self.generator.output_limit_bytes == 0 {
            return Err(anyhow!("generator.output_limit_bytes must be > 0"));
        }
        if self.generator.command.is_empty() || self.generator.command[0].trim().is_empty() {
            return Err(anyhow!("generator.command must be a non-empty array"));
        }
        Ok(())
    }

    /// Path of the template file for a named prompt configuration.
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.prompts_dir.join(format!("{name}.txt"))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GenConfig::default()`.
pub fn load_config(path: &Path) -> Result<GenConfig> {
    if !path.exists() {
        let cfg = GenConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GenConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &GenConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
