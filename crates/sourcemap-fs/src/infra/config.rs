//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static WORKSPACE_CONFIG_FILE: &str = ".sourcemap-fs.toml";

/// Layered configuration loaded from defaults, user, workspace, explicit file and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// How sourcemap files are discovered and how their sources are classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    extension: Option<String>,
    #[serde(default)]
    pub strip_prefixes: Vec<String>,
    #[serde(default)]
    pub exclude_sources: Vec<String>,
    #[serde(default)]
    pub third_party: Vec<String>,
}

impl LoaderConfig {
    fn default_extension() -> &'static str {
        ".map"
    }

    pub fn extension(&self) -> String {
        self.extension
            .clone()
            .unwrap_or_else(|| Self::default_extension().to_owned())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: Some(Self::default_extension().to_owned()),
            strip_prefixes: vec!["webpack:///".into()],
            exclude_sources: vec!["*.css".into()],
            third_party: vec!["**/node_modules/**".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    context_chars: Option<usize>,
}

impl SearchConfig {
    fn default_context_chars() -> usize {
        64
    }

    /// Characters of source shown on each side of a match.
    pub fn context_chars(&self) -> usize {
        self.context_chars
            .unwrap_or_else(Self::default_context_chars)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            context_chars: Some(Self::default_context_chars()),
        }
    }
}

/// Redraw throttling intervals, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    tree_interval_ms: Option<u64>,
    #[serde(default)]
    chooser_interval_ms: Option<u64>,
    #[serde(default)]
    search_interval_ms: Option<u64>,
    #[serde(default)]
    cycle_interval_ms: Option<u64>,
    #[serde(default)]
    tick_ms: Option<u64>,
}

impl RenderConfig {
    pub fn tree_interval(&self) -> Duration {
        Duration::from_millis(self.tree_interval_ms.unwrap_or(500))
    }

    pub fn chooser_interval(&self) -> Duration {
        Duration::from_millis(self.chooser_interval_ms.unwrap_or(16))
    }

    pub fn search_interval(&self) -> Duration {
        Duration::from_millis(self.search_interval_ms.unwrap_or(16))
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms.unwrap_or(100))
    }

    /// Event loop poll timeout.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.unwrap_or(50).max(1))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tree_interval_ms: Some(500),
            chooser_interval_ms: Some(16),
            search_interval_ms: Some(16),
            cycle_interval_ms: Some(100),
            tick_ms: Some(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    level: Option<String>,
    /// Log destination. The terminal belongs to the UI, so without it only `RUST_LOG` enables
    /// logging, to stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LogConfig {
    pub fn level(&self) -> String {
        self.level.clone().unwrap_or_else(|| "info".to_owned())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Some("info".into()),
            file: None,
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    log_level: Option<String>,
    context_chars: Option<usize>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            log_level: env::var("SOURCEMAP_FS_LOG").ok(),
            context_chars: env::var("SOURCEMAP_FS_CONTEXT_CHARS")
                .ok()
                .and_then(|value| value.trim().parse().ok()),
        }
    }

    #[cfg(test)]
    fn for_tests(log_level: &str, context_chars: usize) -> Self {
        Self {
            log_level: Some(log_level.to_owned()),
            context_chars: Some(context_chars),
        }
    }
}

impl Config {
    /// Load configuration for exploring `root`, optionally layering an explicit file last.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = Some(root.join(WORKSPACE_CONFIG_FILE));
        let mut layers = vec![global, workspace];
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            layers.push(Some(path.to_path_buf()));
        }
        Self::load_with_layers(layers, env)
    }

    fn load_with_layers(paths: Vec<Option<PathBuf>>, env_overrides: EnvOverrides) -> Result<Self> {
        let mut layers: Vec<Config> = vec![Self::from_str(&DEFAULT_CONFIG)?];

        for path in paths.into_iter().flatten().filter(|path| path.exists()) {
            layers.push(Self::from_file(&path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("failed to load config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            loader: merge_loader(self.loader, other.loader),
            search: SearchConfig {
                context_chars: other.search.context_chars.or(self.search.context_chars),
            },
            render: merge_render(self.render, other.render),
            log: LogConfig {
                level: other.log.level.or(self.log.level),
                file: other.log.file.or(self.log.file),
            },
        }
    }
}

fn merge_loader(base: LoaderConfig, overlay: LoaderConfig) -> LoaderConfig {
    LoaderConfig {
        extension: overlay.extension.or(base.extension),
        strip_prefixes: union(base.strip_prefixes, overlay.strip_prefixes),
        exclude_sources: union(base.exclude_sources, overlay.exclude_sources),
        third_party: union(base.third_party, overlay.third_party),
    }
}

fn merge_render(base: RenderConfig, overlay: RenderConfig) -> RenderConfig {
    RenderConfig {
        tree_interval_ms: overlay.tree_interval_ms.or(base.tree_interval_ms),
        chooser_interval_ms: overlay.chooser_interval_ms.or(base.chooser_interval_ms),
        search_interval_ms: overlay.search_interval_ms.or(base.search_interval_ms),
        cycle_interval_ms: overlay.cycle_interval_ms.or(base.cycle_interval_ms),
        tick_ms: overlay.tick_ms.or(base.tick_ms),
    }
}

fn union(base: Vec<String>, overlay: Vec<String>) -> Vec<String> {
    let mut merged: BTreeSet<String> = base.into_iter().collect();
    merged.extend(overlay);
    merged.into_iter().collect()
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("sourcemap-fs/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(level) = env.log_level {
        config.log.level = Some(level);
    }
    if let Some(chars) = env.context_chars {
        config.search.context_chars = Some(chars);
    }
    config
}
