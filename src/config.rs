//! config.rs — tracked products, fetch settings and output layout.
//!
//! The config path resolves from `PELLET_CONFIG_PATH`, falling back to
//! `config/products.toml` relative to the working directory.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::parse::ParseStrategy;

const ENV_PATH: &str = "PELLET_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/products.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub products: Vec<ProductConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub retries: u32,
    /// Pause between consecutive page fetches.
    pub delay_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            retries: 3,
            delay_ms: 300,
            user_agent: concat!("pellet-tracker/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding every output file of a run.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

impl OutputConfig {
    pub fn history_path(&self) -> PathBuf {
        self.dir.join("pellet_prices.jsonl")
    }
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join("pellet_prices_latest.json")
    }
    pub fn csv_path(&self) -> PathBuf {
        self.dir.join("pellet_prices.csv")
    }
    pub fn run_log_path(&self) -> PathBuf {
        self.dir.join("runs.txt")
    }
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(".pellet-tracker.lock")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    pub id: String,
    pub name: String,
    pub url: String,
    pub parser: ParseStrategy,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "per-bag".to_string()
}

impl Config {
    /// Load using env var + fallback:
    /// 1) $PELLET_CONFIG_PATH
    /// 2) config/products.toml
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("PELLET_CONFIG_PATH points to non-existent path");
            }
            return Self::load_from(&pb);
        }
        Self::load_from(Path::new(DEFAULT_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config from {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.products.is_empty() {
            bail!("no products configured");
        }
        let mut seen = HashSet::new();
        for p in &self.products {
            if p.id.trim().is_empty() {
                bail!("product with empty id (url {})", p.url);
            }
            if !seen.insert(p.id.as_str()) {
                bail!("duplicate product id {:?}", p.id);
            }
        }
        Ok(())
    }
}
