pub mod area;
pub mod config;
pub mod kpis;
pub mod order;
pub mod serve;
pub mod tick;
pub mod timer;

use anyhow::Context;
use ordenes_core::config::Config;
use ordenes_core::engine::Engine;
use std::path::Path;

/// Timer settings given on the command line, applied over `ordenes.yaml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub n_seg: Option<u64>,
    pub sla_seg: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(n) = self.n_seg {
            config.timer.n_seg = n;
        }
        if let Some(s) = self.sla_seg {
            config.timer.sla_seg = s;
        }
    }
}

pub fn load_config(root: &Path, overrides: &Overrides) -> anyhow::Result<Config> {
    let mut config = Config::load(root).context("failed to load config")?;
    overrides.apply(&mut config);
    Ok(config)
}

pub fn open_engine(root: &Path) -> anyhow::Result<Engine> {
    let path = ordenes_core::paths::db_path(root);
    Engine::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}
