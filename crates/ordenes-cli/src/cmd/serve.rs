use super::Overrides;
use anyhow::Context;
use ordenes_server::state::AppState;
use std::path::Path;

pub fn run(
    root: &Path,
    overrides: &Overrides,
    port: Option<u16>,
    host: Option<String>,
) -> anyhow::Result<()> {
    let mut config = super::load_config(root, overrides)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    if let Some(h) = host {
        config.server.host = h;
    }
    for w in config.validate() {
        tracing::warn!("config: {}", w.message);
    }
    if config.has_errors() {
        anyhow::bail!("invalid configuration; run `ordenes config validate`");
    }

    let state = AppState::open(root, config).context("failed to open data directory")?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(ordenes_server::serve(state))
}
