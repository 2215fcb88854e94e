use std::path::Path;

use anyhow::Context;
use certdb_config::CertdbConfig;

use crate::cli::GlobalFlags;

/// Load `.env`, then the layered configuration. With `--root`, the project
/// file and dotenv are read from that directory and `paths.root` is set to it.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<CertdbConfig> {
    let dir = flags.root.as_deref().unwrap_or_else(|| Path::new("."));
    let mut config =
        CertdbConfig::load_with_dotenv(dir).context("failed to load certdb configuration")?;
    if let Some(root) = &flags.root {
        config.paths.root.clone_from(root);
    }
    tracing::debug!(root = %config.paths.root.display(), "configuration loaded");
    Ok(config)
}
