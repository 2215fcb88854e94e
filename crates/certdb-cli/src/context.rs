use anyhow::Context;
use certdb_config::CertdbConfig;
use certdb_db::CertDb;

/// Resources shared by every store-backed command.
pub struct AppContext {
    pub config: CertdbConfig,
    pub db: CertDb,
}

impl AppContext {
    /// Open (creating if needed) the database under the configured root.
    pub async fn open(config: CertdbConfig) -> anyhow::Result<Self> {
        let db_path = config.paths.db_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db = CertDb::open_local(&db_path.to_string_lossy())
            .await
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        Ok(Self { config, db })
    }
}
