use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ai::{provider_from_config, AiProvider};
use crate::app::error::{DriftlineError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::refresh::{Refresher, DEFAULT_WORKERS};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::sqlite::SqliteStore;

/// Shared handles for one command invocation.
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub refresher: Refresher,
    pub normalizer: Normalizer,
    pub provider: Arc<dyn AiProvider>,
}

impl AppContext {
    pub fn new(config: Config, config_path: PathBuf) -> Result<Self> {
        Self::with_workers(config, config_path, DEFAULT_WORKERS)
    }

    pub fn with_workers(config: Config, config_path: PathBuf, workers: usize) -> Result<Self> {
        let db_path = match config.db_path.clone() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        if let Some(parent) = db_path.parent() {
            ensure_private_dir(parent)?;
        }

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(config.allow_insecure_ssl));
        let refresher = Refresher::with_workers(fetcher.clone(), workers);
        let normalizer = Normalizer::new();
        let provider = provider_from_config(&config.ai);

        Ok(Self {
            config,
            config_path,
            store,
            fetcher,
            refresher,
            normalizer,
            provider,
        })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(config.allow_insecure_ssl));
        let refresher = Refresher::new(fetcher.clone());
        let normalizer = Normalizer::new();
        let provider = provider_from_config(&config.ai);

        Ok(Self {
            config,
            config_path: PathBuf::new(),
            store,
            fetcher,
            refresher,
            normalizer,
            provider,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| DriftlineError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("driftline").join("driftline.db"))
    }
}

/// Create the directory if needed and keep it owner-only on unix. The
/// database may hold API-generated text the user considers private.
fn ensure_private_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)) {
            tracing::warn!("Could not restrict permissions on {}: {}", dir.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_context() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        assert!(ctx.config.feeds.is_empty());
        assert_eq!(ctx.provider.name(), "claude_cli");
    }

    #[test]
    fn test_ensure_private_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_private_dir(&nested).unwrap();
        assert!(nested.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&nested).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }
}
