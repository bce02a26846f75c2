//! Process wiring: logging, store and source construction, serve loop

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;
use crate::service::facade::VersionService;
use crate::service::refresh::Refresher;
use crate::service::scheduler::RefreshScheduler;
use crate::version::resolver::VersionResolver;
use crate::version::sources::{EndOfLifeFeed, GitHubTags};
use crate::version::store::SqliteStore;

/// Environment variable holding the tracing filter directives
pub const LOG_ENV: &str = "PYTHON_VERSIONS_LOG";

/// Install JSON file logging plus a human-readable stderr layer
///
/// The returned guard flushes the file writer when dropped.
pub fn init_logging(log_file: &Path) -> anyhow::Result<WorkerGuard> {
    let dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {:?}", dir))?;
    let file_name = log_file
        .file_name()
        .context("log path has no file name")?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(writer))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

/// Everything a process needs to serve and refresh version records
pub struct App {
    pub refresher: Arc<Refresher<SqliteStore>>,
    pub service: VersionService<SqliteStore>,
    pub config: AppConfig,
}

impl App {
    /// Open the store at `db_path` and build the feed clients from `config`
    pub fn build(config: AppConfig, db_path: &Path) -> anyhow::Result<Self> {
        config.validate()?;
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create data directory {:?}", dir))?;
        }
        let store = Arc::new(SqliteStore::new(db_path)?);

        let timeout = Duration::from_millis(config.sources.timeout_ms);
        let tags = GitHubTags::new(
            &config.sources.tags_base_url,
            &config.sources.repository,
            &config.sources.user_agent,
            timeout,
        )?;
        let eol = EndOfLifeFeed::new(
            &config.sources.eol_base_url,
            &config.sources.product,
            &config.sources.user_agent,
            timeout,
        )?;

        let stale_after = chrono::Duration::milliseconds(
            i64::try_from(config.refresh.stale_after_ms).unwrap_or(i64::MAX),
        );
        let refresher = Arc::new(Refresher::new(
            store,
            Arc::new(tags),
            Arc::new(eol),
            VersionResolver::new(&config.tracking),
            stale_after,
        ));
        let service = VersionService::new(refresher.clone());

        Ok(Self {
            refresher,
            service,
            config,
        })
    }

    pub fn scheduler(&self) -> RefreshScheduler<SqliteStore> {
        RefreshScheduler::new(
            self.refresher.clone(),
            Duration::from_millis(self.config.refresh.interval_ms),
        )
    }
}

/// Load the configuration file, or defaults when none is given
pub fn load_config(config_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load configuration from {:?}", path)),
        None => Ok(AppConfig::default()),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run the refresh scheduler until the process is asked to stop
pub async fn run_server(app: App) -> anyhow::Result<()> {
    info!("Starting python-versions refresher");

    let mut scheduler = app.scheduler();
    scheduler.start();

    shutdown_signal().await;

    scheduler.shutdown().await;
    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_config_defaults_without_path() {
        assert_eq!(load_config(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn load_config_reports_missing_file() {
        let result = load_config(Some(Path::new("/definitely/not/here.json")));
        assert!(result.is_err());
    }

    #[test]
    fn build_rejects_zero_refresh_interval() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.refresh.interval_ms = 0;

        let result = App::build(config, &temp_dir.path().join("versions.db"));

        assert!(result.is_err());
        assert!(!temp_dir.path().join("versions.db").exists());
    }

    #[tokio::test]
    async fn build_creates_database_in_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested/dir/versions.db");

        let app = App::build(AppConfig::default(), &db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(app.scheduler().interval(), Duration::from_secs(24 * 60 * 60));
    }
}
