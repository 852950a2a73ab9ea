use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{run_storage_cleanup, wait_for_shutdown_signal, PersistAndNotify};
use crate::config::Config;
use crate::extracts::containers::{ContainerInspector, DockerRuntime};
use crate::extracts::process::{HostProcessTable, HostProcesses};
use crate::extracts::process_manager::{ManagerSettings, MonitorManager};
use crate::extracts::scanner::ProcessScanner;
use crate::notification::{build_notifier, Notifier};
use crate::process_identification::tags::DynamicTagFile;
use crate::storage::{JsonStorage, Storage};

/// Fully wired daemon, ready to run.
pub struct Application {
    config: Config,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    manager: Arc<MonitorManager>,
}

impl Application {
    /// Builds every collaborator. Fails rather than starting half-initialized.
    pub async fn initialize(config: Config) -> Result<Self> {
        info!("cmdmonitor {} starting", env!("CARGO_PKG_VERSION"));
        info!("effective configuration:\n{config}");

        let storage: Arc<dyn Storage> = Arc::new(
            JsonStorage::initialize(&config.storage_path)
                .context("Failed to initialize storage")?,
        );

        let tag_file = DynamicTagFile::new(&config.dynamic_tags_file);
        if !tag_file
            .check_readable()
            .context("Dynamic tag file is not usable")?
        {
            warn!(
                path = %tag_file.path().display(),
                "dynamic tag file not found, only comment tags are active"
            );
        }

        let notifier = build_notifier(&config).context("Failed to initialize notifier")?;
        let containers = connect_containers(&config).await;

        let host: Arc<dyn HostProcessTable> = Arc::new(HostProcesses::new());
        let scanner =
            ProcessScanner::new(Arc::clone(&host), containers, &config.dynamic_tags_file);
        let handler = Arc::new(PersistAndNotify::new(
            Arc::clone(&storage),
            Arc::clone(&notifier),
        ));
        let manager = MonitorManager::new(scanner, host, ManagerSettings::from_config(&config))
            .with_event_handler(handler);

        info!("initialization complete");
        Ok(Self {
            config,
            storage,
            notifier,
            manager: Arc::new(manager),
        })
    }

    /// Runs until SIGINT or SIGTERM, then tears down in order.
    pub async fn run(self) -> Result<()> {
        let cancellation_token = CancellationToken::new();

        let monitor = tokio::spawn({
            let manager = Arc::clone(&self.manager);
            let token = cancellation_token.clone();
            async move { manager.run(token).await }
        });
        let cleanup = tokio::spawn(run_storage_cleanup(
            Arc::clone(&self.storage),
            self.config.history_retention(),
            self.config.cleanup_interval(),
            cancellation_token.clone(),
        ));

        let signal_result = wait_for_shutdown_signal().await;
        cancellation_token.cancel();

        if let Err(e) = monitor.await {
            warn!("monitor task ended abnormally: {e}");
        }
        if let Err(e) = cleanup.await {
            warn!("cleanup task ended abnormally: {e}");
        }

        self.shutdown().await;
        signal_result
    }

    async fn shutdown(&self) {
        self.manager.wait_for_handlers().await;
        if let Err(e) = self.notifier.close().await {
            warn!("Failed to close notifier: {e:#}");
        }
        if let Err(e) = self.storage.close() {
            warn!("Failed to close storage: {e:#}");
        }
        info!("cmdmonitor stopped");
    }
}

/// The container inspector, or `None` when Docker is disabled or unreachable.
pub async fn connect_containers(config: &Config) -> Option<ContainerInspector> {
    if !config.docker_enabled {
        info!("container monitoring disabled");
        return None;
    }

    match DockerRuntime::connect(&config.docker_socket, config.command_timeout()).await {
        Ok(runtime) => {
            info!(socket = %config.docker_socket, "connected to Docker");
            Some(ContainerInspector::new(Arc::new(runtime)))
        }
        Err(e) => {
            warn!(
                socket = %config.docker_socket,
                "Docker unavailable, monitoring host processes only: {e}"
            );
            None
        }
    }
}
