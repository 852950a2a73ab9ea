use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bollard::query_parameters::{InspectContainerOptions, ListContainersOptionsBuilder};
use bollard::Docker;
use tokio::process::Command;
use tracing::debug;

use super::{ContainerError, ContainerResult, ContainerRuntime};
use crate::process_identification::types::ContainerId;

/// Docker-backed runtime. Listing and inspection use the API, in-container commands
/// go through `docker exec`. Every call is bounded by `timeout`.
pub struct DockerRuntime {
    docker: Docker,
    timeout: Duration,
}

impl DockerRuntime {
    pub async fn connect(socket: &str, timeout: Duration) -> ContainerResult<Self> {
        let docker =
            Docker::connect_with_unix(socket, timeout.as_secs(), bollard::API_DEFAULT_VERSION)?;
        let runtime = Self { docker, timeout };
        runtime.bounded("docker ping", runtime.docker.ping()).await?;
        Ok(runtime)
    }

    async fn bounded<T, E, F>(&self, operation: &str, fut: F) -> ContainerResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ContainerError>,
    {
        bounded(self.timeout, operation, fut).await
    }
}

/// Runs `fut` under `timeout`. Expiry becomes `ContainerError::Timeout`.
pub(crate) async fn bounded<T, E, F>(
    timeout: Duration,
    operation: &str,
    fut: F,
) -> ContainerResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ContainerError>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(ContainerError::Timeout {
            operation: operation.to_string(),
            timeout,
        }),
    }
}

/// Script files may carry bytes that are not UTF-8; the rest of the text still counts.
fn stdout_text(stdout: Vec<u8>) -> String {
    match String::from_utf8(stdout) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_running(&self) -> ContainerResult<Vec<ContainerId>> {
        let options = ListContainersOptionsBuilder::default().all(false).build();
        let containers = self
            .bounded("list containers", self.docker.list_containers(Some(options)))
            .await?;

        Ok(containers
            .into_iter()
            .filter_map(|c| c.id)
            .map(ContainerId)
            .collect())
    }

    async fn main_pid(&self, id: &ContainerId) -> ContainerResult<u32> {
        let details = self
            .bounded(
                "inspect container",
                self.docker
                    .inspect_container(id.as_str(), None::<InspectContainerOptions>),
            )
            .await?;

        details
            .state
            .and_then(|state| state.pid)
            .filter(|pid| *pid > 0)
            .and_then(|pid| u32::try_from(pid).ok())
            .ok_or_else(|| ContainerError::InvalidOutput(format!("container {id} has no main pid")))
    }

    async fn exec(&self, id: &ContainerId, args: &[String]) -> ContainerResult<String> {
        let command = format!("docker exec {} {}", id.short(), args.join(" "));
        debug!("running {command}");

        let child = Command::new("docker")
            .arg("exec")
            .arg(id.as_str())
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = self.bounded(&command, child).await?;
        if !output.status.success() {
            return Err(ContainerError::CommandFailed {
                command,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(stdout_text(output.stdout))
    }
}
