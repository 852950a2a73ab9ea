use async_trait::async_trait;

use super::ContainerResult;
use crate::process_identification::types::ContainerId;

/// The operations the monitor needs from a container engine.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn list_running(&self) -> ContainerResult<Vec<ContainerId>>;

    /// Host PID of the container's init process.
    async fn main_pid(&self, id: &ContainerId) -> ContainerResult<u32>;

    /// Runs `args` inside the container and returns its stdout.
    async fn exec(&self, id: &ContainerId, args: &[String]) -> ContainerResult<String>;
}
