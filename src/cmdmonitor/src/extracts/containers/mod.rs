mod docker;
mod error;
mod inspector;
mod runtime;

pub use docker::DockerRuntime;
pub use error::{ContainerError, ContainerResult};
pub use inspector::ContainerInspector;
pub use runtime::ContainerRuntime;
