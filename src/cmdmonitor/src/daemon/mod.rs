mod app;
mod cleanup;
mod pipeline;
mod signals;

pub use app::{connect_containers, Application};
pub use cleanup::run_storage_cleanup;
pub use pipeline::PersistAndNotify;
pub use signals::wait_for_shutdown_signal;
