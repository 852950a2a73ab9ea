mod process_info;
mod process_key;
mod tracked_process;

pub use process_info::{ContainerId, ProcessInfo, ProcessLocation};
pub use process_key::ProcessKey;
pub use tracked_process::{TrackedProcess, TrackedStatus};
