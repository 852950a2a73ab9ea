mod events;
mod handlers;
mod manager;
mod state;

pub use events::ProcessEventHandler;
pub use manager::{ManagerSettings, MonitorManager};
pub use state::{Admission, StateManager, TrackedTable};
