pub mod containers;
pub mod process;
pub mod process_manager;
pub mod scanner;
