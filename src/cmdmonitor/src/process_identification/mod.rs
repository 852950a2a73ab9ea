pub mod display_name;
pub mod tags;
pub mod types;
