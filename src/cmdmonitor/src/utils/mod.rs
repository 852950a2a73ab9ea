mod format;
mod fs;

pub use format::{format_bytes, format_duration};
pub use fs::write_atomic;
