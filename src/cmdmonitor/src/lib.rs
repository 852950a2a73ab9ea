pub mod cli;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod extracts;
pub mod logging;
pub mod notification;
pub mod process_identification;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod test_support;
