//! Tag detection: inline comment markers and the dynamic tag file.

mod comment;
mod dynamic;
mod matcher;
mod script;

pub use comment::{comment_tag_label, has_comment_tag};
pub use dynamic::{DynamicTagFile, DynamicTags};
pub use matcher::TagMatcher;
pub use script::{command_matches_script_name, extract_script_path};
