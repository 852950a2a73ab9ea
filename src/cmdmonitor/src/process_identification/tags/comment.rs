use regex::Regex;
use std::sync::LazyLock;

static COMMENT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\s*(?:MONITOR|CMDMONITOR|TRACK):\s*(\S*)").expect("valid comment tag pattern")
});

pub fn has_comment_tag(text: &str) -> bool {
    COMMENT_TAG.is_match(text)
}

/// The word following the marker, `release` in `# MONITOR: release`.
pub fn comment_tag_label(text: &str) -> Option<&str> {
    COMMENT_TAG
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|label| !label.is_empty())
}
