use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:^|\s)(?:\S*/)?(?:bash|sh)\s+(?:-\S+\s+)*(\S+\.sh)(?:\s|$)"),
        Regex::new(r"(?:^|\s)(?:\S*/)?python[0-9.]*\s+(?:-\S+\s+)*(\S+\.py)(?:\s|$)"),
        Regex::new(r"(?:^|\s)(\./\S+\.sh|/\S+\.sh)(?:\s|$)"),
    ]
    .map(|pattern| pattern.expect("valid script pattern"))
});

const INVOCATION_PREFIXES: [&str; 8] = [
    "bash ",
    "sh ",
    "/bin/bash ",
    "/bin/sh ",
    "python ",
    "python3 ",
    "/usr/bin/python ",
    "/usr/bin/python3 ",
];

/// Script file named by a shell or python invocation, if any.
pub fn extract_script_path(command: &str) -> Option<&str> {
    SCRIPT_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(command)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    })
}

pub fn command_matches_script_name(command: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    command.contains(name)
        || command.contains(&format!("/{name}"))
        || command == name
        || command.starts_with(&format!("{name} "))
        || INVOCATION_PREFIXES
            .iter()
            .any(|prefix| command.contains(&format!("{prefix}{name}")))
}
