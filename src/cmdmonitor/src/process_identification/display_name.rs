const INTERPRETERS: [&str; 8] = [
    "bash",
    "/bin/bash",
    "sh",
    "/bin/sh",
    "python",
    "python3",
    "/usr/bin/python",
    "/usr/bin/python3",
];

/// Short human-readable name for a command line.
///
/// `bash deploy.sh --fast` becomes `deploy.sh`, `/usr/bin/python3 -u train.py` becomes
/// `train.py`, and anything else is reduced to the base name of its first token.
pub fn extract_display_name(command_line: &str) -> String {
    let mut tokens = command_line.split_whitespace();
    let Some(first) = tokens.next() else {
        return String::new();
    };

    if INTERPRETERS.contains(&first) {
        for token in tokens {
            if token == "-c" {
                break;
            }
            if !token.starts_with('-') {
                return base_name(token).to_string();
            }
        }
    }

    base_name(first).to_string()
}

pub(crate) fn base_name(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bash deploy.sh", "deploy.sh")]
    #[case("/bin/bash ./scripts/deploy.sh release", "deploy.sh")]
    #[case("sh -e /opt/job/run.sh", "run.sh")]
    #[case("python3 -u /srv/train.py --epochs 3", "train.py")]
    #[case("/usr/bin/python worker.py", "worker.py")]
    #[case("bash -c sleep 10", "bash")]
    #[case("/usr/local/bin/rsync -a src dst", "rsync")]
    #[case("node server.js", "node")]
    #[case("bash", "bash")]
    #[case("", "")]
    fn extracts_display_names(#[case] command: &str, #[case] expected: &str) {
        assert_eq!(extract_display_name(command), expected);
    }
}
