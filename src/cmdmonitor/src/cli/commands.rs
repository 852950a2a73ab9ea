use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "cmdmonitor",
    about = "Watches tagged host and container processes and reports when they finish",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the monitor in the foreground (default)
    Run,

    /// List the tagged processes that would be tracked right now
    Scan {
        /// Output in JSON format
        #[clap(long)]
        json: bool,
    },

    /// Show stored statistics and recently finished processes
    Status {
        /// Output in JSON format
        #[clap(long)]
        json: bool,
        /// Number of finished processes to show
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },

    /// Add a PID or script name to the dynamic tag file
    Tag { entry: String },

    /// Remove a PID or script name from the dynamic tag file
    Untag { entry: String },

    /// Send a test notification through the configured channel
    TestNotify { message: Option<String> },

    /// Print the effective configuration
    Config,

    /// Print the version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_run() {
        let cli = Cli::try_parse_from(["cmdmonitor"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["cmdmonitor", "status", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(
            cli.command,
            Some(Command::Status {
                json: false,
                limit: 10
            })
        );
    }

    #[test]
    fn parses_tag_and_test_notify() {
        let cli = Cli::try_parse_from(["cmdmonitor", "tag", "backup.sh"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Tag {
                entry: "backup.sh".into()
            })
        );

        let cli = Cli::try_parse_from(["cmdmonitor", "test-notify"]).unwrap();
        assert_eq!(cli.command, Some(Command::TestNotify { message: None }));
    }

    #[test]
    fn tag_requires_entry() {
        assert!(Cli::try_parse_from(["cmdmonitor", "tag"]).is_err());
    }
}
