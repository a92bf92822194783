use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::CountPolicy;
use crate::core::types::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "cybernow",
    version,
    about = "CyberNow threat dashboard for the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to config file (TOML). Default: config/cybernow.toml
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Increase verbosity (info, debug, trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log file path
    #[arg(long, default_value = "data/cybernow.log", global = true)]
    pub log_file: String,

    /// Backend base URL (overrides config and CYBERNOW_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Use the built-in demo data instead of the backend
    #[arg(long, global = true)]
    pub demo: bool,

    /// Where the critical and sector counters come from
    #[arg(long, value_enum, global = true)]
    pub count_policy: Option<CountPolicyArg>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Live terminal dashboard (default)
    Watch {
        /// Seconds between refresh cycles
        #[arg(long)]
        poll_interval: Option<u64>,
    },
    /// Run one refresh cycle and write the result
    Snapshot {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormatArg,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check a password against known breaches (hidden prompt, or first line of piped stdin)
    PasswordCheck,
}

impl Cli {
    pub fn is_headless(&self) -> bool {
        !matches!(self.command, None | Some(Command::Watch { .. }))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormatArg {
    Json,
    Markdown,
    Html,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Markdown => OutputFormat::Markdown,
            OutputFormatArg::Html => OutputFormat::Html,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CountPolicyArg {
    Client,
    Backend,
}

impl From<CountPolicyArg> for CountPolicy {
    fn from(value: CountPolicyArg) -> Self {
        match value {
            CountPolicyArg::Client => CountPolicy::Client,
            CountPolicyArg::Backend => CountPolicy::Backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_is_the_dashboard() {
        let cli = Cli::try_parse_from(["cybernow"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.is_headless());
        assert_eq!(cli.log_file, "data/cybernow.log");
    }

    #[test]
    fn snapshot_flags_parse() {
        let cli = Cli::try_parse_from([
            "cybernow",
            "snapshot",
            "--format",
            "html",
            "--output",
            "out/feed.html",
            "--demo",
            "--count-policy",
            "backend",
        ])
        .unwrap();
        assert!(cli.is_headless());
        assert!(cli.demo);
        assert!(matches!(cli.count_policy, Some(CountPolicyArg::Backend)));
        match cli.command {
            Some(Command::Snapshot { format, output }) => {
                assert_eq!(OutputFormat::from(format), OutputFormat::Html);
                assert_eq!(output, Some(PathBuf::from("out/feed.html")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn watch_takes_poll_interval() {
        let cli = Cli::try_parse_from(["cybernow", "-vv", "watch", "--poll-interval", "15"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Some(Command::Watch {
                poll_interval: Some(15)
            })
        ));
    }
}
