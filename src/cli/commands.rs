//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Browse community listings, members and events page by page
#[derive(Parser, Debug)]
#[command(name = "community-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List communities
    List {
        /// Only communities matching this search term
        #[arg(long)]
        search: Option<String>,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// List the members of a community
    Members {
        /// Community id
        community_id: String,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// List the events of a community
    Events {
        /// Community id
        community_id: String,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Join a community
    Join {
        /// Community id
        community_id: String,
    },

    /// Leave a community
    Leave {
        /// Community id
        community_id: String,
    },

    /// Show the effective configuration (token redacted)
    Config,
}

/// Options shared by the paging commands
#[derive(clap::Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingArgs {
    /// Keep loading pages until the list is exhausted
    #[arg(long)]
    pub all: bool,

    /// Page size (overrides the configured one)
    #[arg(long)]
    pub limit: Option<u32>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_members() {
        let cli = Cli::try_parse_from([
            "community-pager",
            "members",
            "c1",
            "--all",
            "--limit",
            "5",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Commands::Members {
                community_id: "c1".to_string(),
                paging: PagingArgs {
                    all: true,
                    limit: Some(5),
                },
            }
        );
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "community-pager",
            "list",
            "-C",
            "pager.yaml",
            "-f",
            "pretty",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("pager.yaml")));
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Commands::List {
                search: None,
                paging: PagingArgs::default(),
            }
        );
    }

    #[test]
    fn test_members_requires_id() {
        assert!(Cli::try_parse_from(["community-pager", "members"]).is_err());
    }
}
