//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trove CLI - Browse data directories and the provenance of derived data.
#[derive(Debug, Parser)]
#[command(name = "trove")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TROVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Trees and tables (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (paths only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a nested summary of a directory
    Ls(LsArgs),

    /// Resolve hints to a single entry
    Select(TargetArgs),

    /// Show the entry whose name sorts last
    Latest(TargetArgs),

    /// Show the recorded steps of a bundle
    Describe(DescribeArgs),

    /// Print the contents of a file or bundle
    Show(ShowArgs),

    /// Manage project nicknames
    Project(ProjectArgs),
}

/// A location followed by zero or more selection hints.
#[derive(Debug, Clone, Parser)]
pub struct TargetArgs {
    /// Project nickname or directory path
    pub location: String,

    /// Hints applied in turn, each selecting one child of the previous entry
    pub hints: Vec<String>,
}

/// Arguments for the ls command.
#[derive(Debug, Parser)]
pub struct LsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// List every file at every depth
    #[arg(long)]
    pub full: bool,
}

/// Arguments for the describe command.
#[derive(Debug, Parser)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print the code text of each step instead of the step table
    #[arg(long)]
    pub code: bool,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Format to read with when the extension is not registered
    #[arg(long = "as", value_name = "FORMAT")]
    pub data_hint: Option<String>,

    /// Maximum number of table rows to print
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Arguments for project management.
#[derive(Debug, Parser)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub action: ProjectAction,
}

/// Project management actions.
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Register a nickname for a data directory
    Add {
        /// Nickname
        name: String,
        /// Data directory
        path: PathBuf,
        /// Replace an existing nickname
        #[arg(long)]
        force: bool,
    },

    /// List registered projects
    List,

    /// Forget a nickname
    Remove {
        /// Nickname
        name: String,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ls_command() {
        let cli = Cli::parse_from(["trove", "ls", "churn", "raw", "--full"]);
        match cli.command {
            Command::Ls(args) => {
                assert_eq!(args.target.location, "churn");
                assert_eq!(args.target.hints, vec!["raw"]);
                assert!(args.full);
            }
            _ => panic!("Expected Ls command"),
        }
    }

    #[test]
    fn test_show_data_hint() {
        let cli = Cli::parse_from(["trove", "show", "./data", "notes", "--as", "txt", "-f", "json"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        match cli.command {
            Command::Show(args) => assert_eq!(args.data_hint.as_deref(), Some("txt")),
            _ => panic!("Expected Show command"),
        }
    }

    #[test]
    fn test_project_add() {
        let cli = Cli::parse_from(["trove", "project", "add", "churn", "/data/churn"]);
        match cli.command {
            Command::Project(ProjectArgs {
                action: ProjectAction::Add { name, force, .. },
            }) => {
                assert_eq!(name, "churn");
                assert!(!force);
            }
            _ => panic!("Expected Project Add command"),
        }
    }

    #[test]
    fn test_format_conversion() {
        let format: crate::config::OutputFormat = CliFormat::Quiet.into();
        assert_eq!(format, crate::config::OutputFormat::Quiet);
    }
}
