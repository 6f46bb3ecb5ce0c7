//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reqsift - Pull requirement sections out of specification documents.
#[derive(Debug, Parser)]
#[command(name = "reqsift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "REQSIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log pipeline details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (titles only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract every requirement with the generation service
    Extract(ExtractArgs),

    /// Extract only the named requirements with the generation service
    Named(NamedArgs),

    /// List table of contents entries with the generation service
    Catalog(CatalogArgs),

    /// Find named requirements from layout cues, without the service
    Locate(LocateArgs),

    /// Parse a table of contents into requirement names, without the service
    Toc(TocArgs),

    /// Resume a saved session to find requirements it missed
    Rematch(RematchArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Document (.txt or .json)
    pub file: PathBuf,

    /// Keep only chapters starting with this prefix (repeatable)
    #[arg(short, long = "prefix")]
    pub prefixes: Vec<String>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,

    /// Save the result as a session for a later rematch
    #[arg(long)]
    pub save_session: bool,
}

/// Arguments for the named command.
#[derive(Debug, Parser)]
pub struct NamedArgs {
    /// Document (.txt or .json)
    pub file: PathBuf,

    /// Requirement name (repeatable)
    #[arg(short, long = "name", required_unless_present = "names_file")]
    pub names: Vec<String>,

    /// File with one requirement name per line
    #[arg(long)]
    pub names_file: Option<PathBuf>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Arguments for the catalog command.
#[derive(Debug, Parser)]
pub struct CatalogArgs {
    /// Document (.txt or .json)
    pub file: PathBuf,

    /// Minimum section depth to keep
    #[arg(short, long)]
    pub level: Option<usize>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Arguments for the locate command.
#[derive(Debug, Parser)]
pub struct LocateArgs {
    /// Document (.txt or .json)
    pub file: PathBuf,

    /// Requirement name (repeatable)
    #[arg(short, long = "name")]
    pub names: Vec<String>,

    /// Take the names from a table of contents document
    #[arg(long)]
    pub toc: Option<PathBuf>,

    /// Accept short or loosely structured requirements
    #[arg(long)]
    pub permissive: bool,
}

/// Arguments for the toc command.
#[derive(Debug, Parser)]
pub struct TocArgs {
    /// Table of contents document (.txt or .json)
    pub file: PathBuf,
}

/// Arguments for the rematch command.
#[derive(Debug, Parser)]
pub struct RematchArgs {
    /// Document (.txt or .json); defaults to the session's file
    pub file: Option<PathBuf>,

    /// Session id printed by `extract --save-session`
    #[arg(short, long)]
    pub session: String,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
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
    use crate::config::OutputFormat;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from([
            "reqsift",
            "extract",
            "spec.txt",
            "--prefix",
            "3.1.",
            "--prefix",
            "3.2.",
            "--save-session",
        ]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.file, PathBuf::from("spec.txt"));
                assert_eq!(args.prefixes, vec!["3.1.", "3.2."]);
                assert!(args.save_session);
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["reqsift", "toc", "toc.txt", "--format", "json", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
    }

    #[test]
    fn test_named_requires_a_name() {
        assert!(Cli::try_parse_from(["reqsift", "named", "spec.txt"]).is_err());
        let cli = Cli::try_parse_from(["reqsift", "named", "spec.txt", "-n", "3.2.1 登录"]).unwrap();
        assert!(matches!(cli.command, Command::Named(_)));
    }

    #[test]
    fn test_rematch_requires_session() {
        assert!(Cli::try_parse_from(["reqsift", "rematch", "spec.txt"]).is_err());
    }

    #[test]
    fn test_format_conversion() {
        let format: OutputFormat = CliFormat::Quiet.into();
        assert_eq!(format, OutputFormat::Quiet);
    }
}
