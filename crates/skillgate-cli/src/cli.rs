use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "skillgate")]
#[command(author, version, about = "Select and assemble review skills for source files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Additional skills directory (repeatable)
    #[arg(long = "skills-dir", global = true)]
    pub skills_dirs: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

/// Output format for review results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Composed context text, one section per file
    #[default]
    Text,
    /// Full context and manifest as JSON
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compose the review context for one or more files
    Review {
        /// Files to review
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Maximum size of each composed context
        #[arg(short, long)]
        budget: Option<usize>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List registered skills
    List,

    /// Validate every skill descriptor
    Check,
}
