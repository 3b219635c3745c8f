//! CLI argument parsing for steptimer

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Row order of the event table
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Alphabetical by label (default)
    Label,
    /// Largest total time first
    Total,
    /// Most events first
    Count,
    /// Largest average duration first
    Average,
}

#[derive(Parser, Debug)]
#[command(name = "steptimer")]
#[command(version)]
#[command(about = "Inspect timer summaries exported by steptimer", long_about = None)]
pub struct Cli {
    /// Exported summary files (JSON)
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Row order of the event table
    #[arg(long = "sort", value_enum, default_value = "label")]
    pub sort: SortKey,

    /// Print the parsed exports as pretty JSON instead of tables
    #[arg(long = "json")]
    pub json: bool,

    /// Enable debug tracing output on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
