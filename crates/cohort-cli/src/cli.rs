//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cohort",
    version,
    about = "Consolidate longitudinal study CSV extracts into unified per-visit tables",
    long_about = "Consolidate the per-modality CSV extracts of a longitudinal \
                  clinical study into one table per modality, unique per \
                  patient and visit.\n\n\
                  Conflicting values from different extracts are preserved \
                  pipe-separated rather than silently dropped."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a study folder and consolidate its modalities.
    Load(LoadArgs),

    /// List supported modalities and their recognized file prefixes.
    Modalities,
}

#[derive(Parser)]
pub struct LoadArgs {
    /// Path to the study data folder.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Modalities to load (default: all).
    #[arg(long = "modalities", value_name = "NAME", num_args = 1..)]
    pub modalities: Vec<String>,

    /// Merge all modalities into a single visit-level table.
    #[arg(long = "merge")]
    pub merge: bool,

    /// Output path: the merged CSV file with --merge, otherwise a directory
    /// for per-modality CSV files.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Study layout configuration file (JSON). Defaults to the built-in
    /// reference layout.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Biospecimen sources to load exclusively.
    #[arg(long = "include-source", value_name = "NAME")]
    pub include_sources: Vec<String>,

    /// Biospecimen sources to skip.
    #[arg(long = "exclude-source", value_name = "NAME")]
    pub exclude_sources: Vec<String>,

    /// Skip value-level cleaning transforms.
    #[arg(long = "no-clean")]
    pub no_clean: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
