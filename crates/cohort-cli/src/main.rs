//! Cohort consolidation CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};

use cohort_cli::commands::{LoadRequest, run_load, run_modalities};
use cohort_cli::logging::{LogConfig, LogFormat, init_logging};
use cohort_cli::summary::print_summary;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Load(args) => {
            let request = LoadRequest {
                data_dir: args.data_dir,
                modalities: args.modalities,
                merge: args.merge,
                output: args.output,
                config: args.config,
                include_sources: args.include_sources,
                exclude_sources: args.exclude_sources,
                clean: !args.no_clean,
                progress: io::stderr().is_terminal(),
            };
            match run_load(&request) {
                Ok(result) => {
                    print_summary(&result);
                    0
                }
                Err(error) => {
                    eprintln!("error: {error:#}");
                    1
                }
            }
        }
        Command::Modalities => match run_modalities() {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !cli.verbosity.is_present();
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
