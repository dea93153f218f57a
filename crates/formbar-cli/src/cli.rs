//! CLI argument definitions for formbar.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use formbar_cli::settings::SETTINGS_FILENAME;

#[derive(Parser)]
#[command(
    name = "formbar",
    version,
    about = "Inspect and simulate conditional forms",
    long_about = "Load form markup, build its dependency index and run the conditional engine.\n\n\
                  `inspect` reports the declared fields, conditionals and malformed declarations.\n\
                  `simulate` applies field values and shows the resulting field states."
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

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

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

    /// Include field values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Settings file.
    #[arg(long = "config", value_name = "PATH", default_value = SETTINGS_FILENAME, global = true)]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// List fields, conditionals and the dependency index of a form.
    Inspect(InspectArgs),

    /// Run the conditional engine over a form with the given values.
    Simulate(SimulateArgs),
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Path to the form markup.
    #[arg(value_name = "FORM")]
    pub form: PathBuf,
}

#[derive(Parser)]
pub struct SimulateArgs {
    /// Path to the form markup.
    #[arg(value_name = "FORM")]
    pub form: PathBuf,

    /// Rule evaluator endpoint (overrides the settings file and the form).
    #[arg(long = "eval-url", value_name = "URL")]
    pub eval_url: Option<String>,

    /// Field value to apply, in order. Checkbox values are comma separated.
    ///
    /// May be given several times: `--set age=17 --set hobbies=chess,go`.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Print the final state as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

/// Parse `name=value`, splitting on the first `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(format!("expected NAME=VALUE, got '{raw}'"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
