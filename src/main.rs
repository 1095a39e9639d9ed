//! Binary entry point.
//!
//! Flow: detect the `--show-output-schema-json` bypass before clap runs,
//! otherwise parse arguments, load layered settings, initialize logging,
//! dispatch to the command, funnel anticipated failures into the shared
//! envelope, render, and exit with the envelope's code.

use std::process::ExitCode;

use clap::Parser;

use schemactl::cli::args::{Cli, Commands};
use schemactl::cli::{commands, schema_request};
use schemactl::config::Settings;
use schemactl::error::CliError;
use schemactl::output::{CommandOutput, CommandResult, OutputMode, render};

#[tokio::main]
async fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    // The schema bypass runs before any parsing or business logic.
    if let Some(path) = schema_request(&raw_args) {
        let schema = path.output().schema_json();
        println!(
            "{}",
            serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::from("{}"))
        );
        return ExitCode::SUCCESS;
    }

    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("Failed to load configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    schemactl::logging::init_with_config(&settings.logging);

    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let (output, outcome): (CommandOutput, Result<CommandResult, CliError>) = match cli.command {
        Commands::Schema { action } => (
            commands::schema::output(),
            commands::schema::run(action, &settings).await,
        ),
        Commands::Operations { action } => (
            commands::operations::output(),
            commands::operations::run(action, &settings).await,
        ),
        Commands::App { action } => (
            commands::app::output(),
            commands::app::run(action, &settings).await,
        ),
        Commands::Config => (commands::config::output(), commands::config::run(&settings)),
    };

    // Anticipated failures become failure envelopes so JSON mode stays
    // well-formed. Rendering errors are wiring defects and crash loudly.
    let result = outcome.unwrap_or_else(CliError::into_result);
    let rendered = match render(&output, &result, mode) {
        Ok(rendered) => rendered,
        Err(defect) => panic!("output case wiring defect: {defect}"),
    };

    if !rendered.text.is_empty() {
        println!("{}", rendered.text);
    }

    ExitCode::from(rendered.exit_code.clamp(0, u8::MAX as i32) as u8)
}
