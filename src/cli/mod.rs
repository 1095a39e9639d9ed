//! CLI surface: argument definitions, command implementations, and the
//! `--show-output-schema-json` bypass.

pub mod args;
pub mod commands;

pub use args::Cli;

use crate::output::CommandOutput;

/// Which command's output schema was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPath {
    SchemaCheck,
    OperationsCheck,
    AppCreate,
    Config,
}

impl CommandPath {
    pub fn output(self) -> CommandOutput {
        match self {
            Self::SchemaCheck => commands::schema::output(),
            Self::OperationsCheck => commands::operations::output(),
            Self::AppCreate => commands::app::output(),
            Self::Config => commands::config::output(),
        }
    }
}

/// Detect a `--show-output-schema-json` request from raw arguments,
/// before clap sees them. The flag must short-circuit even when the
/// command's required arguments are absent, so this cannot go through
/// normal parsing.
pub fn schema_request(args: &[String]) -> Option<CommandPath> {
    if !args.iter().any(|arg| arg == "--show-output-schema-json") {
        return None;
    }
    let words: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|arg| !arg.starts_with('-'))
        .collect();
    for pair in words.windows(2) {
        match pair {
            ["schema", "check"] => return Some(CommandPath::SchemaCheck),
            ["operations", "check"] => return Some(CommandPath::OperationsCheck),
            ["app", "create"] => return Some(CommandPath::AppCreate),
            _ => {}
        }
    }
    if words.first() == Some(&"config") {
        return Some(CommandPath::Config);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn schema_flag_is_detected_without_required_arguments() {
        // No schema file given; parsing would fail, the bypass must not.
        let request = schema_request(&args(&[
            "schema",
            "check",
            "--show-output-schema-json",
        ]));
        assert_eq!(request, Some(CommandPath::SchemaCheck));
    }

    #[test]
    fn no_flag_means_no_bypass() {
        assert_eq!(
            schema_request(&args(&["schema", "check", "schema.graphql"])),
            None
        );
    }

    #[test]
    fn each_command_resolves_to_its_own_output() {
        assert_eq!(
            schema_request(&args(&["app", "create", "--show-output-schema-json"])),
            Some(CommandPath::AppCreate)
        );
        assert_eq!(
            schema_request(&args(&["operations", "check", "--show-output-schema-json"])),
            Some(CommandPath::OperationsCheck)
        );
        assert_eq!(
            schema_request(&args(&["config", "--show-output-schema-json"])),
            Some(CommandPath::Config)
        );
    }

    #[test]
    fn every_command_output_includes_the_shared_failure_cases() {
        for path in [
            CommandPath::SchemaCheck,
            CommandPath::OperationsCheck,
            CommandPath::AppCreate,
            CommandPath::Config,
        ] {
            let output = path.output();
            assert!(output.case("FailureUserInput").is_ok());
            assert!(output.case("Failure").is_ok());
        }
    }
}
