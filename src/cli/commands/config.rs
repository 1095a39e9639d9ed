//! `schemactl config` — display the active, fully layered settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::error::{CliError, base_failure_cases};
use crate::output::{CaseText, CommandOutput, CommandResult, Texture, success_with_text};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ConfigOutput {
    /// Active settings rendered as TOML.
    pub settings: String,
}

fn config_text(_t: &mut Texture, data: &Value) -> CaseText {
    let rendered = data
        .get("settings")
        .and_then(Value::as_str)
        .unwrap_or_default();
    CaseText::Literal(rendered.to_string())
}

pub fn output() -> CommandOutput {
    let mut cases = vec![success_with_text::<ConfigOutput>(
        "SuccessConfigOutput",
        config_text,
    )];
    cases.extend(base_failure_cases());
    CommandOutput::new(cases)
}

pub fn run(settings: &Settings) -> Result<CommandResult, CliError> {
    let rendered = toml::to_string_pretty(settings).map_err(|error| CliError::Api {
        message: format!("failed to render settings: {error}"),
        reference: None,
    })?;
    Ok(CommandResult::new(
        "SuccessConfigOutput",
        ConfigOutput { settings: rendered },
    ))
}
