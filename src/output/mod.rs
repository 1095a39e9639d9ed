//! Command output: the result envelope protocol and the text builder
//! used to render it.

pub mod envelope;
pub mod texture;

pub use envelope::{
    CaseDefinition, CaseKind, CaseText, CommandOutput, CommandResult, OutputError, OutputMode,
    Rendered, failure, failure_with_text, render, success, success_with_text,
};
pub use texture::{Columns, Texture, bold, bold_quoted_words};
