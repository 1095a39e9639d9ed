//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and all subcommand enums.

use clap::{
    Parser, Subcommand, ValueEnum,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// GraphQL schema registry CLI
#[derive(Parser)]
#[command(
    name = "schemactl",
    version = env!("CARGO_PKG_VERSION"),
    about = "GraphQL schema registry CLI",
    long_about = "Check schema changes, validate operations, and manage app deployments against a schema registry.",
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output the raw JSON result envelope instead of human text
    #[arg(long, global = true)]
    pub json: bool,

    /// Print the command's declared output JSON Schema and exit
    #[arg(long, global = true)]
    pub show_output_schema_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Schema registry operations
    #[command(about = "Check proposed schema changes against the registry")]
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },

    /// Operation document validation
    #[command(about = "Validate GraphQL operation documents")]
    Operations {
        #[command(subcommand)]
        action: OperationsAction,
    },

    /// App deployment management
    #[command(about = "Create app deployments with persisted operations")]
    App {
        #[command(subcommand)]
        action: AppAction,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings as TOML")]
    Config,
}

#[derive(Subcommand)]
pub enum SchemaAction {
    /// Check a proposed schema against the registry
    #[command(
        about = "Compare a schema file against the latest registered version",
        after_help = "Examples:\n  schemactl schema check schema.graphql\n  schemactl schema check schema.graphql --service reviews\n  schemactl schema check schema.graphql --target the-org/shop/production\n  schemactl schema check schema.graphql --github --commit $SHA"
    )]
    Check {
        /// Path to the schema file
        file: PathBuf,

        /// Service name (required for federated/stitched projects)
        #[arg(long)]
        service: Option<String>,

        /// Registry API endpoint (overrides config and environment)
        #[arg(long)]
        registry_endpoint: Option<String>,

        /// Registry access token (overrides config and environment)
        #[arg(long)]
        registry_access_token: Option<String>,

        /// Mark breaking changes as safe
        #[arg(long)]
        force_safe: bool,

        /// Associate the check with a GitHub commit status
        #[arg(long)]
        github: bool,

        /// Author of the change
        #[arg(long)]
        author: Option<String>,

        /// Commit SHA of the change
        #[arg(long)]
        commit: Option<String>,

        /// Target reference: "org/project/target" slug or UUID
        #[arg(long)]
        target: Option<String>,

        /// Shared context id for grouping related checks
        #[arg(long)]
        context_id: Option<String>,

        /// Service URL (federated projects)
        #[arg(long)]
        url: Option<String>,

        /// GitHub repository (owner/name) for the commit status
        #[arg(long)]
        github_repository: Option<String>,

        /// Pull request number for the commit status
        #[arg(long)]
        github_pull_request: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum OperationsAction {
    /// Validate operation documents against the latest valid schema
    #[command(
        about = "Validate GraphQL documents matched by a glob pattern",
        after_help = "Examples:\n  schemactl operations check \"src/**/*.graphql\"\n  schemactl operations check \"queries/*.gql\" --registry-endpoint https://registry.internal/api"
    )]
    Check {
        /// Glob pattern matching operation documents
        pattern: String,

        /// Registry API endpoint (overrides config and environment)
        #[arg(long)]
        registry_endpoint: Option<String>,

        /// Registry access token (overrides config and environment)
        #[arg(long)]
        registry_access_token: Option<String>,
    },
}

/// Persisted-operations manifest format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ManifestFormat {
    /// Free-form hash keys, no verification, no delta upload
    V1,
    /// sha256-verified hash keys with cross-version deduplication
    V2,
}

#[derive(Subcommand)]
pub enum AppAction {
    /// Create an app deployment from a persisted-operations manifest
    #[command(
        about = "Create an app deployment and upload its operation documents",
        after_help = "Examples:\n  schemactl app create manifest.json --name web --version 1.4.0\n  schemactl app create manifest.json --name web --version 1.4.0 --format v2"
    )]
    Create {
        /// Path to the persisted-operations manifest (hash -> document body)
        manifest: PathBuf,

        /// App name
        #[arg(long)]
        name: String,

        /// App version
        #[arg(long)]
        version: String,

        /// Target reference: "org/project/target" slug or UUID
        #[arg(long)]
        target: Option<String>,

        /// Manifest format
        #[arg(long, value_enum, default_value = "v1")]
        format: ManifestFormat,

        /// Registry API endpoint (overrides config and environment)
        #[arg(long)]
        registry_endpoint: Option<String>,

        /// Registry access token (overrides config and environment)
        #[arg(long)]
        registry_access_token: Option<String>,
    },
}
