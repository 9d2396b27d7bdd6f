//! CLI argument definitions
//!
//! All Clap derive structs for `configmgr` command-line parsing.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::export::ExportFormat;
use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Layered configuration manager with JSON Schema validation.
#[derive(Parser, Debug)]
#[command(name = "configmgr", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CONFIGMGR_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "CONFIGMGR_LOG_FORMAT"
    )]
    pub log_format: LogFormatArg,

    /// Print Prometheus metrics to stderr on exit.
    #[arg(long, global = true)]
    pub metrics: bool,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, merge, and validate a configuration.
    Validate(ValidateArgs),

    /// Print one value from a validated configuration.
    Extract(ExtractArgs),

    /// Print a validated configuration as YAML or JSON.
    Export(ExportArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Configuration Commands
// ============================================================================

/// Schema and source locations shared by every configuration command.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Colon-separated schema files; the first is the root schema.
    #[arg(short, long, env = "CONFIGMGR_SCHEMAS")]
    pub schemas: String,

    /// Colon-separated sources: `FILE(path)`, `DIR(path)`, or a bare path.
    /// Later sources override earlier ones.
    #[arg(short = 'p', long, env = "CONFIGMGR_CONFIG_PATH")]
    pub config_path: String,

    /// Name to register the configuration under.
    #[arg(long, default_value = "cfg")]
    pub name: String,

    /// Concatenate arrays instead of replacing them when merging.
    #[arg(long)]
    pub concat_arrays: bool,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema and source locations.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `extract`.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Schema and source locations.
    #[command(flatten)]
    pub source: SourceArgs,

    /// JSON pointer (`/zowe/setup`) or dotted path (`zowe.setup`).
    pub path: String,
}

/// Arguments for `export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Schema and source locations.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format.
    #[arg(short, long, default_value = "yaml")]
    pub format: ExportFormatArg,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for reports and version info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable lines.
    #[default]
    Human,
    /// Newline-delimited JSON.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Human => Self::Human,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Serialization format for `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormatArg {
    /// Block-style YAML.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Yaml => Self::Yaml,
            ExportFormatArg::Json => Self::Json,
        }
    }
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
