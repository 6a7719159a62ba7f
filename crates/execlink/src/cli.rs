//! Clap derive structures for the `execlink` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// execlink -- console for a local script-execution backend
#[derive(Debug, Parser)]
#[command(
    name = "execlink",
    version,
    about = "Drive a local script-execution backend from the command line",
    long_about = "Discovers the backend on a small range of local ports, keeps a\n\
        bearer session between runs, and sends scripts, process attachment,\n\
        device-identity and feature-toggle commands to it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend host (overrides config)
    #[arg(long, short = 'H', global = true)]
    pub host: Option<String>,

    /// First candidate port (overrides config)
    #[arg(long, short = 'p', global = true)]
    pub port: Option<u16>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover the backend and show its reported status
    #[command(alias = "st")]
    Status,

    /// Show the addresses of the discovered backend
    Info,

    /// Sign in and store the session
    Login(LoginArgs),

    /// Create an account and sign in
    Register(RegisterArgs),

    /// Forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Execute a script on the backend
    #[command(alias = "x")]
    Exec(ExecArgs),

    /// Attach the backend to a process
    Inject(InjectArgs),

    /// Replace the device identifier
    SpoofHwid(SpoofArgs),

    /// List and toggle backend features
    #[command(alias = "f")]
    Features(FeaturesArgs),

    /// Stream the console log, rediscovering when the stream drops
    Console(ConsoleArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account name (prompted when omitted)
    pub username: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long, env = "EXECLINK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account name (prompted when omitted)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Email address (prompted when omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Accept the Terms of Service
    #[arg(long)]
    pub accept_tos: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Script source; use `-` to read stdin
    #[arg(conflicts_with = "file")]
    pub script: Option<String>,

    /// Read the script from a file
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InjectArgs {
    /// Target process name
    pub process_name: String,
}

#[derive(Debug, Args)]
pub struct SpoofArgs {
    /// Identifier to apply; the backend generates one when omitted
    #[arg(long)]
    pub hwid: Option<String>,
}

#[derive(Debug, Args)]
pub struct FeaturesArgs {
    #[command(subcommand)]
    pub command: FeaturesCommand,
}

#[derive(Debug, Subcommand)]
pub enum FeaturesCommand {
    /// List features and their state
    #[command(alias = "ls")]
    List,

    /// Enable a feature
    Enable {
        /// Feature name (e.g. anti_debug)
        name: String,
    },

    /// Disable a feature
    Disable {
        /// Feature name (e.g. anti_debug)
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Also write diagnostics to a daily-rolling file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Interactive configuration wizard
    Init,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
