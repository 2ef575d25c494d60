//! Clap derive structures for the `servdesk` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// servdesk -- back-office administration for the service catalog
#[derive(Debug, Parser)]
#[command(
    name = "servdesk",
    version,
    about = "Manage services, service areas, and transactions from the command line",
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
    /// API base URL (overrides the config file)
    #[arg(long, alias = "config-url", env = "SERVDESK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token for the API
    #[arg(long, env = "SERVDESK_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SERVDESK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Color when stderr/stdout is a terminal
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    Asc,
    Desc,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the service catalog
    #[command(alias = "svc")]
    Services(ServicesArgs),

    /// Manage service areas
    #[command(alias = "area")]
    Areas(AreasArgs),

    /// Browse payment transactions
    #[command(alias = "tx")]
    Transactions(TransactionsArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

/// Search, status, sort, and paging flags shared by every list command.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Status filter ("all" to clear)
    #[arg(long)]
    pub status: Option<String>,

    /// Sort field
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort direction
    #[arg(long)]
    pub order: Option<Direction>,

    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Rows per page
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,
}

// ── Services ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServicesArgs {
    #[command(subcommand)]
    pub command: ServicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServicesCommand {
    /// List services
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Category name
        #[arg(long)]
        category: Option<String>,
    },

    /// Flip a service between active and inactive
    Toggle {
        /// Service id
        id: String,
    },

    /// Delete a service
    #[command(alias = "rm")]
    Delete {
        /// Service id
        id: String,
    },
}

// ── Service areas ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AreasArgs {
    #[command(subcommand)]
    pub command: AreasCommand,
}

#[derive(Debug, Subcommand)]
pub enum AreasCommand {
    /// List service areas
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Flip a service area between active and inactive
    Toggle {
        /// Service area id
        id: String,
    },

    /// Delete a service area
    #[command(alias = "rm")]
    Delete {
        /// Service area id
        id: String,
    },
}

// ── Transactions ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TransactionsArgs {
    #[command(subcommand)]
    pub command: TransactionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TransactionsCommand {
    /// List transactions (paginated by the server)
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Payment method (e.g. upi, card)
        #[arg(long)]
        payment_method: Option<String>,

        /// Start from a URL query string, e.g. "?status=refunded&page=2".
        /// Explicit flags are applied on top.
        #[arg(long)]
        query: Option<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
