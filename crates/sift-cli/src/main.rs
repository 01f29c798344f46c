#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, CodedError, OutputMode, render_error, resolve_output_mode};
use sift_core::ErrorCode;
use sift_core::config::{self, EffectiveConfig};
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sift: saved item filters for a work-item tracker",
    long_about = None
)]
struct Cli {
    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Act as this user (overrides SIFT_USER and user config).
    #[arg(long, global = true, value_name = "ID")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a sift project",
        long_about = "Create .sift/ with a config template and a migrated item store.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    sift init\n\n    # Rewrite the config template\n    sift init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Filters",
        about = "Manage saved filters",
        after_help = "EXAMPLES:\n    # Save a filter\n    sift --user alice filter create triage --state open,blocked\n\n    # List favorites\n    sift --user alice filter list --favorites"
    )]
    Filter {
        #[command(subcommand)]
        command: cmd::filter::FilterCommand,
    },

    #[command(
        next_help_heading = "Read",
        about = "List items matching a saved filter",
        long_about = "Run a saved filter for the requesting user with paging and ordering.",
        after_help = "EXAMPLES:\n    # First page of a filter\n    sift items triage\n\n    # Second page, oldest first\n    sift items triage --offset 50 --direction ascending\n\n    # Only the project being browsed\n    sift items triage --in-project p1"
    )]
    Items(cmd::items::ItemsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Count items matching a saved filter",
        after_help = "EXAMPLES:\n    sift count triage\n    sift count triage --json"
    )]
    Count(cmd::items::CountArgs),

    #[command(
        next_help_heading = "Read",
        about = "Run an unsaved filter",
        long_about = "Compile criteria into a one-off filter and list matching items.\n\
                      Without a user only public projects are searched.",
        after_help = "EXAMPLES:\n    # Public open bugs\n    sift query --state open --type Bug\n\n    # Everything alice can see except closed items\n    sift --user alice query --state closed --not-state"
    )]
    Query(cmd::items::QueryArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    sift completions bash > /etc/bash_completion.d/sift"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SIFT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "sift=debug,info"
        } else {
            "sift=info,warn"
        })
    });

    let format = env::var("SIFT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn dispatch(
    command: Commands,
    config: &EffectiveConfig,
    output: OutputMode,
    project_root: &std::path::Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => cmd::init::run_init(&args, output, project_root),
        Commands::Filter { command } => {
            cmd::filter::run_filter(&command, config, output, project_root)
        }
        Commands::Items(args) => cmd::items::run_items(&args, config, output, project_root),
        Commands::Count(args) => cmd::items::run_count(&args, config, output, project_root),
        Commands::Query(args) => cmd::items::run_query(&args, config, output, project_root),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let project_root = env::current_dir()?;

    let config = match config::resolve_config(&project_root, cli.json, cli.user.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let coded = CodedError::new(ErrorCode::ConfigParseError, format!("{err:#}"));
            let mode = resolve_output_mode(cli.format, if cli.json { "json" } else { "text" });
            render_error(mode, &CliError::from_anyhow(&anyhow::Error::from(coded)))?;
            std::process::exit(1);
        }
    };
    let output = resolve_output_mode(cli.format, &config.resolved_output);
    tracing::debug!(requester = ?config.requester, ?output, "resolved config");

    if let Err(err) = dispatch(cli.command, &config, output, &project_root) {
        render_error(output, &CliError::from_anyhow(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
