#![forbid(unsafe_code)]

mod cmd;
mod output;
mod owner;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use cmd::CmdContext;
use output::OutputMode;
use std::env;
use topeleven_core::config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "t11: Top-11 ranked lists with cross-category references",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Act as this owner (overrides T11_OWNER and the user config).
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a topeleven project",
        long_about = "Create .topeleven/ with a default config and a migrated store in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    t11 init\n\n    # Rewrite the default config\n    t11 init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Manage main and sub categories"
    )]
    Category {
        #[command(subcommand)]
        command: cmd::category::CategoryCommand,
    },

    #[command(next_help_heading = "Catalog", about = "Manage ranked items")]
    Item {
        #[command(subcommand)]
        command: cmd::item::ItemCommand,
    },

    #[command(
        next_help_heading = "Catalog",
        about = "Manage references into main categories"
    )]
    Ref {
        #[command(subcommand)]
        command: cmd::reference::RefCommand,
    },

    #[command(
        next_help_heading = "Ranking",
        about = "Move an entry to a new slot",
        long_about = "Move an item or reference to a slot of its list. An entry already at that slot \
                      takes the mover's old slot.",
        after_help = "EXAMPLES:\n    # Item 7 to slot 1\n    t11 move item 7 1\n\n    # Reference 3 to slot 4\n    t11 move ref 3 4"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Ranking",
        about = "Show a list in rank order",
        after_help = "EXAMPLES:\n    t11 show --sub 2\n    t11 show --main 1 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Ranking",
        about = "Report the next free slot of a list",
        after_help = "EXAMPLES:\n    t11 alloc --main 1"
    )]
    Alloc(cmd::alloc::AllocArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Repair drift in the store",
        long_about = "Run the repair passes: orphan items, dangling references, out-of-range \
                      positions, duplicate positions, and empty categories.",
        after_help = "EXAMPLES:\n    t11 reconcile\n\n    # Keep empty categories\n    t11 reconcile --no-prune"
    )]
    Reconcile(cmd::reconcile::ReconcileArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    t11 completions zsh > ~/.zfunc/_t11"
    )]
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("T11_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "topeleven=debug,info"
        } else if verbose {
            "topeleven=info,warn"
        } else {
            "topeleven=warn,warn"
        })
    });

    let format = env::var("T11_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays parseable in every output mode.
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

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let user_output = config::load_user_config()
        .ok()
        .and_then(|user| user.output);
    let ctx = CmdContext {
        project_root: &project_root,
        output: output::resolve_output_mode(cli.format, cli.json, user_output.as_deref()),
        owner_flag: cli.owner.as_deref(),
    };

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx),
        Commands::Category { command } => cmd::category::run_category(command, &ctx),
        Commands::Item { command } => cmd::item::run_item(command, &ctx),
        Commands::Ref { command } => cmd::reference::run_ref(command, &ctx),
        Commands::Move(args) => cmd::move_cmd::run_move(args, &ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx),
        Commands::Alloc(args) => cmd::alloc::run_alloc(args, &ctx),
        Commands::Reconcile(args) => cmd::reconcile::run_reconcile(args, &ctx),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "t11", &mut std::io::stdout());
            Ok(())
        }
    }
}
