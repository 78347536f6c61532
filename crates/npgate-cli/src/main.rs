mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    audit::AuditArgs, config::ConfigSubcommand, taxonomy::TaxonomySubcommand, Invocation,
    EXIT_INVALID_INPUT,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "npgate",
    about = "Taxonomy-gated validation for Nowpattern articles: publication gate and corpus audit",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .npgate/ or .git/)
    #[arg(long, global = true, env = "NPGATE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Taxonomy file (overrides the path in .npgate/config.yaml)
    #[arg(long, global = true)]
    taxonomy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize .npgate/ in the current project
    Init {
        /// Project name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Validate a draft without publishing it
    Check {
        /// Draft file (.yaml or .json)
        document: PathBuf,
        /// Treat warnings as violations
        #[arg(long)]
        strict: bool,
    },

    /// Run the publication gate: publish on pass, keep as draft otherwise
    Publish {
        /// Draft file (.yaml or .json)
        document: PathBuf,
        /// Treat warnings as violations
        #[arg(long)]
        strict: bool,
    },

    /// Audit already-published articles (advisory, never blocks)
    Audit(AuditArgs),

    /// Inspect the taxonomy
    Taxonomy {
        #[command(subcommand)]
        subcommand: TaxonomySubcommand,
    },

    /// Show or validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Invocation {
        root: root::resolve_root(cli.root.as_deref()),
        taxonomy: cli.taxonomy,
        json: cli.json,
    };

    // Gate commands report invalid input with a distinct exit status so
    // callers can tell "rejected" from "could not evaluate".
    let (result, error_status) = match cli.command {
        Commands::Init { name } => (cmd::init::run(&ctx.root, name.as_deref()).map(|()| 0), 1),
        Commands::Check { document, strict } => {
            (cmd::check::run(&ctx, &document, strict), EXIT_INVALID_INPUT)
        }
        Commands::Publish { document, strict } => {
            (cmd::publish::run(&ctx, &document, strict), EXIT_INVALID_INPUT)
        }
        Commands::Audit(args) => (cmd::audit::run(&ctx, args).map(|()| 0), 1),
        Commands::Taxonomy { subcommand } => {
            (cmd::taxonomy::run(&ctx, subcommand).map(|()| 0), 1)
        }
        Commands::Config { subcommand } => (cmd::config::run(&ctx, subcommand).map(|()| 0), 1),
    };

    match result {
        Ok(0) => {}
        Ok(status) => std::process::exit(status),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(error_status);
        }
    }
}
