mod cmd_build;
mod cmd_deps;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "xtask")]
#[command(about = "Build the AssemblyScript modules and splice in the keccak WAT fragment")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    opts: BuildArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build every configured target (evm, then token).
    Build,
    /// Build the general-purpose EVM module.
    Evm,
    /// Build the token module.
    Token,
    /// Re-run only the splice stage on an existing compiler .wat.
    Splice {
        /// Target name (see `cargo xtask targets`).
        target: String,
    },
    /// List configured targets and their artifact paths.
    Targets,
    /// Report which external tools are on PATH.
    Deps,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Insertion {
    /// Two lines from the end (before binaryen's closing paren).
    Fixed,
    /// Before the last line that is exactly `)`.
    ClosingDelimiter,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct BuildArgs {
    /// Project root (contains `assembly/`); defaults to the current directory.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// JSON build config; relative paths inside it are resolved against the root.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory, relative to the root (default: build).
    #[arg(long, global = true)]
    build_dir: Option<PathBuf>,

    /// WAT fragment to splice in (default: assembly/src/ethash_keccak_funcs.wat).
    #[arg(long, global = true)]
    fragment: Option<PathBuf>,

    /// Fail instead of warning when the placeholder import is not found.
    #[arg(long, global = true)]
    strict_import: bool,

    /// Where to insert the fragment.
    #[arg(long, global = true, value_enum)]
    insertion: Option<Insertion>,

    /// Drop the `name` section from the merged binary.
    #[arg(long, global = true)]
    no_debug_names: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build => cmd_build::build_all(&cli.opts),
        Command::Evm => cmd_build::build_one(&cli.opts, "evm"),
        Command::Token => cmd_build::build_one(&cli.opts, "token"),
        Command::Splice { target } => cmd_build::splice(&cli.opts, &target),
        Command::Targets => cmd_build::list_targets(&cli.opts),
        Command::Deps => {
            cmd_deps::cmd();
            Ok(())
        }
    }
}
