mod cli_app;

use clap::{Parser, Subcommand};
use cli_app::{CliApp, ConfigCmd, LibraryCmd, RunArgs};
use std::{path::PathBuf, process::ExitCode};

#[derive(Debug, Parser)]
#[command(
    name = "macros-nx",
    version,
    about = "Build and run controller macros on a Switch through sys-botbase"
)]
struct Cli {
    /// Config file to use instead of the one in the platform config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a macro and list its steps
    Check {
        /// Macro text file, `-` for stdin
        file: PathBuf,
    },

    /// Print a macro in canonical form
    Fmt {
        /// Macro text file, `-` for stdin
        file: PathBuf,

        /// One comma-separated line instead of one step per line
        #[arg(long)]
        inline: bool,
    },

    /// Send a macro to the console
    Run(RunArgs),

    /// Manage a JSON macro library
    #[command(subcommand)]
    Library(LibraryCmd),

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCmd),
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut app = CliApp::new(cli.config)?;

    match cli.command {
        Commands::Check { file } => app.check(&file),
        Commands::Fmt { file, inline } => app.fmt(&file, inline),
        Commands::Run(args) => app.run_macro(args),
        Commands::Library(cmd) => app.library(cmd),
        Commands::Config(cmd) => app.config(cmd),
    }
}
