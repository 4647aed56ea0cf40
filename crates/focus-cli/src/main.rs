#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use focus_core::pkg::DependencyType;
use focus_core::Config;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "focus")]
#[command(author, version, about = "Plan focused installs of a single monorepo workspace", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// List workspace packages in the enclosing monorepo
    Workspaces,

    /// Resolve the workspace in the working directory in isolation
    Focus {
        /// Record sibling versions with a `~` prefix
        #[arg(long)]
        tilde: bool,

        /// Record sibling versions without a range prefix
        #[arg(long, short = 'E')]
        exact: bool,

        /// Fold siblings into devDependencies unless declared elsewhere
        #[arg(long, short = 'D', conflicts_with_all = ["optional", "peer"])]
        dev: bool,

        /// Fold siblings into optionalDependencies unless declared elsewhere
        #[arg(long, short = 'O', conflicts_with = "peer")]
        optional: bool,

        /// Fold siblings into peerDependencies unless declared elsewhere
        #[arg(long, short = 'P')]
        peer: bool,

        /// Leave devDependencies out of the install requests
        #[arg(long)]
        production: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let current = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let cwd = match cli.cwd {
        Some(path) => current.join(path),
        None => current,
    };

    let config = Config::new(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Workspaces) => commands::workspaces::run(&config, cli.json),
        Some(Commands::Focus {
            tilde,
            exact,
            dev,
            optional,
            peer,
            production,
        }) => {
            let origin = if dev {
                DependencyType::DevDependencies
            } else if optional {
                DependencyType::OptionalDependencies
            } else if peer {
                DependencyType::PeerDependencies
            } else {
                DependencyType::Dependencies
            };
            let action = commands::focus::FocusAction {
                tilde,
                exact,
                origin,
                production,
            };

            let span = tracing::info_span!("focus", cmd = "focus", cwd = %cwd.display());
            let _guard = span.enter();
            commands::focus::run(&config, action, cli.json)
        }
    }
}
