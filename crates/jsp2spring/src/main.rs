//! jsp2spring - migrate JSP/Servlet web applications to Spring Boot + Thymeleaf
//!
//! Commands:
//! - `analyze`: scan, classify and plan without writing anything
//! - `convert`: run the full conversion into a target directory
//! - `tool`: run one storage tool (list_dir, read_file, write_file)
//! - `config`: show the resolved configuration and paths

use clap::{Parser, Subcommand};
use jsp2spring_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "jsp2spring", version, about = "Convert JSP/Servlet applications to Spring Boot + Thymeleaf")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./jsp2spring.toml when present)
    #[arg(long, global = true, env = "JSP2SPRING_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a source tree and show the conversion plan (writes nothing)
    Analyze {
        /// Root of the legacy application
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a source tree into a Spring Boot project
    Convert {
        /// Root of the legacy application
        source: PathBuf,

        /// Directory to write the converted project into
        target: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Run every task but do not write to the target
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a storage tool
    Tool {
        /// Tool name (list_dir, read_file, write_file)
        name: Option<String>,

        /// Path the tool operates on
        path: Option<PathBuf>,

        /// Text to write (write_file)
        #[arg(long)]
        content: Option<String>,

        /// List available tools
        #[arg(long)]
        list: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Analyze { json, .. }
        | Commands::Convert { json, .. }
        | Commands::Tool { json, .. }
        | Commands::Config { json } => *json,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    let _log_guard = init_logging(LogConfig {
        app_name: "jsp2spring",
        verbose: cli.verbose,
    });
    debug!(version = env!("CARGO_PKG_VERSION"), command = ?cli.command, "Starting jsp2spring");

    match run_command(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{}", cli::error::render_error(&err));
            }
            ExitCode::from(1)
        }
    }
}

/// Run the selected command; `Ok(false)` means it ran but some work failed
fn run_command(cli: Cli) -> anyhow::Result<bool> {
    let config_path = cli.config;
    match cli.command {
        Commands::Analyze { path, json } => {
            cli::analyze::run(cli::analyze::AnalyzeArgs {
                path,
                json,
                config: config_path,
            })?;
            Ok(true)
        }
        Commands::Convert {
            source,
            target,
            json,
            dry_run,
        } => cli::convert::run(cli::convert::ConvertArgs {
            source,
            target,
            json,
            dry_run,
            config: config_path,
        }),
        Commands::Tool {
            name,
            path,
            content,
            list,
            json,
        } => {
            cli::tool::run(cli::tool::ToolArgs {
                name,
                path,
                content,
                list,
                json,
            })?;
            Ok(true)
        }
        Commands::Config { json } => {
            cli::config::run(cli::config::ConfigArgs {
                json,
                config: config_path,
            })?;
            Ok(true)
        }
    }
}
