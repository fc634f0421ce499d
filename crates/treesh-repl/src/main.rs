//! treesh CLI entry point.
//!
//! Usage:
//!   treesh                          # Interactive loop over an empty tree
//!   treesh --tree tree.json         # Load the remote tree from a snapshot
//!   treesh --config treesh.toml     # Use a specific config file
//!   treesh -c <command>             # Execute command and exit

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use treesh_kernel::ShellConfig;
use treesh_repl::{LineResult, Repl, load_tree, print_output};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    tree: Option<PathBuf>,
    command: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--version" | "-V" => {
                println!("treesh {}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--tree" => {
                let path = args.next().context("--tree requires a path")?;
                parsed.tree = Some(PathBuf::from(path));
            }
            "-c" => {
                parsed.command = Some(args.next().context("-c requires a command argument")?);
            }
            unknown => bail!("Unknown option: {unknown}\nRun 'treesh --help' for usage."),
        }
    }
    Ok(Some(parsed))
}

fn run() -> Result<ExitCode> {
    let Some(args) = parse_args(env::args().skip(1))? else {
        return Ok(ExitCode::SUCCESS);
    };

    let config = match &args.config {
        Some(path) => ShellConfig::load_from(path)?,
        None => ShellConfig::load()?,
    };
    let store = load_tree(args.tree.as_deref())?;
    let mut repl = Repl::new(&config, Arc::new(store))?;

    match args.command {
        Some(cmd) => match repl.process_line(&cmd) {
            LineResult::Output(output) => {
                let code = print_output(&output);
                Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
            }
            LineResult::Exit => Ok(ExitCode::SUCCESS),
        },
        None => {
            treesh_repl::run(repl)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_help() {
    println!(
        r#"treesh v{}

Usage:
  treesh [OPTIONS]

Options:
  --config <path>              Config file (default: ~/.config/treesh/config.toml)
  --tree <path>                JSON snapshot of the remote tree
  -c <command>                 Execute command string and exit
  -h, --help                   Show this help
  -V, --version                Show version

Builtins:
  cd [dir|-]                   Change directory
  pwd [-L|-P]                  Print working directory
  ls [-d] [-r] [-S|-t|-o] ...  List directories
  mode [logical|physical]      Show or set the addressing mode
  invalidate [path]            Drop cached listings
"#,
        env!("CARGO_PKG_VERSION")
    );
}
