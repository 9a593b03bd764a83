use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use scoped_router::config::{load_config, ConfigError, RouterConfig};
use scoped_router::observability::logging::init_logging;
use scoped_router::RouteMatch;

#[derive(Parser)]
#[command(name = "routes")]
#[command(about = "Inspect and test router configuration files", long_about = None)]
struct Cli {
    /// Route file (TOML)
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the route file
    Check,
    /// Resolve paths and print the matches as JSON
    Resolve {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            eprintln!("{}: {} error(s)", cli.config.display(), errors.len());
            for err in errors {
                eprintln!("  - {err}");
            }
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("{}: {err}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(&config.logging) {
        eprintln!("logging disabled: {err}");
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &RouterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let tree = config.build_tree()?;

    match command {
        Commands::Check => {
            println!(
                "ok: {} route(s){}",
                tree.len(),
                if tree.not_found().is_some() { ", not_found declared" } else { "" }
            );
        }
        Commands::Resolve { paths } => {
            let matches: Vec<Value> = paths.iter().map(|p| describe(&tree.resolve(p))).collect();
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }
    }
    Ok(())
}

fn describe(m: &RouteMatch) -> Value {
    json!({
        "path": m.path(),
        "source": m.source(),
        "pattern": m.definition().map(|d| d.pattern().as_str()),
        "handler": m.handler(),
        "params": m.params(),
        "prefix": m.prefix(),
        "residual": m.residual(),
        "extra": m.definition().map(|d| d.extra()),
    })
}
