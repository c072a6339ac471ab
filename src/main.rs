//! tgx - lower task-graph kinds into executable task definitions.
//!
//! Usage:
//!   tgx lower <kind-dir>      Print the kind's tasks after every transform
//!   tgx validate <kind-dir>   Check that the kind loads and lowers cleanly
//!   tgx list <kind-dir>       List the kind's transforms and tasks

mod cli_config;

use clap::{Parser, Subcommand};
use cli_config::{Config, OutputFormat, parse_param};
use std::path::PathBuf;
use taskgraph_transforms::{Kind, Task};
use tracing::{error, info};

/// tgx - lower task-graph kinds into executable task definitions
#[derive(Parser)]
#[command(name = "tgx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (overrides XDG default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the kind's tasks after every transform has run
    Lower {
        /// Path to the kind directory containing kind.yml
        #[arg(value_name = "KIND_DIR")]
        kind_dir: PathBuf,

        /// Output format (overrides config file, default: yaml)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Transform parameter, may be repeated (overrides config file)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Check that the kind loads and all of its tasks lower cleanly
    Validate {
        /// Path to the kind directory containing kind.yml
        #[arg(value_name = "KIND_DIR")]
        kind_dir: PathBuf,
    },

    /// List the kind's transforms and tasks
    List {
        /// Path to the kind directory containing kind.yml
        #[arg(value_name = "KIND_DIR")]
        kind_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration from file (explicit or XDG default)
    let file_config = match Config::load(cli.config.clone()) {
        Ok(config) => {
            if let Some(path) = &cli.config {
                info!("Loaded configuration from: {}", path.display());
            } else if let Some(default_path) = Config::default_config_path()
                && default_path.exists()
            {
                info!("Loaded configuration from: {}", default_path.display());
            }
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Lower {
            kind_dir,
            format,
            params,
        } => {
            let format = format.unwrap_or(file_config.output.format);
            let params = file_config.merged_params(params);
            lower_kind(kind_dir, format, params)?;
        }
        Commands::Validate { kind_dir } => {
            validate_kind(kind_dir, &file_config)?;
        }
        Commands::List { kind_dir } => {
            list_kind(kind_dir)?;
        }
    }

    Ok(())
}

/// Lower a kind and print the resulting tasks.
fn lower_kind(
    kind_dir: PathBuf,
    format: OutputFormat,
    params: std::collections::HashMap<String, String>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading kind from: {}", kind_dir.display());

    let kind = Kind::load(&kind_dir)?;
    let tasks = match kind.lower(params) {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("Lowering failed: {}", e);
            return Err(e.into());
        }
    };

    print!("{}", render(&tasks, format)?);
    Ok(())
}

fn render(tasks: &[Task], format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(tasks)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(tasks)? + "\n"),
    }
}

/// Load and lower a kind without printing its tasks.
fn validate_kind(kind_dir: PathBuf, file_config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Validating kind in: {}", kind_dir.display());

    let result = Kind::load(&kind_dir)
        .map_err(Box::<dyn std::error::Error>::from)
        .and_then(|kind| {
            let tasks = kind.lower(file_config.params.clone())?;
            Ok((kind, tasks))
        });

    match result {
        Ok((kind, tasks)) => {
            info!("Kind '{}' is valid: {} task(s)", kind.name(), tasks.len());
            for task in &tasks {
                info!("  - {}: OK", task.label());
            }
            Ok(())
        }
        Err(e) => {
            error!("Validation failed: {}", e);
            Err(e)
        }
    }
}

/// List the kind's transforms and tasks.
fn list_kind(kind_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let kind = Kind::load(&kind_dir)?;

    println!("Kind: {}", kind.name());
    println!("  Path: {}", kind.path().display());

    let config = kind.config();
    if !config.kind_dependencies.is_empty() {
        println!("  Depends on: {}", config.kind_dependencies.join(", "));
    }

    if config.transforms.is_empty() {
        println!("  Transforms: none");
    } else {
        println!("  Transforms:");
        for transform in &config.transforms {
            println!("    - {}", transform);
        }
    }

    let names: Vec<&str> = kind.task_names().collect();
    println!("  Tasks: {}", names.len());
    for name in names {
        println!("    - {}", name);
    }

    Ok(())
}
