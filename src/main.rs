use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use llvm_cov_regions::adapters::Adapters;
use llvm_cov_regions::cli::{self, Style};
use llvm_cov_regions::pipeline::Pipeline;
use llvm_cov_regions::settings::{self, SettingsOverrides};

/// Build a CMake coverage target and report the code regions of a source
/// file that no test executes.
#[derive(Parser)]
#[command(name = "llvm-cov-regions", version, about)]
struct Cli {
    /// Workspace root (default: current directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Build tree directory, relative to the root.
    #[arg(long, global = true)]
    build_tree_directory: Option<PathBuf>,

    /// Build command (CMake-compatible).
    #[arg(long, global = true)]
    build_command: Option<String>,

    /// Target producing the coverage report.
    #[arg(long, global = true)]
    build_target: Option<String>,

    /// File name of the coverage report inside the build tree.
    #[arg(long, global = true)]
    report_file_name: Option<String>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the region coverage summary of a source file.
    Summary {
        /// Source file, absolute or relative to the root.
        source_file: PathBuf,

        #[arg(long, value_enum, default_value_t = Style::Text)]
        style: Style,
    },

    /// List the uncovered code regions of a source file.
    Uncovered {
        /// Source file, absolute or relative to the root.
        source_file: PathBuf,

        #[arg(long, value_enum, default_value_t = Style::Text)]
        style: Style,
    },

    /// Summary and uncovered regions together.
    Show {
        /// Source file, absolute or relative to the root.
        source_file: PathBuf,

        #[arg(long, value_enum, default_value_t = Style::Text)]
        style: Style,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<String> {
    let root = match args.root {
        Some(root) => std::path::absolute(&root)
            .with_context(|| format!("Cannot resolve root directory {}", root.display()))?,
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };

    let overrides = SettingsOverrides {
        build_tree_directory: args.build_tree_directory,
        build_command: args.build_command,
        build_target: args.build_target,
        report_file_name: args.report_file_name,
    };
    let settings = settings::load(&root, &overrides)?;
    let pipeline = Pipeline::new(settings, Adapters::os());

    match args.command {
        Commands::Summary { source_file, style } => {
            let source_file = cli::resolve_source_file(&root, &source_file);
            cli::cmd_summary(&pipeline, &source_file, style).await
        }
        Commands::Uncovered { source_file, style } => {
            let source_file = cli::resolve_source_file(&root, &source_file);
            cli::cmd_uncovered(&pipeline, &source_file, style).await
        }
        Commands::Show { source_file, style } => {
            let source_file = cli::resolve_source_file(&root, &source_file);
            cli::cmd_show(&pipeline, &source_file, style).await
        }
    }
}
