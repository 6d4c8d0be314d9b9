//! adaptest CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Adaptive exam engine with proctoring replay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated adaptive exam session
    Run {
        /// Path to a .toml item pool
        #[arg(long)]
        pool: PathBuf,

        /// Simulated student ability in [0,1]
        #[arg(long, default_value = "0.65")]
        ability: f64,

        /// Question cap (defaults to the pool's setting)
        #[arg(long)]
        max_questions: Option<u32>,

        /// Frame script to replay through the integrity monitor
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate item pool TOML files
    Validate {
        /// Path to a pool file or directory
        #[arg(long)]
        pool: PathBuf,
    },

    /// Render a saved attempt report
    Report {
        /// Attempt report JSON
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Where to write HTML output (defaults next to the JSON)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create starter config, example pool, and frame script
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            pool,
            ability,
            max_questions,
            frames,
            output,
            format,
            config,
        } => {
            commands::run::execute(pool, ability, max_questions, frames, output, format, config)
                .await
        }
        Commands::Validate { pool } => commands::validate::execute(pool),
        Commands::Report {
            report,
            format,
            output,
        } => commands::report::execute(report, format, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
