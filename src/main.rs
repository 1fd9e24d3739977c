use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use forage_scout::batch::CancelToken;
use forage_scout::config::{self, Settings};
use forage_scout::output;
use forage_scout::track::TrackScanner;

// Per-track failures never change the exit code
const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_REPORT: i32 = 5;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
enum Format {
    /// Aligned rows, colored on a terminal
    #[default]
    Table,
    /// Tab-separated, for scripting
    Tsv,
    /// The full batch record
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a track file, or every track file in a directory
    Classify {
        /// A .gpx/.json file or a directory of them
        path: PathBuf,

        /// Descend into subdirectories (overrides scan.recursive)
        #[arg(short, long)]
        recursive: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Also write the JSON batch record to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default configuration as YAML
    Defaults {
        /// Write it to this file instead of stdout
        #[arg(long)]
        write: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, requires = "write")]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "forage-scout")]
#[command(about = "Tell foraging walks from hikes by their GPS tracks", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging and per-track detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/forage-scout/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Defaults { write, force } => print_defaults(write, force),
        Commands::Classify {
            path,
            recursive,
            format,
            output,
        } => classify(cli.config, cli.verbose, path, recursive, format, output),
    };

    std::process::exit(code);
}

fn print_defaults(write: Option<PathBuf>, force: bool) -> i32 {
    match write {
        Some(path) => match config::write_default_config(&path, force) {
            Ok(()) => {
                println!("Config written to {}", path.display());
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                EXIT_CONFIG
            }
        },
        None => match config::default_config_yaml() {
            Ok(yaml) => {
                print!("{}", yaml);
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                EXIT_CONFIG
            }
        },
    }
}

fn classify(
    config_path: Option<PathBuf>,
    verbose: bool,
    path: PathBuf,
    recursive: bool,
    format: Format,
    report_path: Option<PathBuf>,
) -> i32 {
    let start_time = Instant::now();

    // Load config
    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    // Validate everything at startup, before any track is read
    let mut settings = match Settings::resolve(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config errors:");
            for error in e.errors {
                eprintln!("  - {}", error);
            }
            return EXIT_CONFIG;
        }
    };
    if recursive {
        settings.scan.recursive = true;
    }

    let scanner = TrackScanner::new(&path, settings.scan.clone());
    let sources = match scanner.scan() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Cannot read {}: {}", path.display(), e);
            return EXIT_INPUT;
        }
    };
    debug!(sources = sources.remaining(), root = %scanner.root().display(), "starting batch");

    let cancel = CancelToken::new();
    #[cfg(feature = "parallel")]
    let batch = forage_scout::batch::run_batch_parallel(sources, &settings, &cancel);
    #[cfg(not(feature = "parallel"))]
    let batch = forage_scout::batch::run_batch(sources, &settings, &cancel);

    let use_colors = output::should_use_colors();
    match format {
        Format::Table => {
            if verbose && !batch.results.is_empty() {
                for result in &batch.results {
                    println!("{}", output::format_result_detail(result, use_colors));
                    println!();
                }
            } else {
                println!("{}", output::format_results_table(&batch.results, use_colors));
            }
            let errors = output::format_errors(&batch.errors, use_colors);
            if !errors.is_empty() {
                println!();
                println!("{}", errors);
            }
            println!();
            println!("{}", output::format_summary(&batch));
        }
        Format::Tsv => {
            let tsv = output::format_tsv(&batch.results);
            if !tsv.is_empty() {
                println!("{}", tsv);
            }
            // Keep stdout machine-readable
            let errors = output::format_errors(&batch.errors, false);
            if !errors.is_empty() {
                eprintln!("{}", errors);
            }
        }
        Format::Json => match output::to_json(&batch) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Report error: {:#}", e);
                return EXIT_REPORT;
            }
        },
    }

    if let Some(report_path) = report_path {
        if let Err(e) = output::write_json_report(&report_path, &batch) {
            eprintln!("Report error: {:#}", e);
            return EXIT_REPORT;
        }
        info!(path = %report_path.display(), "report written");
    }

    if verbose {
        eprintln!(
            "Total: {} tracks in {:?}",
            batch.processed(),
            start_time.elapsed()
        );
    }

    EXIT_SUCCESS
}
