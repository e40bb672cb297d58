//! docmigrate CLI Entry Point
//!
//! Provides command-line interface for running migration plans.
//!
//! # Usage
//!
//! ```bash
//! # Migrate a document with ./migration.yaml
//! migrate src/routes/repoMigrationRoutes.ts
//!
//! # Use a specific plan
//! migrate src/routes/repoMigrationRoutes.ts --plan plans/phase1.yaml
//!
//! # Take the document path from the plan's `document` key
//! migrate --plan plans/phase1.yaml
//!
//! # Preview without writing
//! migrate src/routes/repoMigrationRoutes.ts --dry-run
//!
//! # Machine-readable report
//! migrate src/routes/repoMigrationRoutes.ts --report-json
//! ```
//!
//! # Exit Codes
//!
//! - `0`: every step ran (skipped steps are not failures)
//! - `1`: the document could not be loaded or written
//! - `2`: the plan, an anchor, or the arguments are invalid

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use docmigrate::error::EXIT_CONFIGURATION;
use docmigrate::report::StepStatus;
use docmigrate::{load_plan, Engine, MigrateError, PipelineRun};
use docmigrate::{APP_NAME, VERSION};

/// Default plan file used when none is specified.
const DEFAULT_PLAN: &str = "migration.yaml";

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    document_path: Option<String>,
    plan_path: String,
    dry_run: bool,
    report_json: bool,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_path: None,
            plan_path: DEFAULT_PLAN.to_string(),
            dry_run: false,
            report_json: false,
            verbose: false,
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Anchor-Based Document Migration");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: migrate [OPTIONS] [DOCUMENT]");
    println!();
    println!("Arguments:");
    println!("  [DOCUMENT]          Document to migrate (defaults to the plan's `document`)");
    println!();
    println!("Options:");
    println!("  --plan FILE         Migration plan YAML (default: {})", DEFAULT_PLAN);
    println!("  --dry-run           Run every step but do not write the document");
    println!("  --report-json       Print the run report as JSON");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  migrate src/routes.ts");
    println!("  migrate src/routes.ts --plan plans/phase1.yaml --dry-run");
    println!("  migrate --plan plans/phase1.yaml --report-json");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--dry-run" => {
                config.dry_run = true;
            }
            "--report-json" => {
                config.report_json = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--plan" | "-p" => {
                i += 1;
                if i >= args.len() {
                    return Err("--plan requires a path argument".to_string());
                }
                config.plan_path = args[i].clone();
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                match positional_index {
                    0 => config.document_path = Some(arg.clone()),
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Prints a colored per-step summary.
///
/// Same layout as [`PipelineRun::summary`], with status colors.
fn print_summary(run: &PipelineRun) {
    println!();
    println!("{}", "Migration Summary:".bold());
    println!();

    for (position, outcome) in run.outcomes.iter().enumerate() {
        let status = outcome.status().to_string();
        let status = match outcome.status() {
            StepStatus::Applied => status.as_str().green(),
            StepStatus::Skipped => status.as_str().yellow(),
        };
        println!(
            "  {:>2}. {} {} ({})",
            position + 1,
            status,
            outcome.step_id,
            outcome.detail().dimmed()
        );
    }

    println!();
    match run.write_note() {
        Some(note) if run.dry_run => println!("{} {}", run.totals(), note.cyan()),
        Some(note) => println!("{} {}", run.totals(), note.green()),
        None => println!("{}", run.totals()),
    }
}

/// Main application flow.
fn run(config: &Config) -> Result<(), MigrateError> {
    if !config.report_json {
        print_banner();
    }

    if config.dry_run {
        info!("Mode: DRY RUN (document will not be written)");
    }

    let plan = load_plan(&config.plan_path)?;

    let document_path = config
        .document_path
        .clone()
        .map(Into::into)
        .or_else(|| plan.document.clone())
        .ok_or_else(|| MigrateError::PlanLoad {
            path: config.plan_path.clone().into(),
            reason: "no document given on the command line or in the plan".to_string(),
        })?;

    let mut engine = Engine::from_plan(&plan, document_path)?;
    engine.set_dry_run(config.dry_run);

    let run = engine.run()?;

    if config.report_json {
        match run.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to render JSON report: {}", e),
        }
    } else {
        print_summary(&run);
    }

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let config = match parse_arguments(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::from(EXIT_CONFIGURATION);
        }
    };

    setup_logging(config.verbose);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let MigrateError::DocumentWrite { run, .. } = &e {
                eprintln!();
                eprint!("{}", run.summary());
            }
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
