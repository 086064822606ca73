use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crm_migrate::config::ImportConfig;
use crm_migrate::export::{Exporter, JsonExporter};
use crm_migrate::importer::{ImportReport, Importer};
use crm_migrate::logging;
use crm_migrate::sources::TabFileSource;

#[derive(Parser)]
#[command(name = "crm_migrate")]
#[command(about = "Converts LIME Easy exports into a CRM import file")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the export directory and write a schema-checked JSON file
    Convert {
        /// TOML configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory with the exported text files (overrides the config)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Output file
        #[arg(long, default_value = "crm-import.json")]
        output: PathBuf,

        /// Write the file even when validation reports violations
        #[arg(long)]
        force: bool,
    },
    /// Import and validate without writing anything
    Check {
        /// TOML configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory with the exported text files (overrides the config)
        #[arg(long)]
        source: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<ImportConfig> {
    match path {
        Some(path) => ImportConfig::load(&path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => {
            info!("no configuration file given, using defaults");
            Ok(ImportConfig::default())
        }
    }
}

fn run_import(config: &ImportConfig, source: Option<PathBuf>) -> Result<ImportReport> {
    let dir = source.unwrap_or_else(|| config.source.dir.clone());
    let source = TabFileSource::with_files(&dir, config.source.files.clone());
    let importer = Importer::new(config.clone());
    let report = importer
        .run(&source)
        .with_context(|| format!("Import from {} failed", dir.display()))?;
    Ok(report)
}

fn print_report(report: &ImportReport) {
    let counts = report.model.entity_counts();
    println!("\n📊 Import results (run {}):", report.run_id);
    println!("   Coworkers:     {}", counts.coworkers);
    println!("   Organizations: {}", counts.organizations);
    println!("   Persons:       {}", counts.persons);
    println!("   Deals:         {}", counts.deals);
    println!("   Notes:         {}", counts.notes);
    println!("   Documents:     {}", counts.documents);
    println!(
        "   Rows read: {} ({} skipped, {} malformed)",
        report.stats.rows(),
        report.stats.skipped(),
        report.stats.row_errors()
    );
}

fn print_violations(violations: &[crm_migrate::validate::Violation]) {
    println!("\n⚠️  {} validation violations:", violations.len());
    for violation in violations {
        println!("   - {violation}");
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            config,
            source,
            output,
            force,
        } => {
            println!("🔄 Importing...");
            let config = load_config(config)?;
            let report = run_import(&config, source)?;
            print_report(&report);

            report.model.sanity_check()?;
            let violations = report.model.validate();
            if !violations.is_empty() {
                print_violations(&violations);
                if !force {
                    error!(
                        violations = violations.len(),
                        "aborting before write, rerun with --force to export anyway"
                    );
                    println!("\n❌ Nothing written. Fix the source or rerun with --force.");
                    std::process::exit(1);
                }
                warn!(
                    violations = violations.len(),
                    "exporting despite validation violations"
                );
            }

            JsonExporter::new(&output).export(&report.model)?;
            println!("\n✅ Wrote {}", output.display());
        }
        Commands::Check { config, source } => {
            println!("🔎 Checking...");
            let config = load_config(config)?;
            let report = run_import(&config, source)?;
            print_report(&report);

            report.model.sanity_check()?;
            let violations = report.model.validate();
            if violations.is_empty() {
                println!("\n✅ The export is ready to convert.");
            } else {
                print_violations(&violations);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
