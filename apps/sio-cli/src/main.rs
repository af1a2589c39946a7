use clap::{Parser, Subcommand};
use sio_app::{AppError, AppResult, RunOptions};
use sio_project::ProjectConfig;
use sio_store::OutputStore;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "sio-cli")]
#[command(about = "Supply-use to input-output table transformation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a dataset configuration file
    Validate {
        /// Path to the configuration (YAML or JSON)
        config_path: PathBuf,
    },
    /// Write the default EXIOBASE 3.3 configuration
    InitConfig {
        /// Destination file (.yaml, .yml or .json)
        path: PathBuf,
    },
    /// Report where one year's supply-use table is not balanced
    Check {
        /// Path to the configuration (YAML or JSON)
        config_path: PathBuf,
        /// Directory holding the year's input files
        year_dir: PathBuf,
    },
    /// Transform every year under an input root and store the results
    Transform {
        /// Path to the configuration (YAML or JSON)
        config_path: PathBuf,
        /// Directory with one sub-directory per year
        input_root: PathBuf,
        /// Directory receiving one sub-directory per year
        output_root: PathBuf,
        /// Only process this year
        #[arg(long)]
        year: Option<i32>,
        /// Force secondary-material reallocation on
        #[arg(long, conflicts_with = "no_secondary")]
        secondary: bool,
        /// Force secondary-material reallocation off
        #[arg(long)]
        no_secondary: bool,
        /// Skip the balance checks after transformation
        #[arg(long)]
        skip_verification: bool,
        /// Process years concurrently; every year in flight holds its own
        /// full set of dense matrices, multiplying peak memory
        #[arg(long)]
        parallel: bool,
    },
    /// List stored years, or show one year's manifest
    Show {
        /// Output root written by `transform`
        output_root: PathBuf,
        /// Year to display
        year: Option<i32>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::InitConfig { path } => cmd_init_config(&path),
        Commands::Check {
            config_path,
            year_dir,
        } => cmd_check(&config_path, &year_dir),
        Commands::Transform {
            config_path,
            input_root,
            output_root,
            year,
            secondary,
            no_secondary,
            skip_verification,
            parallel,
        } => {
            let options = RunOptions {
                secondary: match (secondary, no_secondary) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                skip_verification,
                parallel,
                year,
            };
            cmd_transform(&config_path, &input_root, &output_root, &options)
        }
        Commands::Show { output_root, year } => cmd_show(&output_root, year),
    }
}

fn load_config(config_path: &Path) -> AppResult<ProjectConfig> {
    Ok(sio_project::load(config_path)?)
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = load_config(config_path)?;
    println!("✓ Configuration is valid");
    let d = &config.dimensions;
    println!(
        "  {} products, {} industries, {} final-demand categories, {} countries",
        d.products, d.industries, d.final_demand, d.countries
    );
    println!(
        "  {} material pairs (reallocation {})",
        config.secondary.pairs.len(),
        if config.secondary.enabled { "on" } else { "off" }
    );
    Ok(())
}

fn cmd_init_config(path: &Path) -> AppResult<()> {
    sio_project::save(path, &ProjectConfig::exiobase())?;
    println!("✓ Wrote default configuration to {}", path.display());
    Ok(())
}

fn cmd_check(config_path: &Path, year_dir: &Path) -> AppResult<()> {
    let config = load_config(config_path)?;
    let imbalances = sio_app::check_year(&config, year_dir)?;

    if imbalances.is_balanced() {
        println!("✓ Table is balanced");
        return Ok(());
    }
    for (axis, rows) in [
        ("product", &imbalances.products),
        ("industry", &imbalances.industries),
    ] {
        if rows.is_empty() {
            continue;
        }
        println!("Unbalanced {axis} rows ({}):", rows.len());
        for row in rows {
            let label = row
                .label
                .as_ref()
                .map(|l| l.join(" / "))
                .unwrap_or_default();
            println!("  [{}] {}: {:+.6}", row.index, label, row.difference);
        }
    }
    Ok(())
}

fn cmd_transform(
    config_path: &Path,
    input_root: &Path,
    output_root: &Path,
    options: &RunOptions,
) -> AppResult<()> {
    let config = load_config(config_path)?;
    info!(dataset = %config.name, "transforming");

    let summary = sio_app::run_batch(&config, input_root, output_root, options)?;

    for manifest in &summary.completed {
        let status = if manifest.checks.is_empty() {
            "not verified"
        } else if manifest.passed() {
            "balanced"
        } else {
            "IMBALANCED"
        };
        println!(
            "✓ {}: stored ({}, secondary {})",
            manifest.year,
            status,
            if manifest.secondary_applied { "on" } else { "off" }
        );
        for check in manifest.checks.iter().filter(|c| !c.passed) {
            println!(
                "    {}: {} of {} indices off (max |delta| {:.6e})",
                check.kind, check.failures, check.compared, check.max_abs_delta
            );
        }
    }
    for failure in &summary.failed {
        println!("✗ {}: {}", failure.year, failure.error);
    }

    if summary.all_succeeded() {
        Ok(())
    } else {
        Err(AppError::BatchFailed {
            failed: summary.failed.len(),
            total: summary.failed.len() + summary.completed.len(),
        })
    }
}

fn cmd_show(output_root: &Path, year: Option<i32>) -> AppResult<()> {
    let store = OutputStore::new(output_root.to_path_buf())?;

    let Some(year) = year else {
        let years = store.list_years()?;
        if years.is_empty() {
            println!("No stored years in {}", output_root.display());
        } else {
            println!("Stored years:");
            for year in years {
                println!("  {year}");
            }
        }
        return Ok(());
    };

    let manifest = store.load_manifest(year)?;
    println!("Dataset: {} ({})", manifest.dataset, manifest.year);
    println!("Stored: {} ({:.2}s)", manifest.timestamp, manifest.elapsed_s);
    println!("Input hash: {}", manifest.input_hash);
    println!(
        "Secondary reallocation: {}",
        if manifest.secondary_applied { "on" } else { "off" }
    );
    println!(
        "Raw imbalances: {} products, {} industries",
        manifest.raw_imbalances.products, manifest.raw_imbalances.industries
    );
    println!("Matrices:");
    for m in &manifest.matrices {
        println!("  {:<10} {:>6} x {:<6} {}", m.name, m.rows, m.cols, m.file);
    }
    if !manifest.checks.is_empty() {
        println!("Checks:");
        for c in &manifest.checks {
            let mark = if c.passed { "✓" } else { "✗" };
            println!("  {mark} {} ({} compared, {} off)", c.kind, c.compared, c.failures);
        }
    }
    Ok(())
}
