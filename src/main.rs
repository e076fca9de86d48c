use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use allostat::config::AppConfig;
use allostat::error::AllostatError;
use allostat::logging::{init_logging, LogFormat};
use allostat::models::{ContributorsByDate, LoadScore, RiskLevel, SymptomsByDate};
use allostat::summary::{DaySummary, LoadSummary};
use allostat::{export, import, LoadScoreCache};

/// Allostat - Allostatic Load Scoring CLI
///
/// Scores daily accumulated load from activity exertion and symptom
/// observations, carrying a decaying share of each day into the next.
#[derive(Parser)]
#[command(name = "allostat")]
#[command(version)]
#[command(about = "Allostatic load scoring CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Activity CSV (date,physical,cognitive,emotional,duration_minutes)
    #[arg(long, value_name = "FILE")]
    contributors: Option<PathBuf>,

    /// Symptom CSV (date,severity)
    #[arg(long, value_name = "FILE")]
    symptoms: Option<PathBuf>,

    /// First day of the range (YYYY-MM-DD)
    #[arg(short, long)]
    from: NaiveDate,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(short, long)]
    to: NaiveDate,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate daily load scores for a date range
    Score {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write output to a file instead of the terminal (json and csv only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize load over a date range
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Manage the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,

        /// Print the configuration file location
        #[arg(long)]
        path: bool,
    },
}

#[derive(Tabled)]
struct ScoreTableRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Raw")]
    raw: String,
    #[tabled(rename = "Decayed")]
    decayed: String,
    #[tabled(rename = "Risk")]
    risk: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        report_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let app_config = AppConfig::load_or_default(cli.config.as_deref())?;

    let mut log_config = app_config.logging.clone().with_verbosity(cli.verbose);
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Score {
            input,
            format,
            output,
        } => {
            check_output_target(format, output.as_deref())?;
            let scores = score_range(&input, &app_config)?;
            match (format, output) {
                (OutputFormat::Table, _) => print_table(&scores),
                (OutputFormat::Json, Some(path)) => export::write_scores_json(&scores, &path)?,
                (OutputFormat::Csv, Some(path)) => export::write_scores_csv(&scores, &path)?,
                (OutputFormat::Json, None) => {
                    export::write_scores_json_to(&scores, std::io::stdout().lock())?
                }
                (OutputFormat::Csv, None) => {
                    export::write_scores_csv_to(&scores, std::io::stdout().lock())?
                }
            }
        }

        Commands::Summary { input } => {
            let scores = score_range(&input, &app_config)?;
            print_summary(&scores);
        }

        Commands::Config {
            show,
            init,
            force,
            path,
        } => {
            let config_path = cli
                .config
                .clone()
                .unwrap_or_else(AppConfig::default_config_path);

            if path {
                println!("{}", config_path.display());
            }
            if init {
                init_config(&config_path, force)?;
            }
            if show || !(path || init) {
                let rendered = toml::to_string_pretty(&app_config)
                    .context("Failed to render configuration")?;
                println!("{}", rendered);
            }
        }
    }

    Ok(())
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<AllostatError>() {
        Some(app_err) => {
            if app_err.severity().to_tracing_level() == tracing::Level::WARN {
                tracing::warn!(error = %app_err, "Command failed");
            } else {
                tracing::error!(error = %app_err, "Command failed");
            }
            eprintln!("{} {}", "Error:".red().bold(), app_err.user_message());
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}

fn check_output_target(format: OutputFormat, output: Option<&Path>) -> Result<()> {
    if let (OutputFormat::Table, Some(path)) = (format, output) {
        anyhow::bail!(
            "--output {} needs --format json or --format csv; tables print to the terminal only",
            path.display()
        );
    }
    Ok(())
}

fn score_range(input: &InputArgs, app_config: &AppConfig) -> Result<Vec<LoadScore>> {
    if input.from > input.to {
        return Err(AllostatError::InvalidDateRange {
            from: input.from,
            to: input.to,
        }
        .into());
    }

    let contributors = match &input.contributors {
        Some(path) => import::load_contributors(path)?,
        None => ContributorsByDate::new(),
    };
    let symptoms = match &input.symptoms {
        Some(path) => import::load_symptoms(path)?,
        None => SymptomsByDate::new(),
    };

    if contributors.is_empty() && symptoms.is_empty() {
        eprintln!("{}", "No activity or symptom data supplied; every day scores zero".yellow());
    }

    let mut cache = LoadScoreCache::new();
    let scores = cache.calculate_range(input.from, input.to, &contributors, &symptoms, &app_config.load);

    let stats = cache.statistics();
    tracing::debug!(entries = stats.entries, misses = stats.misses, "Score cache populated");

    Ok(scores)
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let mut config = AppConfig::default();
    config.save_to_file(path)?;
    println!("{} {}", "✓ Wrote default configuration to".green(), path.display());
    Ok(())
}

fn colored_risk(level: RiskLevel) -> ColoredString {
    let label = level.to_string();
    match level {
        RiskLevel::Normal => label.green(),
        RiskLevel::Caution => label.yellow(),
        RiskLevel::Warning => label.red(),
        RiskLevel::Critical => label.red().bold(),
    }
}

fn print_table(scores: &[LoadScore]) {
    let rows: Vec<ScoreTableRow> = scores
        .iter()
        .map(|score| ScoreTableRow {
            date: score.date().to_string(),
            raw: score.raw_load().round_dp(2).to_string(),
            decayed: score.decayed_load().round_dp(2).to_string(),
            risk: colored_risk(score.risk_level()).to_string(),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_summary(scores: &[LoadScore]) {
    let Some(summary) = LoadSummary::from_scores(scores) else {
        println!("{}", "No days in range".yellow());
        return;
    };

    println!("{}", "Load summary".cyan().bold());
    println!("  Days:          {}", summary.days);
    println!(
        "  Peak load:     {} on {}",
        summary.peak_load.round_dp(2),
        summary.peak_date
    );
    println!("  Average load:  {}", summary.average_load.round_dp(2));
    println!("  Trend:         {:?}", summary.trend);
    println!("  Elevated days: {}", summary.elevated_days);
    for (level, days) in &summary.days_by_risk {
        println!("    {:<9} {}", colored_risk(*level), days);
    }

    if let Some(latest) = scores.last() {
        let day = DaySummary::from_score(latest);
        println!();
        println!("{} {}", "Latest day:".cyan().bold(), day.date);
        println!("  {} ({})", day.description, colored_risk(day.risk_level));
        println!("  {}", day.recommendation);
    }
}
