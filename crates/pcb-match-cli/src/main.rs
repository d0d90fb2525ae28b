use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use pcb_match::bom::group_results;
use pcb_match::{match_components, MatchReport};

mod config;
mod load;
mod output;

use config::Config;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "pcb-match")]
#[command(about = "Match schematic components against parts inventories", long_about = None)]
#[command(version)]
struct Cli {
    /// Components to match (CSV or TSV with a reference column)
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    components: PathBuf,

    /// Inventory file; repeat for more sources, highest precedence first
    #[arg(long, value_name = "FILE", required = true, value_hint = clap::ValueHint::FilePath)]
    inventory: Vec<PathBuf>,

    /// TOML file with classification rules, fabricators and scoring options
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Only select parts orderable from this fabricator
    #[arg(long, value_name = "NAME")]
    fabricator: Option<String>,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Group components into BOM lines
    #[arg(long)]
    grouped: bool,

    /// Write output to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the match summary and shadowed inventory rows to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Fail if any populated component is left unmatched
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // Default level is overridden by RUST_LOG
    let level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let classifier = config.classifier()?;
    let match_config = config.match_config(cli.fabricator.as_deref())?;
    let fabricator = match_config.fabricator.clone();

    let components = load::load_components(&cli.components)?;
    let sources = cli
        .inventory
        .iter()
        .map(|path| load::load_inventory(path))
        .collect::<Result<Vec<_>>>()?;

    let report = match_components(&components, &sources, &classifier, match_config);

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    if cli.grouped {
        let lines = group_results(&report.results, fabricator.as_ref());
        output::write_bom(&lines, cli.format, &mut writer)?;
    } else {
        output::write_report(&report, cli.format, &mut writer)?;
    }
    writer.flush()?;

    if cli.verbose {
        print_summary(&report);
    }

    let missing: Vec<&str> = report
        .results
        .iter()
        .filter(|r| !r.is_matched() && !r.dnp)
        .map(|r| r.reference.as_str())
        .collect();
    if !missing.is_empty() {
        if cli.strict {
            bail!("{} components unmatched: {}", missing.len(), missing.join(", "));
        }
        eprintln!(
            "{} {} components unmatched",
            "Warning:".yellow().bold(),
            missing.len()
        );
    }

    Ok(())
}

fn print_summary(report: &MatchReport) {
    let summary = &report.summary;
    let status = if summary.unmatched() == 0 {
        "Done".green().bold()
    } else {
        "Incomplete".yellow().bold()
    };
    eprintln!("{status}");
    eprint!("{summary}");

    for result in report.results.iter().filter(|r| !r.is_matched()) {
        eprintln!(
            "  {} {}",
            result.reference.bold(),
            result.outcome.describe().dimmed()
        );
    }
}
