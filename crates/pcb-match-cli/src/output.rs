use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Table;
use pcb_match::bom::BomLine;
use pcb_match::{MatchReport, MatchResult};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

const RESULT_HEADER: [&str; 10] = [
    "Reference",
    "Value",
    "Category",
    "Package",
    "IPN",
    "Source",
    "Score",
    "Priority",
    "Match",
    "DNP",
];

const BOM_HEADER: [&str; 9] = [
    "Designators",
    "Qty",
    "IPN",
    "Value",
    "Package",
    "MPN",
    "Fabricator Part",
    "Status",
    "DNP",
];

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn result_row(result: &MatchResult) -> Vec<String> {
    let item = result.item.as_ref();
    vec![
        result.reference.clone(),
        result.value.clone(),
        result.category.as_ref().map(ToString::to_string).unwrap_or_default(),
        result.package.clone().unwrap_or_default(),
        item.map(|i| i.ipn.clone()).unwrap_or_default(),
        item.map(|i| i.source.to_string()).unwrap_or_default(),
        result.score.map(|s| s.normalize().to_string()).unwrap_or_default(),
        result.priority.map(|p| p.to_string()).unwrap_or_default(),
        result
            .quality
            .clone()
            .unwrap_or_else(|| result.outcome.describe().to_string()),
        yes_no(result.dnp).to_string(),
    ]
}

fn bom_row(line: &BomLine) -> Vec<String> {
    vec![
        line.designator_list(),
        line.quantity.to_string(),
        line.ipn.clone().unwrap_or_default(),
        line.value.clone(),
        line.package.clone().unwrap_or_default(),
        line.mpn.clone().unwrap_or_default(),
        line.fabricator_part.clone().unwrap_or_default(),
        line.outcome.describe().to_string(),
        yes_no(line.dnp).to_string(),
    ]
}

fn write_table<W: Write>(header: &[&str], rows: Vec<Vec<String>>, mut writer: W) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);
    table.set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    writeln!(writer, "{table}")?;
    Ok(())
}

fn write_csv<W: Write>(header: &[&str], rows: Vec<Vec<String>>, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per component
pub fn write_report<W: Write>(
    report: &MatchReport,
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    let rows = || -> Vec<Vec<String>> { report.results.iter().map(result_row).collect() };
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, report)?;
            writeln!(writer)?;
            Ok(())
        }
        OutputFormat::Table => write_table(&RESULT_HEADER, rows(), writer),
        OutputFormat::Csv => write_csv(&RESULT_HEADER, rows(), writer),
    }
}

/// One row per BOM line
pub fn write_bom<W: Write>(lines: &[BomLine], format: OutputFormat, mut writer: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, lines)?;
            writeln!(writer)?;
            Ok(())
        }
        OutputFormat::Table => {
            write_table(&BOM_HEADER, lines.iter().map(bom_row).collect(), writer)
        }
        OutputFormat::Csv => write_csv(&BOM_HEADER, lines.iter().map(bom_row).collect(), writer),
    }
}
