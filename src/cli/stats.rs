use std::io::Write;
use std::path::PathBuf;

use crate::prelude::*;
use clap::Args;
use itertools::Itertools;
use tabled::settings::object::{Columns, Rows};
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};
use uproctrace::{DecodeOptions, TraceStats};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Paths of the trace files, aggregated together
    #[arg(required = true)]
    pub traces: Vec<PathBuf>,
}

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    attribute: &'static str,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Cumulative")]
    cumulative: String,
    #[tabled(rename = "Samples")]
    samples: usize,
}

pub fn run(args: &StatsArgs, options: DecodeOptions, out: &mut impl Write) -> Result<()> {
    let stats = TraceStats::from_paths(&args.traces, options).with_context(|| {
        format!(
            "Failed to read traces {}",
            args.traces.iter().map(|p| p.display()).join(", ")
        )
    })?;
    writeln!(out, "{}", build_table(&stats))?;
    Ok(())
}

fn build_table(stats: &TraceStats) -> String {
    let rows: Vec<AttributeRow> = stats
        .iter()
        .map(|(attr, stats)| {
            let unit = attr.unit();
            AttributeRow {
                attribute: attr.title(),
                min: format!("{:.2}{unit}", stats.min),
                mean: format!("{:.2}{unit}", stats.mean),
                max: format!("{:.2}{unit}", stats.max),
                cumulative: format!("{:.2}{unit}", stats.cumulative),
                samples: stats.samples,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()));
    table.to_string()
}
