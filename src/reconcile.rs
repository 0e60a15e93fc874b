use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use ellipse::Ellipse;
use regex::Regex;
use terminal_size::{terminal_size, Width};
use tracing::info;

use crate::{
    matching::{self, Tolerances},
    model::{MatchResult, Status},
    parsing::Sources,
};

#[derive(Debug, Default, Args)]
pub struct Command {
    /// Restrict the report to branches matching this pattern.
    #[arg(short, long)]
    pub filial: Option<String>,
    /// Show only rows that need attention.
    #[arg(short, long)]
    pub problems: bool,
    /// Write the report as csv instead of printing a table.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub width: Option<u16>,
}

pub fn execute_command(sources: &Sources, tolerances: &Tolerances, cmd: &Command) -> Result<()> {
    let compiled = cmd.filial.as_deref().map(Regex::new).transpose()?;

    let summaries = sources
        .summaries
        .iter()
        .filter(|summary| {
            compiled
                .as_ref()
                .map_or(true, |c| c.is_match(&summary.filial))
        })
        .cloned()
        .collect::<Vec<_>>();

    let results = matching::reconcile(&sources.transactions, &summaries, tolerances)?;

    match &cmd.output {
        Some(path) => write_csv(path, &results),
        None => {
            print_table(&results, cmd);
            Ok(())
        }
    }
}

struct Format {
    customer_width: usize,
}

impl Format {
    fn new(cmd: &Command) -> Self {
        let maximum_width = match (cmd.width, terminal_size()) {
            (Some(w), _) | (None, Some((Width(w), _))) => w as usize,
            _ => 160,
        };

        // Everything except the customer column is fixed width.
        let fixed = 6 + 10 + 8 + 12 + 12 + 8 + 4 + 20 + 9;
        Self {
            customer_width: maximum_width.saturating_sub(fixed).clamp(12, 40),
        }
    }
}

struct Row<'r> {
    result: &'r MatchResult,
}

impl<'r> Row<'r> {
    fn format(&self, format: &Format) -> String {
        let r = self.result;
        let side = r.app.as_ref();

        format!(
            "{:6} {:>10} {:customer_width$} {:>8} {:>12} {:>12} {:>8} {:>4} {}",
            r.filial,
            r.sale_number,
            r.customer.as_str().truncate_ellipse(format.customer_width - 3),
            fmt_or_empty(r.time.map(|t| t.format("%H:%M:%S").to_string())),
            fmt_or_empty(side.map(|s| format!("{}", s.amount.with_scale(2)))),
            format!("{}", r.net_total.with_scale(2)),
            fmt_or_empty(r.value_diff.as_ref().map(|d| format!("{}", d.with_scale(2)))),
            fmt_or_empty(r.time_diff_minutes),
            r.status,
            customer_width = format.customer_width,
        )
    }
}

fn fmt_or_empty<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| format!("{}", v)).unwrap_or_default()
}

fn print_table(results: &[MatchResult], cmd: &Command) {
    let format = Format::new(cmd);

    println!(
        "{:6} {:>10} {:customer_width$} {:>8} {:>12} {:>12} {:>8} {:>4} {}",
        "Filial",
        "Venda",
        "Cliente",
        "Hora",
        "APP",
        "Trier",
        "Dif.",
        "Min",
        "Status",
        customer_width = format.customer_width,
    );

    for result in results.iter().filter(|r| !cmd.problems || !r.status.is_ok()) {
        let row = Row { result }.format(&format);
        println!(
            "{}",
            match result.status {
                Status::Exact => row.normal(),
                Status::Adjusted => row.yellow(),
                Status::Divergent | Status::Unmatched => row.red(),
            }
        );
    }
}

pub const REPORT_HEADERS: [&str; 11] = [
    "Filial",
    "Núm. Venda",
    "Cliente",
    "Criado em (APP)",
    "Hora (Trier)",
    "Pagamento (APP)",
    "Valor Venda APP",
    "Total Líquido (Trier)",
    "Diferença",
    "Dif. (min)",
    "Status",
];

fn csv_record(result: &MatchResult) -> Vec<String> {
    let side = result.app.as_ref();

    vec![
        result.filial.clone(),
        result.sale_number.clone(),
        result.customer.clone(),
        fmt_or_empty(
            side.and_then(|s| s.created)
                .map(|c| c.format("%d/%m/%Y %H:%M:%S").to_string()),
        ),
        fmt_or_empty(result.time.map(|t| t.format("%H:%M:%S").to_string())),
        fmt_or_empty(side.map(|s| s.method.label())),
        fmt_or_empty(side.map(|s| format!("{}", s.amount.with_scale(2)))),
        format!("{}", result.net_total.with_scale(2)),
        fmt_or_empty(
            result
                .value_diff
                .as_ref()
                .map(|d| format!("{}", d.with_scale(2))),
        ),
        fmt_or_empty(result.time_diff_minutes),
        result.status.label().to_owned(),
    ]
}

fn write_csv(path: &PathBuf, results: &[MatchResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(REPORT_HEADERS)?;
    for result in results {
        writer.write_record(csv_record(result))?;
    }
    writer.flush()?;

    info!("wrote {} rows to {:?}", results.len(), path);

    Ok(())
}
