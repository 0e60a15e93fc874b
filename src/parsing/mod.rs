use std::{
    io::Read,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::{anyhow, Context, Result};
use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::model::{PaymentMethod, SalesSummary, Transaction};


const CREATED_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const HORA_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Brazilian currency text to a two-decimal amount: "R$ 1.234,56" becomes
/// 1234.56. Empty or unparseable cells become 0.00, as the upstream
/// spreadsheets treat them.
pub fn parse_brl_amount(raw: &str) -> BigDecimal {
    let cleaned = raw.replace("R$", "").replace('\u{a0}', "").replace(' ', "");
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    match normalized.parse::<BigDecimal>() {
        Ok(amount) => amount.with_scale(2),
        Err(_) => {
            if !normalized.is_empty() {
                warn!("unparseable amount {:?}, using 0.00", raw);
            }
            BigDecimal::zero().with_scale(2)
        }
    }
}

pub fn parse_created(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    CREATED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

pub fn parse_hora(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    HORA_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

#[derive(Debug, Deserialize)]
struct AppRow {
    #[serde(rename = "Filial")]
    filial: String,
    #[serde(rename = "Valor")]
    valor: String,
    #[serde(rename = "Pagamento")]
    pagamento: String,
    #[serde(rename = "Criado em")]
    criado_em: String,
}

#[derive(Debug, Deserialize)]
struct TrierRow {
    #[serde(rename = "Núm. Venda")]
    sale_number: String,
    #[serde(rename = "Filial")]
    filial: String,
    #[serde(rename = "Hora")]
    hora: String,
    #[serde(rename = "Cliente")]
    cliente: String,
    #[serde(rename = "Total Líquido")]
    total_liquido: String,
}

pub fn read_transactions<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::new();

    for row in reader.deserialize() {
        let row: AppRow = row?;

        let Some(method) = PaymentMethod::from_label(&row.pagamento) else {
            debug!("skipping {:?} payment", row.pagamento.trim());
            continue;
        };

        let created = parse_created(&row.criado_em);
        if created.is_none() && !row.criado_em.trim().is_empty() {
            warn!("unparseable timestamp {:?}", row.criado_em.trim());
        }

        transactions.push(Transaction {
            filial: row.filial.trim().to_owned(),
            amount: parse_brl_amount(&row.valor),
            method,
            created,
        });
    }

    Ok(transactions)
}

pub fn read_summaries<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<SalesSummary>> {
    let mut summaries = Vec::new();

    for row in reader.deserialize() {
        let row: TrierRow = row?;

        let time = parse_hora(&row.hora);
        if time.is_none() && !row.hora.trim().is_empty() {
            warn!("unparseable time {:?} on sale {}", row.hora.trim(), row.sale_number.trim());
        }

        summaries.push(SalesSummary {
            filial: row.filial.trim().to_owned(),
            sale_number: row.sale_number.trim().to_owned(),
            customer: row.cliente.trim().to_owned(),
            net_total: parse_brl_amount(&row.total_liquido),
            time,
        });
    }

    Ok(summaries)
}

/// A directory stands for its most recently modified csv, the way the
/// download jobs leave one report per run behind.
fn resolve_input(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Ok(path.to_owned());
    }

    let pattern = path.join("*.csv");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| anyhow!("Unfriendly path: {:?}", path))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in glob::glob(pattern)? {
        let entry = entry?;
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().map_or(true, |(at, _)| modified > *at) {
            newest = Some((modified, entry));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| anyhow!("No csv files in {:?}", path))
}

#[derive(Debug)]
pub struct Sources {
    pub transactions: Vec<Transaction>,
    pub summaries: Vec<SalesSummary>,
}

impl Sources {
    pub fn load(app: &Path, trier: &Path) -> Result<Self> {
        let app = resolve_input(app)?;
        info!("reading {:?}", app);
        let mut reader =
            csv::Reader::from_path(&app).with_context(|| format!("opening {:?}", app))?;
        let transactions =
            read_transactions(&mut reader).with_context(|| format!("reading {:?}", app))?;

        let trier = resolve_input(trier)?;
        info!("reading {:?}", trier);
        let mut reader =
            csv::Reader::from_path(&trier).with_context(|| format!("opening {:?}", trier))?;
        let summaries =
            read_summaries(&mut reader).with_context(|| format!("reading {:?}", trier))?;

        info!(
            "loaded {} transactions and {} summaries",
            transactions.len(),
            summaries.len()
        );

        Ok(Self {
            transactions,
            summaries,
        })
    }
}
