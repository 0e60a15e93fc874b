use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveTime;
use thiserror::Error;
use tracing::debug;

use crate::model::{MatchResult, MatchedSide, SalesSummary, Status, Transaction};

/// Per-run matching configuration. Both tolerances are inclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Tolerances {
    pub value: BigDecimal,
    /// None disables the time window entirely (value-only matching).
    pub time_minutes: Option<i64>,
}

impl Tolerances {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.value <= BigDecimal::zero() {
            return Err(ConfigError::NonPositiveValueTolerance(self.value.clone()));
        }
        if let Some(minutes) = self.time_minutes {
            if minutes <= 0 {
                return Err(ConfigError::NonPositiveTimeTolerance(minutes));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("value tolerance must be positive, got {0}")]
    NonPositiveValueTolerance(BigDecimal),
    #[error("time tolerance must be positive, got {0} minutes")]
    NonPositiveTimeTolerance(i64),
}

/// A transaction still eligible after a filtering stage, annotated with
/// the differences computed so far. `index` is the position in the
/// original pool and breaks any remaining tie.
#[derive(Debug)]
struct Candidate<'t> {
    index: usize,
    tx: &'t Transaction,
    value_diff: BigDecimal,
    time_diff_secs: Option<i64>,
}

fn candidates_by_filial<'t>(
    pool: &'t [Transaction],
    filial: &str,
) -> Vec<(usize, &'t Transaction)> {
    pool.iter()
        .enumerate()
        .filter(|(_, tx)| tx.filial == filial)
        .collect()
}

fn filter_by_value<'t>(
    candidates: Vec<(usize, &'t Transaction)>,
    net_total: &BigDecimal,
    tolerance: &BigDecimal,
) -> Vec<Candidate<'t>> {
    candidates
        .into_iter()
        .filter_map(|(index, tx)| {
            let value_diff = (&tx.amount - net_total).abs();
            (&value_diff <= tolerance).then(|| Candidate {
                index,
                tx,
                value_diff,
                time_diff_secs: None,
            })
        })
        .collect()
}

fn filter_by_time(
    candidates: Vec<Candidate>,
    time: NaiveTime,
    window_minutes: i64,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            // A transaction whose timestamp never parsed is infinitely
            // distant, not an error.
            let created = candidate.tx.created?;
            let secs = created.time().signed_duration_since(time).num_seconds().abs();
            (secs <= window_minutes * 60).then_some(Candidate {
                time_diff_secs: Some(secs),
                ..candidate
            })
        })
        .collect()
}

/// Smallest time difference first, then smallest value difference, then
/// original input order. Callers guarantee a non-empty set.
fn best_match<'t, 'c>(candidates: &'c [Candidate<'t>]) -> &'c Candidate<'t> {
    candidates
        .iter()
        .min_by(|a, b| {
            a.time_diff_secs
                .cmp(&b.time_diff_secs)
                .then_with(|| a.value_diff.cmp(&b.value_diff))
                .then_with(|| a.index.cmp(&b.index))
        })
        .unwrap()
}

/// Status is a pure function of the absolute monetary difference. The
/// Divergent arm is unreachable when the value filter ran, and kept
/// anyway.
pub fn classify(value_diff_abs: &BigDecimal, tolerance: &BigDecimal) -> Status {
    if value_diff_abs.is_zero() {
        Status::Exact
    } else if value_diff_abs <= tolerance {
        Status::Adjusted
    } else {
        Status::Divergent
    }
}

fn resolve(pool: &[Transaction], summary: &SalesSummary, tolerances: &Tolerances) -> MatchResult {
    let same_filial = candidates_by_filial(pool, &summary.filial);
    if same_filial.is_empty() {
        return MatchResult::unmatched(summary);
    }

    let by_value = filter_by_value(same_filial, &summary.net_total, &tolerances.value);
    if by_value.is_empty() {
        return MatchResult::unmatched(summary);
    }

    let surviving = match tolerances.time_minutes {
        Some(window) => match summary.time {
            Some(time) => filter_by_time(by_value, time, window),
            // No comparable time on the summary side.
            None => return MatchResult::unmatched(summary),
        },
        None => by_value,
    };
    if surviving.is_empty() {
        return MatchResult::unmatched(summary);
    }

    let best = best_match(&surviving);
    let signed = &best.tx.amount - &summary.net_total;
    let abs = signed.abs();

    MatchResult {
        filial: summary.filial.clone(),
        sale_number: summary.sale_number.clone(),
        customer: summary.customer.clone(),
        time: summary.time,
        net_total: summary.net_total.clone(),
        app: Some(MatchedSide {
            amount: best.tx.amount.clone(),
            method: best.tx.method,
            created: best.tx.created,
        }),
        value_within: abs <= tolerances.value,
        time_within: best
            .time_diff_secs
            .zip(tolerances.time_minutes)
            .map(|(secs, window)| secs <= window * 60),
        time_diff_minutes: best.time_diff_secs.map(|secs| secs / 60),
        status: classify(&abs, &tolerances.value),
        value_diff: Some(signed),
        value_diff_abs: Some(abs),
    }
}

/// Resolve every summary against the full pool, one row per summary in
/// input order. The pool is never depleted: one transaction may satisfy
/// several summaries.
pub fn reconcile(
    pool: &[Transaction],
    summaries: &[SalesSummary],
    tolerances: &Tolerances,
) -> Result<Vec<MatchResult>, ConfigError> {
    tolerances.validate()?;

    debug!(
        "matching {} summaries against {} transactions",
        summaries.len(),
        pool.len()
    );

    Ok(summaries
        .iter()
        .map(|summary| resolve(pool, summary, tolerances))
        .collect())
}
