use std::collections::HashMap;

use anyhow::Result;
use bigdecimal::BigDecimal;
use clap::Args;
use itertools::Itertools;

use crate::{
    matching::{self, Tolerances},
    model::MatchResult,
    parsing::Sources,
};

#[derive(Debug, Args)]
pub struct Command {}

fn tally(results: &[MatchResult]) -> (HashMap<&'static str, usize>, BigDecimal) {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for result in results {
        *counts.entry(result.status.label()).or_default() += 1;
    }

    let divergence: BigDecimal = results
        .iter()
        .filter_map(|result| result.value_diff_abs.clone())
        .sum();

    (counts, divergence)
}

pub fn execute_command(sources: &Sources, tolerances: &Tolerances, _cmd: &Command) -> Result<()> {
    let results = matching::reconcile(&sources.transactions, &sources.summaries, tolerances)?;

    let (counts, divergence) = tally(&results);

    for label in counts.keys().sorted() {
        println!("{:>6} {}", counts[label], label);
    }
    println!("{:>6} total", results.len());
    println!("{:>6} absolute divergence", format!("{}", divergence.with_scale(2)));

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::model::{MatchResult, SalesSummary, Status};

    fn summary(sale: &str, net_total: &str) -> SalesSummary {
        SalesSummary {
            filial: "01".into(),
            sale_number: sale.into(),
            customer: "CONSUMIDOR".into(),
            net_total: BigDecimal::from_str(net_total).unwrap(),
            time: None,
        }
    }

    #[test]
    fn test_tally_counts_and_divergence() {
        let mut adjusted = MatchResult::unmatched(&summary("1", "100.00"));
        adjusted.status = Status::Adjusted;
        adjusted.value_diff_abs = Some(BigDecimal::from_str("0.10").unwrap());

        let results = vec![
            adjusted,
            MatchResult::unmatched(&summary("2", "50.00")),
            MatchResult::unmatched(&summary("3", "25.00")),
        ];

        let (counts, divergence) = tally(&results);

        assert_eq!(counts[Status::Adjusted.label()], 1);
        assert_eq!(counts[Status::Unmatched.label()], 2);
        assert_eq!(divergence, BigDecimal::from_str("0.10").unwrap());
    }
}
