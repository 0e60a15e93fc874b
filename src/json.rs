use anyhow::Result;
use clap::Args;

use crate::{
    matching::{self, Tolerances},
    parsing::Sources,
};

#[derive(Debug, Args)]
pub struct Command {}

pub fn execute_command(sources: &Sources, tolerances: &Tolerances, _cmd: &Command) -> Result<()> {
    let results = matching::reconcile(&sources.transactions, &sources.summaries, tolerances)?;
    serde_json::to_writer(std::io::stdout(), &results)?;

    Ok(())
}
