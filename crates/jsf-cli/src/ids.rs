//! # Ids Subcommand
//!
//! Prints the field id tree, computed over the data with defaults filled
//! in, the same way a rendered form computes it.

use clap::Args;

use crate::input::FormArgs;
use crate::CommandOutput;

/// Arguments for the ids subcommand.
#[derive(Args, Debug, Clone)]
pub struct IdsArgs {
    #[command(flatten)]
    pub form: FormArgs,
}

pub fn run(args: &IdsArgs) -> anyhow::Result<CommandOutput> {
    let state = args.form.load()?.into_state()?;
    Ok(CommandOutput::ok(serde_json::to_value(state.id_schema())?))
}
