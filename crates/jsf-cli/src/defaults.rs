//! # Defaults Subcommand
//!
//! Prints the form data with schema defaults filled in. A scalar root with
//! no data and no default prints `null`.

use anyhow::Context;
use clap::Args;
use jsf_schema::default_form_state;
use serde_json::Value;

use crate::input::FormArgs;
use crate::CommandOutput;

/// Arguments for the defaults subcommand.
#[derive(Args, Debug, Clone)]
pub struct DefaultsArgs {
    #[command(flatten)]
    pub form: FormArgs,
}

pub fn run(args: &DefaultsArgs) -> anyhow::Result<CommandOutput> {
    let input = args.form.load()?;
    let data = default_form_state(&input.schema, input.data.as_ref())
        .context("synthesizing defaults")?;
    Ok(CommandOutput::ok(data.unwrap_or(Value::Null)))
}
