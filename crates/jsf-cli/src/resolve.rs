//! # Resolve Subcommand
//!
//! Prints the root schema with `$ref` followed and `dependencies` applied
//! for the given data.

use anyhow::Context;
use clap::Args;
use jsf_schema::retrieve_schema;
use serde_json::Value;

use crate::input::FormArgs;
use crate::CommandOutput;

/// Arguments for the resolve subcommand.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub form: FormArgs,
}

pub fn run(args: &ResolveArgs) -> anyhow::Result<CommandOutput> {
    let input = args.form.load()?;
    let data = input.data.unwrap_or(Value::Null);
    let resolved = retrieve_schema(&input.schema, &data).context("resolving schema")?;
    Ok(CommandOutput::ok(resolved))
}
