//! # Validate Subcommand
//!
//! Validates form data (with defaults filled in) and prints the flat error
//! list, its display lines, and the error tree. Fails when any error is
//! found, so it can gate CI on fixture data.

use clap::Args;
use jsf_schema::to_error_list;
use serde_json::json;

use crate::input::FormArgs;
use crate::CommandOutput;

/// Arguments for the validate subcommand.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub form: FormArgs,
}

pub fn run(args: &ValidateArgs) -> anyhow::Result<CommandOutput> {
    let state = args.form.load()?.into_state()?;
    let result = state.validate();
    for error in &result.errors {
        tracing::info!(path = %error.property(), "{}", error.message);
    }
    let stacks: Vec<String> = to_error_list(&result.error_schema)
        .into_iter()
        .map(|entry| entry.stack)
        .collect();
    Ok(CommandOutput {
        value: json!({
            "valid": result.is_valid(),
            "errors": result.errors,
            "stacks": stacks,
            "errorSchema": result.error_schema,
        }),
        success: result.is_valid(),
    })
}
