//! # State Subcommand
//!
//! Prints the whole derived form state. With `--submit` the form is
//! submitted first, so the printed errors are the ones a submit shows and
//! the exit status reflects acceptance.

use clap::Args;
use jsf_schema::Submission;

use crate::input::FormArgs;
use crate::CommandOutput;

/// Arguments for the state subcommand.
#[derive(Args, Debug, Clone)]
pub struct StateArgs {
    #[command(flatten)]
    pub form: FormArgs,

    /// Submit the form before printing.
    #[arg(long)]
    pub submit: bool,
}

pub fn run(args: &StateArgs) -> anyhow::Result<CommandOutput> {
    let mut state = args.form.load()?.into_state()?;
    let success = if args.submit {
        match state.submit() {
            Submission::Accepted(_) => true,
            Submission::Rejected(errors) => {
                tracing::warn!(errors = errors.len(), "submission rejected");
                false
            }
        }
    } else {
        true
    };
    Ok(CommandOutput {
        value: serde_json::to_value(&state)?,
        success,
    })
}
