use error_stack::Report;
use serde_json::Value;

use crate::codec::logs::DecodedReceipt;
use crate::errors::{ChestError, ChestResult};

/// Returns the argument `arg_name` of the first `event_name` log of `outcome`.
/// Later logs of the same event are not looked at, even when the first one
/// lacks the argument.
pub fn extract_event_arg<'a>(
    outcome: &'a DecodedReceipt,
    event_name: &str,
    arg_name: &str,
) -> ChestResult<&'a Value> {
    let Some(entry) = outcome.logs.iter().find(|entry| entry.event == event_name) else {
        return Err(Report::new(ChestError::NotFound(format!("event {} not found", event_name))));
    };
    entry.args.get(arg_name).ok_or_else(|| {
        Report::new(ChestError::NotFound(format!(
            "argument {} not found in event {}",
            arg_name, event_name
        )))
    })
}
