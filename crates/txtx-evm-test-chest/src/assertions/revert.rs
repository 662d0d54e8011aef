use std::fmt::Display;
use std::future::Future;

use error_stack::{Report, ResultExt};
use regex::Regex;

use crate::constants::{INVALID_OPCODE_MARKERS, REVERT_MARKER};
use crate::errors::{AssertionError, ChestError, ChestResult, InputError};

/// Awaits `future` and requires it to fail on an INVALID opcode
pub async fn assert_invalid_opcode<F, T, E>(future: F) -> ChestResult<()>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let message = match future.await {
        Ok(_) => {
            return Err(Report::new(ChestError::Assertion(AssertionError::MissingFailure(
                "expected INVALID opcode failure, none received".to_string(),
            ))))
        }
        Err(e) => e.to_string(),
    };

    if INVALID_OPCODE_MARKERS.iter().any(|marker| message.contains(marker)) {
        return Ok(());
    }
    Err(Report::new(ChestError::Assertion(AssertionError::UnexpectedFailure {
        expected: "an INVALID opcode failure".to_string(),
        actual: message,
    })))
}

/// Awaits `future` and requires it to revert.
///
/// When `expected` is not empty the failure message must also match it,
/// as a regular expression if `match_as_regex` is set, as a plain substring
/// otherwise. The pattern is validated before the future is polled.
pub async fn assert_revert<F, T, E>(
    future: F,
    expected: &str,
    match_as_regex: bool,
) -> ChestResult<()>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let matcher = MessageMatcher::new(expected, match_as_regex)?;

    let message = match future.await {
        Ok(_) => {
            let awaited =
                if expected.is_empty() { "without a message".to_string() } else { expected.to_string() };
            return Err(Report::new(ChestError::Assertion(AssertionError::MissingFailure(
                format!("expected revert not received: {}", awaited),
            ))));
        }
        Err(e) => e.to_string(),
    };

    if !matcher.matches(&message) {
        return Err(Report::new(ChestError::Assertion(AssertionError::UnexpectedFailure {
            expected: matcher.describe(),
            actual: message,
        })));
    }
    if !message.contains(REVERT_MARKER) {
        return Err(Report::new(ChestError::Assertion(AssertionError::UnexpectedFailure {
            expected: format!("a failure containing '{}'", REVERT_MARKER),
            actual: message,
        })));
    }
    Ok(())
}

pub async fn assert_revert_with<F, T, E>(future: F, expected: &str) -> ChestResult<()>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    assert_revert(future, expected, true).await
}

pub async fn assert_reverts<F, T, E>(future: F) -> ChestResult<()>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    assert_revert(future, "", false).await
}

enum MessageMatcher {
    Anything,
    Substring(String),
    Pattern(Regex),
}

impl MessageMatcher {
    fn new(expected: &str, as_regex: bool) -> ChestResult<Self> {
        if expected.is_empty() {
            return Ok(MessageMatcher::Anything);
        }
        if !as_regex {
            return Ok(MessageMatcher::Substring(expected.to_string()));
        }
        let regex = Regex::new(expected)
            .map_err(|e| {
                Report::new(ChestError::InvalidInput(InputError::InvalidPattern {
                    pattern: expected.to_string(),
                    reason: e.to_string(),
                }))
            })
            .attach_printable("Compiling expected revert message")?;
        Ok(MessageMatcher::Pattern(regex))
    }

    fn matches(&self, message: &str) -> bool {
        match self {
            MessageMatcher::Anything => true,
            MessageMatcher::Substring(expected) => message.contains(expected.as_str()),
            MessageMatcher::Pattern(regex) => regex.is_match(message),
        }
    }

    fn describe(&self) -> String {
        match self {
            MessageMatcher::Anything => "a revert".to_string(),
            MessageMatcher::Substring(expected) => format!("a revert containing '{}'", expected),
            MessageMatcher::Pattern(regex) => format!("a revert matching /{}/", regex.as_str()),
        }
    }
}
