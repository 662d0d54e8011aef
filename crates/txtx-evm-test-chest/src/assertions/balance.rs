use alloy::primitives::U256;
use error_stack::{Report, ResultExt};
use num_bigint::BigInt;

use crate::codec::conversion::{u256_to_bigint, AmountInput};
use crate::constants::{DEFAULT_TOLERANCE, DEFAULT_TOLERANCE_CEILING};
use crate::errors::{AssertionError, ChestError, ChestResult};

/// Exact equality of two amounts
pub fn assert_equal(
    actual: impl Into<AmountInput>,
    expected: impl Into<AmountInput>,
) -> ChestResult<()> {
    let actual = actual.into().to_delta("actual")?;
    let expected = expected.into().to_delta("expected")?;
    if actual != expected {
        return Err(Report::new(ChestError::Assertion(AssertionError::NotEqual {
            actual,
            expected,
        })));
    }
    Ok(())
}

/// Checks that a native balance moved by `expected_delta`, allowing up to
/// 0.01 ether of unexplained loss (gas).
pub fn assert_native_balance_changed(
    balance_before: impl Into<AmountInput>,
    balance_after: impl Into<AmountInput>,
    expected_delta: impl Into<AmountInput>,
) -> ChestResult<()> {
    assert_native_balance_changed_within(
        balance_before,
        balance_after,
        expected_delta,
        DEFAULT_TOLERANCE,
        DEFAULT_TOLERANCE_CEILING,
    )
}

/// Passes iff `0 < after - delta - before + tolerance <= ceiling`.
pub fn assert_native_balance_changed_within(
    balance_before: impl Into<AmountInput>,
    balance_after: impl Into<AmountInput>,
    expected_delta: impl Into<AmountInput>,
    tolerance: U256,
    ceiling: U256,
) -> ChestResult<()> {
    let before = balance_before.into().to_balance("balance_before")?;
    let after = balance_after.into().to_balance("balance_after")?;
    let delta = expected_delta.into().to_delta("expected_delta")?;

    let drift = &after - &delta - &before + u256_to_bigint(&tolerance);
    let ceiling = u256_to_bigint(&ceiling);

    if drift > ceiling {
        return Err(Report::new(ChestError::Assertion(AssertionError::DriftAboveCeiling {
            drift,
            ceiling,
        })))
        .attach_printable(balance_summary(&before, &after, &delta));
    }
    if drift <= BigInt::from(0) {
        return Err(Report::new(ChestError::Assertion(AssertionError::DriftNotPositive {
            drift,
        })))
        .attach_printable(balance_summary(&before, &after, &delta));
    }
    Ok(())
}

/// Token balances move exactly, no tolerance applies
pub fn assert_token_balance_changed(
    balance_before: impl Into<AmountInput>,
    balance_after: impl Into<AmountInput>,
    expected_delta: impl Into<AmountInput>,
) -> ChestResult<()> {
    let before = balance_before.into().to_balance("balance_before")?;
    let after = balance_after.into().to_balance("balance_after")?;
    let delta = expected_delta.into().to_delta("expected_delta")?;

    let expected = &before + &delta;
    if after != expected {
        return Err(Report::new(ChestError::Assertion(AssertionError::TokenBalanceMismatch {
            before,
            after,
            delta,
            expected,
        })));
    }
    Ok(())
}

fn balance_summary(before: &BigInt, after: &BigInt, delta: &BigInt) -> String {
    format!("balance before: {} wei, after: {} wei, expected delta: {} wei", before, after, delta)
}
