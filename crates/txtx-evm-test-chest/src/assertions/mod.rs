pub mod balance;
pub mod revert;

pub use balance::{
    assert_equal, assert_native_balance_changed, assert_native_balance_changed_within,
    assert_token_balance_changed,
};
pub use revert::{assert_invalid_opcode, assert_revert, assert_revert_with, assert_reverts};
