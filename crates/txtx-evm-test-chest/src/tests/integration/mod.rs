//! Integration tests against a real anvil node

pub mod anvil_harness;
mod anvil_tests;

/// Defines an async test that only runs when anvil is installed
///
/// Tests using this will:
/// - Run normally if anvil is installed
/// - Skip with a warning message otherwise
#[macro_export]
macro_rules! anvil_test {
    ($name:ident, $body:expr) => {
        #[tokio::test]
        async fn $name() {
            if !$crate::tests::integration::anvil_harness::AnvilInstance::is_available() {
                eprintln!("⚠️  Skipping {} - anvil not installed", stringify!($name));
                eprintln!("    Install with: curl -L https://foundry.paradigm.xyz | bash");
                return;
            }

            $body.await
        }
    };
}
