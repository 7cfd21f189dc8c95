//! Property-based tests for rust-common crate.

use proptest::prelude::*;
use rust_common::PlatformError;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_transient_errors_are_retryable(msg in "[a-zA-Z0-9 ]{1,50}") {
        prop_assert!(PlatformError::unavailable(msg.clone()).is_retryable());
        prop_assert!(PlatformError::Timeout(msg).is_retryable());
    }

    #[test]
    fn prop_caller_errors_are_not_retryable(msg in "[a-zA-Z0-9 ]{1,50}") {
        prop_assert!(!PlatformError::invalid_input(msg.clone()).is_retryable());
        prop_assert!(!PlatformError::Internal(msg).is_retryable());
    }

    #[test]
    fn prop_display_carries_message(msg in "[a-zA-Z0-9]{1,50}") {
        let err = PlatformError::unavailable(msg.clone());
        prop_assert!(err.to_string().ends_with(&msg));
    }
}
