//! Shared proptest generators.

use proptest::prelude::*;

use crate::fixtures::TRUSTED_VPCE;

/// Well-formed interface endpoint identifiers.
pub fn vpce_id_strategy() -> impl Strategy<Value = String> {
    "[0-9a-f]{8,17}".prop_map(|hex| format!("vpce-{hex}"))
}

/// Well-formed identifiers other than the trusted one.
pub fn foreign_vpce_id_strategy() -> impl Strategy<Value = String> {
    vpce_id_strategy().prop_filter("must differ from trusted endpoint", |id| id != TRUSTED_VPCE)
}

/// Anything a caller might put in the boundary header, including junk.
pub fn spoofed_source_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        foreign_vpce_id_strategy(),
        Just(TRUSTED_VPCE.to_uppercase()),
        Just(format!("{TRUSTED_VPCE},{TRUSTED_VPCE}")),
        Just(format!("{TRUSTED_VPCE}0")),
        "[ -~]{0,40}".prop_filter("must differ from trusted endpoint", |s| s.trim() != TRUSTED_VPCE),
    ]
}

/// Visible-ASCII header values.
pub fn header_value_strategy() -> impl Strategy<Value = String> {
    "[!-~]([ -~]{0,60}[!-~])?"
}

/// Content types a client might send.
pub fn content_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("application/x-amz-json-1.1".to_string()),
        Just("application/json".to_string()),
        Just("text/plain; charset=utf-8".to_string()),
        header_value_strategy(),
    ]
}

/// Arbitrary request bodies, not necessarily UTF-8.
pub fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..2048)
}

/// Domains that are valid bare host names.
pub fn domain_strategy() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9-]{0,15}", "[a-z]{2,6}").prop_map(|(label, tld)| format!("{label}.example.{tld}"))
}

/// Upstream error statuses.
pub fn upstream_error_status_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![400u16..=499, 500u16..=599]
}
