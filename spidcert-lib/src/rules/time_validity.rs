//! Certificate expiration.

use crate::fields::DateTime;
use crate::report::Check;

/// Check that notAfter lies strictly after `now` (Unix seconds).
pub fn not_expired(not_after: &DateTime, now: i64) -> Vec<Check> {
    vec![Check::verify(
        format!("The certificate must not be expired (notAfter {})", not_after),
        not_after.timestamp > now,
        not_after.iso8601.as_str(),
    )]
}
