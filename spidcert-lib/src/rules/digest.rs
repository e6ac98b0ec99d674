//! Signature digest algorithm.

use super::bracketed;
use crate::profile::Profile;
use crate::report::Check;

/// Check that the signature hash is one of the profile's digests.
///
/// `digest` is `None` when the signature algorithm does not name a hash;
/// the signature algorithm itself is then reported as the observed value.
pub fn digest_algorithm(
    digest: Option<&str>,
    signature_algorithm: &str,
    profile: &Profile,
) -> Vec<Check> {
    let desc = format!(
        "The digest algorithm must be one of {}",
        bracketed(&profile.allowed_digests)
    );
    let check = match digest {
        Some(name) => Check::verify(
            desc,
            profile.allowed_digests.iter().any(|d| d == name),
            name,
        ),
        None => Check::verify(desc, false, signature_algorithm),
    };
    vec![check]
}
