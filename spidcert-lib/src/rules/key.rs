//! Public key type and size.

use super::bracketed;
use crate::fields::PublicKeyInfo;
use crate::profile::Profile;
use crate::report::{Check, Outcome};

/// Check the key algorithm against the profile, then its size (RSA) or
/// curve (EC).
pub fn key_type_and_size(key: &PublicKeyInfo, profile: &Profile) -> Vec<Check> {
    let mut checks = Vec::new();

    let allowed = profile.allowed_key_types.contains(&key.algorithm);
    checks.push(Check::verify(
        format!(
            "The public key type must be one of {}",
            bracketed(&profile.allowed_key_types)
        ),
        allowed,
        key.algorithm.as_str(),
    ));

    if !allowed {
        return checks;
    }

    match key.algorithm.as_str() {
        "RSA" => {
            let desc = format!(
                "The RSA key size must be at least {} bits",
                profile.min_rsa_bits
            );
            checks.push(match key.key_size {
                Some(bits) => Check::verify(desc, bits >= profile.min_rsa_bits, bits),
                None => Check::new(
                    desc,
                    Outcome::Failure,
                    Some("unable to decode the RSA modulus".into()),
                ),
            });
        }
        "EC" => {
            let curve = key.curve.as_deref().unwrap_or("unknown");
            checks.push(Check::verify(
                format!(
                    "The EC curve must be one of {}",
                    bracketed(&profile.allowed_curves)
                ),
                profile.allowed_curves.iter().any(|c| c == curve),
                curve,
            ));
        }
        _ => {}
    }

    checks
}
