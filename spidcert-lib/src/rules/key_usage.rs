//! keyUsage: critical, signing only.

use super::{missing_extension, RuleResult};
use crate::fields::{ExtensionError, ExtensionKind, ExtensionValue, Extensions, KeyUsage};
use crate::report::Check;

/// Bits that must be set.
const REQUIRED_BITS: [(&str, fn(&KeyUsage) -> bool); 2] = [
    ("content_commitment", |ku: &KeyUsage| ku.content_commitment),
    ("digital_signature", |ku: &KeyUsage| ku.digital_signature),
];

/// Bits that must be unset.
const FORBIDDEN_BITS: [(&str, fn(&KeyUsage) -> bool); 5] = [
    ("crl_sign", |ku: &KeyUsage| ku.crl_sign),
    ("data_encipherment", |ku: &KeyUsage| ku.data_encipherment),
    ("key_agreement", |ku: &KeyUsage| ku.key_agreement),
    ("key_cert_sign", |ku: &KeyUsage| ku.key_cert_sign),
    ("key_encipherment", |ku: &KeyUsage| ku.key_encipherment),
];

pub fn key_usage(extensions: &Extensions) -> RuleResult {
    let kind = ExtensionKind::KeyUsage;
    let Some(ext) = extensions.get(kind)? else {
        return Ok(vec![missing_extension(kind)]);
    };

    let ExtensionValue::KeyUsage(usage) = &ext.value else {
        return Err(ExtensionError::new(kind.name(), "unexpected extension value"));
    };

    let mut checks = vec![Check::verify(
        format!("{} must be critical", kind),
        ext.critical,
        ext.critical,
    )];

    for (name, bit) in REQUIRED_BITS {
        let set = bit(usage);
        checks.push(Check::verify(format!("{} bit must be set", name), set, set));
    }

    for (name, bit) in FORBIDDEN_BITS {
        let set = bit(usage);
        checks.push(Check::verify(format!("{} bit must be unset", name), !set, set));
    }

    Ok(checks)
}
