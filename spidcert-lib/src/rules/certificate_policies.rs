//! certificatePolicies: agIDcert plus the sector's SPID policy.

use super::{missing_extension, RuleResult};
use crate::fields::{
    ExtensionError, ExtensionKind, ExtensionValue, Extensions, PolicyInformation, PolicyQualifier,
};
use crate::oid;
use crate::profile::Sector;
use crate::report::Check;

/// Explicit text required on the agIDcert policy.
pub const AGID_CERT_TEXT: &str = "agIDcert";
/// Explicit text required on the public sector policy.
pub const PUBLIC_SP_TEXT: &str = "cert_SP_Pub";
/// Explicit text required on the private sector policy.
pub const PRIVATE_SP_TEXT: &str = "cert_SP_Priv";

impl Sector {
    /// SPID service provider policy OID for this sector.
    pub fn policy_oid(self) -> &'static str {
        match self {
            Sector::Public => oid::POLICY_SPID_PUBLIC_SP,
            Sector::Private => oid::POLICY_SPID_PRIVATE_SP,
        }
    }

    fn policy_text(self) -> &'static str {
        match self {
            Sector::Public => PUBLIC_SP_TEXT,
            Sector::Private => PRIVATE_SP_TEXT,
        }
    }
}

pub fn certificate_policies(extensions: &Extensions, sector: Sector) -> RuleResult {
    let kind = ExtensionKind::CertificatePolicies;
    let Some(ext) = extensions.get(kind)? else {
        return Ok(vec![missing_extension(kind)]);
    };

    let ExtensionValue::CertificatePolicies(policies) = &ext.value else {
        return Err(ExtensionError::new(kind.name(), "unexpected extension value"));
    };

    let mut checks = vec![Check::verify(
        format!("{} must be not critical", kind),
        !ext.critical,
        ext.critical,
    )];

    for expected in [oid::POLICY_AGID_CERT, sector.policy_oid()] {
        let present = policies.iter().any(|p| p.oid == expected);
        checks.push(Check::verify(
            format!("policy {} must be present", expected),
            present,
            present,
        ));
    }

    for policy in policies {
        if policy.oid == oid::POLICY_AGID_CERT {
            checks.extend(explicit_text_checks(policy, AGID_CERT_TEXT));
        } else if policy.oid == sector.policy_oid() {
            checks.extend(explicit_text_checks(policy, sector.policy_text()));
            if sector == Sector::Private && policy.qualifiers.is_empty() {
                checks.push(Check::verify(
                    format!("policy {} must have a valid policy", policy.oid),
                    false,
                    "",
                ));
            }
        }
    }

    Ok(checks)
}

/// One check per UserNotice qualifier of `policy`.
fn explicit_text_checks(policy: &PolicyInformation, expected: &str) -> Vec<Check> {
    policy
        .qualifiers
        .iter()
        .filter_map(|q| match q {
            PolicyQualifier::UserNotice { explicit_text } => {
                let text = explicit_text.as_deref().unwrap_or_default();
                Some(Check::verify(
                    format!(
                        "policy {} must have UserNotice.ExplicitText={}",
                        policy.oid, expected
                    ),
                    explicit_text.as_deref() == Some(expected),
                    text,
                ))
            }
            _ => None,
        })
        .collect()
}
