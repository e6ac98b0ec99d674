//! Subject distinguished name.
//!
//! The subject must identify an organization, never a natural person, and
//! its organizationIdentifier must follow the format of the sector.

use crate::country;
use crate::fields::{DistinguishedName, NameAttribute};
use crate::oid;
use crate::profile::Sector;
use crate::report::Check;
use crate::util::attribute_name;
use regex::Regex;
use std::sync::LazyLock;

/// Attributes that identify a person and must not appear.
pub const NOT_ALLOWED_ATTRIBUTES: [&str; 6] = [
    oid::INITIALS,
    oid::NAME,
    oid::EMAIL_ADDRESS,
    oid::GIVEN_NAME,
    oid::PSEUDONYM,
    oid::SURNAME,
];

/// Attributes that must appear.
pub const MANDATORY_ATTRIBUTES: [&str; 6] = [
    oid::ORGANIZATION_IDENTIFIER,
    oid::URI,
    oid::COMMON_NAME,
    oid::COUNTRY,
    oid::LOCALITY,
    oid::ORGANIZATION,
];

/// organizationIdentifier pattern for public administrations (IPA code).
pub const PUBLIC_ORGANIZATION_IDENTIFIER: &str = r"^PA:IT-\S{1,11}$";

/// organizationIdentifier pattern for private entities (fiscal code or VAT number).
pub const PRIVATE_ORGANIZATION_IDENTIFIER: &str = r"^(CF:IT-[A-Za-z0-9]{16}|VATIT-\d{11})$";

#[allow(clippy::expect_used)]
static PUBLIC_ORGANIZATION_IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(PUBLIC_ORGANIZATION_IDENTIFIER).expect("valid public organizationIdentifier pattern")
});

#[allow(clippy::expect_used)]
static PRIVATE_ORGANIZATION_IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(PRIVATE_ORGANIZATION_IDENTIFIER)
        .expect("valid private organizationIdentifier pattern")
});

impl Sector {
    /// organizationIdentifier pattern required for this sector.
    pub fn organization_identifier_pattern(self) -> &'static str {
        match self {
            Sector::Public => PUBLIC_ORGANIZATION_IDENTIFIER,
            Sector::Private => PRIVATE_ORGANIZATION_IDENTIFIER,
        }
    }

    fn organization_identifier_regex(self) -> &'static Regex {
        match self {
            Sector::Public => LazyLock::force(&PUBLIC_ORGANIZATION_IDENTIFIER_RE),
            Sector::Private => LazyLock::force(&PRIVATE_ORGANIZATION_IDENTIFIER_RE),
        }
    }
}

/// Check the subject DN. Every rule is evaluated; nothing short-circuits.
pub fn subject_dn(subject: &DistinguishedName, sector: Sector) -> Vec<Check> {
    let mut checks = Vec::new();

    for attr in NOT_ALLOWED_ATTRIBUTES {
        let absent = !subject.contains(attr);
        checks.push(Check::verify(
            format!(
                "SubjectDN must not contain name attribute [{}, {}]",
                attribute_name(attr),
                attr
            ),
            absent,
            absent,
        ));
    }

    for attr in MANDATORY_ATTRIBUTES {
        let present = subject.contains(attr);
        checks.push(Check::verify(
            format!(
                "SubjectDN must contain name attribute [{}, {}]",
                attribute_name(attr),
                attr
            ),
            present,
            present,
        ));
    }

    for attr in &subject.attributes {
        checks.push(Check::verify(
            format!("Name attribute [{}, {}] must have a value", attr.name, attr.oid),
            !attr.value.is_empty(),
            attr.value.as_str(),
        ));

        match attr.oid.as_str() {
            oid::ORGANIZATION_IDENTIFIER => checks.push(organization_identifier(attr, sector)),
            oid::COUNTRY => checks.push(country_code(attr)),
            _ => {}
        }
    }

    checks
}

fn organization_identifier(attr: &NameAttribute, sector: Sector) -> Check {
    let pattern = sector.organization_identifier_pattern();
    Check::verify(
        format!(
            "Value for name attribute [{}, {}] must match {}",
            attr.name, attr.oid, pattern
        ),
        sector.organization_identifier_regex().is_match(&attr.value),
        attr.value.as_str(),
    )
}

fn country_code(attr: &NameAttribute) -> Check {
    Check::verify(
        format!(
            "Value for name attribute [{}, {}] must be a valid country code",
            attr.name, attr.oid
        ),
        country::lookup(&attr.value).is_some(),
        attr.value.as_str(),
    )
}
