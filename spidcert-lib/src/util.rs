//! Shared helpers: PEM sniffing, OID naming and timestamp formatting.

use crate::oid;

/// Return true if the input looks like PEM (starts with `-----BEGIN`
/// after leading whitespace).
pub fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Map a Distinguished Name attribute OID to its long name.
///
/// Unknown OIDs are returned as the dotted string itself.
pub fn attribute_name(oid_str: &str) -> String {
    match oid_str {
        oid::COMMON_NAME => "commonName".into(),
        oid::SURNAME => "surname".into(),
        oid::SERIAL_NUMBER => "serialNumber".into(),
        oid::COUNTRY => "countryName".into(),
        oid::LOCALITY => "localityName".into(),
        oid::STATE_OR_PROVINCE => "stateOrProvinceName".into(),
        oid::STREET_ADDRESS => "streetAddress".into(),
        oid::ORGANIZATION => "organizationName".into(),
        oid::ORGANIZATIONAL_UNIT => "organizationalUnitName".into(),
        oid::TITLE => "title".into(),
        oid::NAME => "name".into(),
        oid::GIVEN_NAME => "givenName".into(),
        oid::INITIALS => "initials".into(),
        oid::PSEUDONYM => "pseudonym".into(),
        oid::URI => "uri".into(),
        oid::ORGANIZATION_IDENTIFIER => "organizationIdentifier".into(),
        oid::EMAIL_ADDRESS => "emailAddress".into(),
        oid::DOMAIN_COMPONENT => "domainComponent".into(),
        other => other.to_string(),
    }
}

/// Format a Unix timestamp as ISO 8601 in UTC (`2026-10-19T20:11:00Z`).
///
/// Falls back to the raw number when the timestamp is out of range.
pub fn format_iso8601(ts: i64) -> String {
    match ::time::OffsetDateTime::from_unix_timestamp(ts) {
        Ok(dt) => format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        Err(_) => format!("{}", ts),
    }
}

/// Current time as a Unix timestamp.
pub fn now_timestamp() -> i64 {
    ::time::OffsetDateTime::now_utc().unix_timestamp()
}
