//! Certificate data types and field extraction.

use crate::oid;
use std::fmt;

/// A decoded X.509 certificate, reduced to the fields the SPID profile
/// inspects.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    /// Certificate version (1, 2, or 3).
    pub version: u32,
    /// Signature algorithm name (e.g. "sha256WithRSAEncryption").
    pub signature_algorithm: String,
    /// Hash algorithm used by the signature (e.g. "sha256"), when known.
    pub signature_digest: Option<String>,
    /// Issuer distinguished name.
    pub issuer: DistinguishedName,
    /// Subject distinguished name.
    pub subject: DistinguishedName,
    /// Validity end date.
    pub not_after: DateTime,
    /// Public key information.
    pub public_key: PublicKeyInfo,
    /// X.509v3 extensions.
    pub extensions: Extensions,
}

/// Distinguished name with ordered attributes.
#[derive(Debug, Clone, Default)]
pub struct DistinguishedName {
    pub attributes: Vec<NameAttribute>,
}

/// One attribute of a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAttribute {
    /// Dotted OID of the attribute type.
    pub oid: String,
    /// Long attribute name (e.g. "organizationIdentifier"), or the OID.
    pub name: String,
    /// Decoded string value. A value that is not a string, or cannot be
    /// decoded, is kept as `#` followed by the upper-case hex of its content.
    pub value: String,
}

impl NameAttribute {
    pub fn new(oid: &str, value: &str) -> Self {
        Self {
            oid: oid.to_string(),
            name: crate::util::attribute_name(oid),
            value: value.to_string(),
        }
    }
}

impl DistinguishedName {
    pub fn new(attributes: Vec<NameAttribute>) -> Self {
        Self { attributes }
    }

    /// Return true if at least one attribute has the given OID.
    pub fn contains(&self, oid: &str) -> bool {
        self.attributes.iter().any(|a| a.oid == oid)
    }

    /// Return the value of the first attribute with the given OID.
    pub fn get(&self, oid: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.oid == oid)
            .map(|a| a.value.as_str())
    }

    /// Format as a comma-separated one-line string (`CN = x, C = IT`),
    /// escaping commas, equals signs and backslashes in values.
    pub fn to_oneline(&self) -> String {
        let mut result = String::new();
        for (i, attr) in self.attributes.iter().enumerate() {
            if i > 0 {
                result.push_str(", ");
            }
            result.push_str(&attr.name);
            result.push_str(" = ");
            for ch in attr.value.chars() {
                match ch {
                    '\\' => result.push_str("\\\\"),
                    ',' => result.push_str("\\,"),
                    '=' => result.push_str("\\="),
                    _ => result.push(ch),
                }
            }
        }
        result
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_oneline())
    }
}

/// Public key information.
#[derive(Debug, Clone)]
pub struct PublicKeyInfo {
    /// Algorithm name: "RSA", "EC", "Ed25519", etc.
    pub algorithm: String,
    /// Key size in bits (e.g., 2048 for RSA, 256 for P-256).
    pub key_size: Option<u32>,
    /// Named curve for EC keys (e.g., "P-256", "P-384").
    pub curve: Option<String>,
}

/// Date-time representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTime {
    /// ISO 8601 formatted string.
    pub iso8601: String,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl DateTime {
    pub fn from_timestamp(timestamp: i64) -> Self {
        Self {
            iso8601: crate::util::format_iso8601(timestamp),
            timestamp,
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso8601)
    }
}

/// Extensions the profile looks up by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    BasicConstraints,
    KeyUsage,
    CertificatePolicies,
}

impl ExtensionKind {
    pub fn oid(self) -> &'static str {
        match self {
            ExtensionKind::BasicConstraints => oid::EXT_BASIC_CONSTRAINTS,
            ExtensionKind::KeyUsage => oid::EXT_KEY_USAGE,
            ExtensionKind::CertificatePolicies => oid::EXT_CERTIFICATE_POLICIES,
        }
    }

    /// RFC 5280 ASN.1 name, as used in report messages.
    pub fn name(self) -> &'static str {
        match self {
            ExtensionKind::BasicConstraints => "basicConstraints",
            ExtensionKind::KeyUsage => "keyUsage",
            ExtensionKind::CertificatePolicies => "certificatePolicies",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A structurally malformed extension.
///
/// Distinct from a missing extension, which is an ordinary predicate
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {extension} extension: {reason}")]
pub struct ExtensionError {
    pub extension: String,
    pub reason: String,
}

impl ExtensionError {
    pub fn new(extension: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            reason: reason.into(),
        }
    }
}

/// The extensions block of a certificate, in encoding order.
#[derive(Debug, Clone, Default)]
pub struct Extensions(pub Vec<Extension>);

impl Extensions {
    pub fn new(extensions: Vec<Extension>) -> Self {
        Self(extensions)
    }

    /// Look up an extension by kind.
    ///
    /// Returns `Ok(None)` when the extension is absent, and an error when it
    /// appears more than once (RFC 5280 Section 4.2) or could not be decoded.
    pub fn get(&self, kind: ExtensionKind) -> Result<Option<&Extension>, ExtensionError> {
        let mut matching = self.0.iter().filter(|e| e.oid == kind.oid());
        let Some(ext) = matching.next() else {
            return Ok(None);
        };
        if matching.next().is_some() {
            return Err(ExtensionError::new(
                kind.name(),
                "extension appears more than once",
            ));
        }
        if let ExtensionValue::Malformed(reason) = &ext.value {
            return Err(ExtensionError::new(kind.name(), reason.clone()));
        }
        Ok(Some(ext))
    }
}

/// A certificate extension.
#[derive(Debug, Clone)]
pub struct Extension {
    /// OID as a dotted-decimal string.
    pub oid: String,
    /// Whether this extension is marked critical.
    pub critical: bool,
    /// Parsed extension value.
    pub value: ExtensionValue,
}

/// Strongly-typed extension values.
#[derive(Debug, Clone)]
pub enum ExtensionValue {
    BasicConstraints {
        ca: bool,
        path_len: Option<u32>,
    },
    KeyUsage(KeyUsage),
    CertificatePolicies(Vec<PolicyInformation>),
    /// The decoder recognized the extension but its content is invalid.
    Malformed(String),
    /// Extensions the profile does not inspect.
    Other,
}

/// Key Usage bits (RFC 5280 Section 4.2.1.3).
///
/// `content_commitment` is the bit formerly named nonRepudiation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyUsage {
    pub digital_signature: bool,
    pub content_commitment: bool,
    pub key_encipherment: bool,
    pub data_encipherment: bool,
    pub key_agreement: bool,
    pub key_cert_sign: bool,
    pub crl_sign: bool,
}

/// One entry of the Certificate Policies extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyInformation {
    /// Policy OID as a dotted-decimal string.
    pub oid: String,
    /// Qualifiers in encoding order. Empty when the entry has none.
    pub qualifiers: Vec<PolicyQualifier>,
}

/// A policy qualifier (RFC 5280 Section 4.2.1.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyQualifier {
    Cps {
        uri: String,
    },
    UserNotice {
        explicit_text: Option<String>,
    },
    Other {
        oid: String,
    },
}

impl CertificateInfo {
    /// Return the subject as a one-line string.
    pub fn subject_string(&self) -> String {
        self.subject.to_oneline()
    }

    /// Return the issuer as a one-line string.
    pub fn issuer_string(&self) -> String {
        self.issuer.to_oneline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(oid: &str, value: ExtensionValue) -> Extension {
        Extension {
            oid: oid.to_string(),
            critical: false,
            value,
        }
    }

    #[test]
    fn lookup_absent_extension() {
        let exts = Extensions::new(vec![ext(oid::EXT_SUBJECT_KEY_ID, ExtensionValue::Other)]);
        assert!(matches!(exts.get(ExtensionKind::KeyUsage), Ok(None)));
    }

    #[test]
    fn lookup_duplicate_extension_is_structural_error() {
        let ku = ExtensionValue::KeyUsage(KeyUsage::default());
        let exts = Extensions::new(vec![
            ext(oid::EXT_KEY_USAGE, ku.clone()),
            ext(oid::EXT_KEY_USAGE, ku),
        ]);
        let err = exts.get(ExtensionKind::KeyUsage).unwrap_err();
        assert_eq!(err.extension, "keyUsage");
    }

    #[test]
    fn lookup_malformed_extension_is_structural_error() {
        let exts = Extensions::new(vec![ext(
            oid::EXT_CERTIFICATE_POLICIES,
            ExtensionValue::Malformed("bad sequence".into()),
        )]);
        let err = exts.get(ExtensionKind::CertificatePolicies).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed certificatePolicies extension: bad sequence"
        );
    }

    #[test]
    fn dn_lookup_and_oneline() {
        let dn = DistinguishedName::new(vec![
            NameAttribute::new(oid::COMMON_NAME, "Acme, Inc"),
            NameAttribute::new(oid::COUNTRY, "IT"),
        ]);
        assert!(dn.contains(oid::COUNTRY));
        assert_eq!(dn.get(oid::COMMON_NAME), Some("Acme, Inc"));
        assert_eq!(dn.to_oneline(), "commonName = Acme\\, Inc, countryName = IT");
    }
}
