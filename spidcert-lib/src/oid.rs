//! Centralized OID string constants used throughout spidcert-lib.
//!
//! Object Identifiers (OIDs) are defined by ITU-T X.660 and referenced
//! by RFC 5280 (X.509), RFC 3279 (algorithms), RFC 5480 (ECC), RFC 8410
//! (EdDSA) and by the AgID certificate profile for SPID service providers.

// ── X.509 Distinguished Name attributes (RFC 4519 / X.520) ──────────────

pub const COMMON_NAME: &str = "2.5.4.3";
pub const SURNAME: &str = "2.5.4.4";
pub const SERIAL_NUMBER: &str = "2.5.4.5";
pub const COUNTRY: &str = "2.5.4.6";
pub const LOCALITY: &str = "2.5.4.7";
pub const STATE_OR_PROVINCE: &str = "2.5.4.8";
pub const STREET_ADDRESS: &str = "2.5.4.9";
pub const ORGANIZATION: &str = "2.5.4.10";
pub const ORGANIZATIONAL_UNIT: &str = "2.5.4.11";
pub const TITLE: &str = "2.5.4.12";
pub const NAME: &str = "2.5.4.41";
pub const GIVEN_NAME: &str = "2.5.4.42";
pub const INITIALS: &str = "2.5.4.43";
pub const PSEUDONYM: &str = "2.5.4.65";
pub const URI: &str = "2.5.4.83";
pub const ORGANIZATION_IDENTIFIER: &str = "2.5.4.97";
pub const EMAIL_ADDRESS: &str = "1.2.840.113549.1.9.1"; // PKCS#9
pub const DOMAIN_COMPONENT: &str = "0.9.2342.19200300.100.1.25";

// ── Signature algorithms ─────────────────────────────────────────────────

pub const MD5_WITH_RSA: &str = "1.2.840.113549.1.1.4";
pub const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
pub const RSASSA_PSS: &str = "1.2.840.113549.1.1.10";
pub const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
pub const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
pub const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
pub const SHA224_WITH_RSA: &str = "1.2.840.113549.1.1.14";
pub const ECDSA_WITH_SHA1: &str = "1.2.840.10045.4.1";
pub const ECDSA_WITH_SHA224: &str = "1.2.840.10045.4.3.1";
pub const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
pub const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
pub const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
pub const ED25519: &str = "1.3.101.112";
pub const ED448: &str = "1.3.101.113";

// ── Public key types ─────────────────────────────────────────────────────

pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
pub const EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";

// ── Named elliptic curves ────────────────────────────────────────────────

pub const CURVE_P256: &str = "1.2.840.10045.3.1.7";
pub const CURVE_P384: &str = "1.3.132.0.34";
pub const CURVE_P521: &str = "1.3.132.0.35";

// ── X.509v3 extensions (RFC 5280 Section 4.2) ───────────────────────────

pub const EXT_SUBJECT_KEY_ID: &str = "2.5.29.14";
pub const EXT_KEY_USAGE: &str = "2.5.29.15";
pub const EXT_SUBJECT_ALT_NAME: &str = "2.5.29.17";
pub const EXT_BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const EXT_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const EXT_CERTIFICATE_POLICIES: &str = "2.5.29.32";
pub const EXT_AUTHORITY_KEY_ID: &str = "2.5.29.35";
pub const EXT_EXTENDED_KEY_USAGE: &str = "2.5.29.37";
pub const EXT_AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";

// ── Policy qualifiers (RFC 5280 Section 4.2.1.4) ─────────────────────────

pub const QT_CPS: &str = "1.3.6.1.5.5.7.2.1";
pub const QT_UNOTICE: &str = "1.3.6.1.5.5.7.2.2";

// ── AgID certificate policies for SPID ───────────────────────────────────

pub const POLICY_AGID_CERT: &str = "1.3.76.16.6";
pub const POLICY_SPID_PUBLIC_SP: &str = "1.3.76.16.4.2.1";
pub const POLICY_SPID_PRIVATE_SP: &str = "1.3.76.16.4.3.1";
