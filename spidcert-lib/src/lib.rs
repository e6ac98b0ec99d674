//! spidcert-lib: Library for checking X.509 certificates against the SPID
//! service provider profile.
//!
//! A certificate is decoded once into a [`CertificateInfo`], evaluated by a
//! fixed sequence of rules (key, digest, subject DN, expiration and the
//! basicConstraints, keyUsage and certificatePolicies extensions) and the
//! outcomes are collected into a [`Report`] that can be rendered as JSON,
//! plain text, XML or YAML.

pub mod country;
mod convert;
mod fields;
pub mod oid;
mod parser;
mod profile;
mod report;
pub mod rules;
mod serializer;
mod util;
mod validate;

pub use convert::pem_to_der;
pub use fields::{
    CertificateInfo, DateTime, DistinguishedName, Extension, ExtensionError, ExtensionKind,
    ExtensionValue, Extensions, KeyUsage, NameAttribute, PolicyInformation, PolicyQualifier,
    PublicKeyInfo,
};
pub use parser::{parse_cert, parse_der, parse_pem};
pub use profile::{Profile, Sector};
pub use report::{Check, Outcome, Report, Test, Value};
pub use serializer::{serialize, Format};
pub use validate::{
    validate_bytes, validate_cert, validate_file, Rule, RuleContext, RuleGroup, ValidateOptions,
    CRITICAL_ERROR, RULES,
};

/// Errors returned by spidcert-lib.
#[derive(Debug, thiserror::Error)]
pub enum SpidError {
    #[error("Failed to load certificate {target}: {reason}")]
    CertificateLoad { target: String, reason: String },

    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("Invalid sector: {0} (expected public or private)")]
    InvalidSector(String),

    #[error("Unsupported format: {0} (expected json, txt, xml or yaml)")]
    UnsupportedFormat(String),

    #[error("Invalid profile: {0}")]
    Profile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
