//! Profile parameters: the sector and the cryptographic requirements.

use crate::SpidError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Issuance sector of the service provider.
///
/// Selects the organizationIdentifier pattern and the sector policy OIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sector {
    Public,
    Private,
}

impl Sector {
    pub fn as_str(self) -> &'static str {
        match self {
            Sector::Public => "public",
            Sector::Private => "private",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sector {
    type Err = SpidError;

    /// Case-insensitive, like the sector argument has always been treated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Sector::Public),
            "private" => Ok(Sector::Private),
            _ => Err(SpidError::InvalidSector(s.to_string())),
        }
    }
}

/// Key and digest requirements applied by the key and digest rules.
///
/// The defaults are the SPID service provider requirements: RSA keys of at
/// least 2048 bits signed with a SHA-2 digest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    /// Accepted public key algorithms ("RSA", "EC").
    pub allowed_key_types: Vec<String>,
    /// Minimum RSA modulus length in bits.
    pub min_rsa_bits: u32,
    /// Accepted named curves, consulted only when "EC" is allowed.
    pub allowed_curves: Vec<String>,
    /// Accepted signature digests, lowercase ("sha256").
    pub allowed_digests: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            allowed_key_types: vec!["RSA".into()],
            min_rsa_bits: 2048,
            allowed_curves: vec!["P-256".into(), "P-384".into(), "P-521".into()],
            allowed_digests: vec!["sha256".into(), "sha384".into(), "sha512".into()],
        }
    }
}

impl Profile {
    /// Parse a profile from YAML. Missing fields keep their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, SpidError> {
        let profile: Profile = serde_yaml::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, SpidError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            SpidError::Profile(msg) => {
                SpidError::Profile(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    fn validate(&self) -> Result<(), SpidError> {
        if self.allowed_key_types.is_empty() {
            return Err(SpidError::Profile(
                "allowed_key_types must not be empty".into(),
            ));
        }
        if self.allowed_digests.is_empty() {
            return Err(SpidError::Profile("allowed_digests must not be empty".into()));
        }
        if let Some(unknown) = self
            .allowed_key_types
            .iter()
            .find(|k| k.as_str() != "RSA" && k.as_str() != "EC")
        {
            return Err(SpidError::Profile(format!(
                "unsupported key type '{}' (expected RSA or EC)",
                unknown
            )));
        }
        Ok(())
    }
}
