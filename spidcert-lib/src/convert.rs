//! PEM to DER conversion.

use crate::SpidError;

/// PEM labels accepted for a certificate block.
const CERTIFICATE_LABELS: [&str; 3] = ["CERTIFICATE", "TRUSTED CERTIFICATE", "X509 CERTIFICATE"];

/// Convert a PEM-encoded certificate to DER bytes.
///
/// Only the first PEM block is considered; its label must name a
/// certificate.
pub fn pem_to_der(pem: &[u8]) -> Result<Vec<u8>, SpidError> {
    let (_, block) = x509_parser::pem::parse_x509_pem(pem)
        .map_err(|e| SpidError::PemError(format!("{}", e)))?;

    if !CERTIFICATE_LABELS.contains(&block.label.as_str()) {
        return Err(SpidError::PemError(format!(
            "expected CERTIFICATE, got {}",
            block.label
        )));
    }

    Ok(block.contents)
}
