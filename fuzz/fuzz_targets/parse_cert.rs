#![no_main]

use libfuzzer_sys::fuzz_target;
use spidcert_lib::{parse_cert, ExtensionKind};

fuzz_target!(|data: &[u8]| {
    // The parser must never panic, regardless of input.
    if let Ok(cert) = parse_cert(data) {
        let _ = cert.subject_string();
        let _ = cert.issuer_string();
        for kind in [
            ExtensionKind::BasicConstraints,
            ExtensionKind::KeyUsage,
            ExtensionKind::CertificatePolicies,
        ] {
            let _ = cert.extensions.get(kind);
        }
    }
});
