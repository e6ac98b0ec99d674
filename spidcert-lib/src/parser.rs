//! Certificate parsing from PEM and DER formats.

use crate::fields::{
    CertificateInfo, DateTime, DistinguishedName, Extension, ExtensionValue, Extensions, KeyUsage,
    NameAttribute, PolicyInformation, PolicyQualifier, PublicKeyInfo,
};
use crate::oid;
use crate::util;
use crate::SpidError;
use x509_parser::der_parser::asn1_rs::{Any, BmpString, Tag, UniversalString};
use x509_parser::prelude::*;

/// Parse a certificate from PEM or DER (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
pub fn parse_cert(input: &[u8]) -> Result<CertificateInfo, SpidError> {
    if input.is_empty() {
        return Err(SpidError::ParseError("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem(input)
    } else {
        parse_der(input)
    }
}

/// Parse a certificate from PEM format.
pub fn parse_pem(input: &[u8]) -> Result<CertificateInfo, SpidError> {
    let der = crate::convert::pem_to_der(input)?;
    parse_der(&der)
}

/// Parse a certificate from DER format.
pub fn parse_der(input: &[u8]) -> Result<CertificateInfo, SpidError> {
    let (_, x509) =
        X509Certificate::from_der(input).map_err(|e| SpidError::DerError(format!("{}", e)))?;
    build_certificate_info(&x509)
}

fn build_certificate_info(x509: &X509Certificate) -> Result<CertificateInfo, SpidError> {
    let tbs = &x509.tbs_certificate;

    let raw_version = tbs.version.0;
    if raw_version > 2 {
        return Err(SpidError::ParseError(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            raw_version + 1
        )));
    }

    let sig_oid = x509.signature_algorithm.algorithm.to_id_string();

    Ok(CertificateInfo {
        version: raw_version + 1,
        signature_algorithm: sig_algorithm_name(&sig_oid),
        signature_digest: sig_digest_name(&sig_oid).map(str::to_string),
        issuer: build_dn(&tbs.issuer),
        subject: build_dn(&tbs.subject),
        not_after: DateTime::from_timestamp(tbs.validity.not_after.timestamp()),
        public_key: build_public_key_info(&tbs.subject_pki),
        extensions: Extensions::new(tbs.extensions().iter().map(build_extension).collect()),
    })
}

fn sig_algorithm_name(oid_str: &str) -> String {
    match oid_str {
        oid::MD5_WITH_RSA => "md5WithRSAEncryption".into(),
        oid::SHA1_WITH_RSA => "sha1WithRSAEncryption".into(),
        oid::SHA224_WITH_RSA => "sha224WithRSAEncryption".into(),
        oid::SHA256_WITH_RSA => "sha256WithRSAEncryption".into(),
        oid::SHA384_WITH_RSA => "sha384WithRSAEncryption".into(),
        oid::SHA512_WITH_RSA => "sha512WithRSAEncryption".into(),
        oid::RSASSA_PSS => "rsassaPss".into(),
        oid::ECDSA_WITH_SHA1 => "ecdsa-with-SHA1".into(),
        oid::ECDSA_WITH_SHA224 => "ecdsa-with-SHA224".into(),
        oid::ECDSA_WITH_SHA256 => "ecdsa-with-SHA256".into(),
        oid::ECDSA_WITH_SHA384 => "ecdsa-with-SHA384".into(),
        oid::ECDSA_WITH_SHA512 => "ecdsa-with-SHA512".into(),
        oid::ED25519 => "Ed25519".into(),
        oid::ED448 => "Ed448".into(),
        other => other.to_string(),
    }
}

/// Hash algorithm bound to a signature algorithm OID.
///
/// RSASSA-PSS carries its hash in the parameters and EdDSA has none, so
/// both yield `None`.
fn sig_digest_name(oid_str: &str) -> Option<&'static str> {
    match oid_str {
        oid::MD5_WITH_RSA => Some("md5"),
        oid::SHA1_WITH_RSA | oid::ECDSA_WITH_SHA1 => Some("sha1"),
        oid::SHA224_WITH_RSA | oid::ECDSA_WITH_SHA224 => Some("sha224"),
        oid::SHA256_WITH_RSA | oid::ECDSA_WITH_SHA256 => Some("sha256"),
        oid::SHA384_WITH_RSA | oid::ECDSA_WITH_SHA384 => Some("sha384"),
        oid::SHA512_WITH_RSA | oid::ECDSA_WITH_SHA512 => Some("sha512"),
        _ => None,
    }
}

fn build_dn(name: &X509Name) -> DistinguishedName {
    let mut attributes = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let value = decode_string(attr.attr_value())
                .unwrap_or_else(|_| format!("#{}", hex::encode_upper(attr.as_slice())));
            attributes.push(NameAttribute::new(&attr.attr_type().to_id_string(), &value));
        }
    }
    DistinguishedName::new(attributes)
}

fn build_public_key_info(spki: &SubjectPublicKeyInfo) -> PublicKeyInfo {
    let oid_str = spki.algorithm.algorithm.to_id_string();

    let (algorithm, key_size, curve) = match oid_str.as_str() {
        oid::RSA_ENCRYPTION => (
            "RSA".into(),
            rsa_modulus_bits(&spki.subject_public_key.data),
            None,
        ),
        oid::EC_PUBLIC_KEY => {
            let curve_name = extract_ec_curve(&spki.algorithm);
            let key_size = match curve_name.as_str() {
                "P-256" => Some(256),
                "P-384" => Some(384),
                "P-521" => Some(521),
                _ => None,
            };
            ("EC".into(), key_size, Some(curve_name))
        }
        oid::ED25519 => ("Ed25519".into(), Some(256), None),
        oid::ED448 => ("Ed448".into(), Some(448), None),
        _ => (oid_str, None, None),
    };

    PublicKeyInfo {
        algorithm,
        key_size,
        curve,
    }
}

/// Bit length of the RSA modulus in a raw RSAPublicKey.
///
/// Returns `None` if the DER structure cannot be parsed.
fn rsa_modulus_bits(data: &[u8]) -> Option<u32> {
    let (_, parsed) = x509_parser::der_parser::parse_der(data).ok()?;
    let seq = parsed.as_sequence().ok()?;
    let bytes = seq.first()?.as_slice().ok()?;
    let first = bytes.iter().position(|&b| b != 0)?;
    let significant = bytes.get(first..)?;
    let top = significant.first()?;
    let bits = (significant.len() as u32 - 1) * 8 + (8 - top.leading_zeros());
    Some(bits)
}

fn extract_ec_curve(algo: &AlgorithmIdentifier) -> String {
    if let Some(params) = &algo.parameters {
        if let Ok(oid) = params.as_oid() {
            return match oid.to_id_string().as_str() {
                oid::CURVE_P256 => "P-256".into(),
                oid::CURVE_P384 => "P-384".into(),
                oid::CURVE_P521 => "P-521".into(),
                other => other.to_string(),
            };
        }
    }
    "unknown".into()
}

fn build_extension(ext: &X509Extension) -> Extension {
    let value = match ext.parsed_extension() {
        ParsedExtension::BasicConstraints(bc) => ExtensionValue::BasicConstraints {
            ca: bc.ca,
            path_len: bc.path_len_constraint,
        },
        ParsedExtension::KeyUsage(ku) => ExtensionValue::KeyUsage(KeyUsage {
            digital_signature: ku.digital_signature(),
            content_commitment: ku.non_repudiation(),
            key_encipherment: ku.key_encipherment(),
            data_encipherment: ku.data_encipherment(),
            key_agreement: ku.key_agreement(),
            key_cert_sign: ku.key_cert_sign(),
            crl_sign: ku.crl_sign(),
        }),
        ParsedExtension::CertificatePolicies(policies) => {
            match policies.iter().map(build_policy).collect::<Result<Vec<_>, _>>() {
                Ok(policies) => ExtensionValue::CertificatePolicies(policies),
                Err(reason) => ExtensionValue::Malformed(reason),
            }
        }
        ParsedExtension::ParseError { error } => ExtensionValue::Malformed(format!("{:?}", error)),
        _ => ExtensionValue::Other,
    };

    Extension {
        oid: ext.oid.to_id_string(),
        critical: ext.critical,
        value,
    }
}

fn build_policy(
    policy: &x509_parser::extensions::PolicyInformation<'_>,
) -> Result<PolicyInformation, String> {
    let oid = policy.policy_id.to_id_string();
    let qualifiers = policy
        .policy_qualifiers
        .iter()
        .flatten()
        .map(|q| build_qualifier(&oid, q))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PolicyInformation { oid, qualifiers })
}

fn build_qualifier(policy: &str, info: &PolicyQualifierInfo) -> Result<PolicyQualifier, String> {
    let qualifier_oid = info.policy_qualifier_id.to_id_string();
    match qualifier_oid.as_str() {
        oid::QT_CPS => {
            let uri = x509_parser::der_parser::parse_der(info.qualifier)
                .ok()
                .and_then(|(_, obj)| obj.as_str().ok().map(str::to_string))
                .unwrap_or_default();
            Ok(PolicyQualifier::Cps { uri })
        }
        oid::QT_UNOTICE => {
            let explicit_text = decode_user_notice(info.qualifier)
                .map_err(|e| format!("policy {}: invalid UserNotice: {}", policy, e))?;
            Ok(PolicyQualifier::UserNotice { explicit_text })
        }
        _ => Ok(PolicyQualifier::Other { oid: qualifier_oid }),
    }
}

/// Decode a DirectoryString or DisplayText value.
///
/// The 8-bit string types are read as UTF-8, falling back to Latin-1 for
/// T61String. BMPString and UniversalString are decoded from UTF-16 and
/// UCS-4. Any other tag is an error.
fn decode_string(value: &Any) -> Result<String, String> {
    match value.tag() {
        Tag::NumericString
        | Tag::PrintableString
        | Tag::VisibleString
        | Tag::Ia5String
        | Tag::Utf8String
        | Tag::GraphicString
        | Tag::GeneralString
        | Tag::VideotexString => std::str::from_utf8(value.data)
            .map(str::to_string)
            .map_err(|_| format!("invalid {:?} content", value.tag())),
        Tag::T61String => Ok(match std::str::from_utf8(value.data) {
            Ok(s) => s.to_string(),
            Err(_) => value.data.iter().copied().map(char::from).collect(),
        }),
        Tag::BmpString => BmpString::try_from(value)
            .map(|s| s.string())
            .map_err(|e| format!("invalid BmpString content: {}", e)),
        Tag::UniversalString => UniversalString::try_from(value)
            .map(|s| s.string())
            .map_err(|e| format!("invalid UniversalString content: {}", e)),
        tag => Err(format!("{:?} is not a string type", tag)),
    }
}

/// Decode a UserNotice and return its explicit text.
///
/// ```text
/// UserNotice ::= SEQUENCE {
///      noticeRef        NoticeReference OPTIONAL,
///      explicitText     DisplayText OPTIONAL }
/// ```
fn decode_user_notice(data: &[u8]) -> Result<Option<String>, String> {
    let (_, notice) = Any::from_der(data).map_err(|e| format!("{:?}", e))?;
    if notice.tag() != Tag::Sequence {
        return Err("expected a SEQUENCE".to_string());
    }

    let mut explicit_text = None;
    let mut rest = notice.data;
    while !rest.is_empty() {
        let (next, item) = Any::from_der(rest).map_err(|e| format!("{:?}", e))?;
        rest = next;
        // noticeRef is itself a SEQUENCE; only explicitText is inspected
        if item.tag() == Tag::Sequence {
            continue;
        }
        let text = decode_string(&item).map_err(|e| format!("explicitText: {}", e))?;
        explicit_text = Some(text);
    }
    Ok(explicit_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_notice_with_explicit_text() {
        // SEQUENCE { VisibleString "agIDcert" }
        let der = [
            0x30, 0x0a, 0x1a, 0x08, b'a', b'g', b'I', b'D', b'c', b'e', b'r', b't',
        ];
        assert_eq!(decode_user_notice(&der).unwrap().as_deref(), Some("agIDcert"));
    }

    #[test]
    fn user_notice_skips_notice_ref() {
        // SEQUENCE { SEQUENCE { UTF8String "O", SEQUENCE { INTEGER 1 } }, UTF8String "hi" }
        let der = [
            0x30, 0x0e, 0x30, 0x08, 0x0c, 0x01, b'O', 0x30, 0x03, 0x02, 0x01, 0x01, 0x0c, 0x02,
            b'h', b'i',
        ];
        assert_eq!(decode_user_notice(&der).unwrap().as_deref(), Some("hi"));
    }

    #[test]
    fn empty_user_notice_has_no_text() {
        assert_eq!(decode_user_notice(&[0x30, 0x00]).unwrap(), None);
    }

    #[test]
    fn user_notice_with_bmp_text() {
        // SEQUENCE { BMPString "agID" }
        let der = [
            0x30, 0x0a, 0x1e, 0x08, 0x00, b'a', 0x00, b'g', 0x00, b'I', 0x00, b'D',
        ];
        assert_eq!(decode_user_notice(&der).unwrap().as_deref(), Some("agID"));
    }

    #[test]
    fn user_notice_with_odd_length_bmp_text_is_rejected() {
        // SEQUENCE { BMPString with a lone high surrogate }
        let der = [0x30, 0x04, 0x1e, 0x02, 0xd8, 0x00];
        assert!(decode_user_notice(&der).is_err());
    }

    fn any(der: &[u8]) -> Any<'_> {
        Any::from_der(der).unwrap().1
    }

    #[test]
    fn directory_strings_decode_to_text() {
        // PrintableString "IT"
        assert_eq!(decode_string(&any(&[0x13, 0x02, b'I', b'T'])).unwrap(), "IT");
        // BMPString "Roma"
        let bmp = [
            0x1e, 0x08, 0x00, b'R', 0x00, b'o', 0x00, b'm', 0x00, b'a',
        ];
        assert_eq!(decode_string(&any(&bmp)).unwrap(), "Roma");
        // UniversalString "IT"
        let universal = [0x1c, 0x08, 0, 0, 0, b'I', 0, 0, 0, b'T'];
        assert_eq!(decode_string(&any(&universal)).unwrap(), "IT");
        // T61String "Forl\xec" in Latin-1
        let t61 = [0x14, 0x05, b'F', b'o', b'r', b'l', 0xec];
        assert_eq!(decode_string(&any(&t61)).unwrap(), "Forl\u{ec}");
        // empty BMPString stays empty
        assert_eq!(decode_string(&any(&[0x1e, 0x00])).unwrap(), "");
    }

    #[test]
    fn non_string_values_are_rejected() {
        assert!(decode_string(&any(&[0x02, 0x01, 0x05])).is_err());
    }

    #[test]
    fn undecodable_dn_value_is_rendered_as_hex() {
        // Name ::= SEQUENCE { SET { SEQUENCE { OID 2.5.4.3, INTEGER 5 } } }
        let der = [
            0x30, 0x0c, 0x31, 0x0a, 0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x03, 0x02, 0x01, 0x05,
        ];
        let (_, name) = X509Name::from_der(&der).unwrap();
        let dn = build_dn(&name);
        assert_eq!(dn.get(oid::COMMON_NAME), Some("#05"));
    }

    #[test]
    fn user_notice_that_is_not_a_sequence_is_rejected() {
        assert!(decode_user_notice(&[0x02, 0x01, 0x05]).is_err());
    }

    #[test]
    fn user_notice_with_integer_text_is_rejected() {
        assert!(decode_user_notice(&[0x30, 0x03, 0x02, 0x01, 0x05]).is_err());
    }

    #[test]
    fn digest_names_follow_signature_algorithm() {
        assert_eq!(sig_digest_name(oid::SHA256_WITH_RSA), Some("sha256"));
        assert_eq!(sig_digest_name(oid::ECDSA_WITH_SHA384), Some("sha384"));
        assert_eq!(sig_digest_name(oid::SHA1_WITH_RSA), Some("sha1"));
        assert_eq!(sig_digest_name(oid::ED25519), None);
    }

    #[test]
    fn modulus_bits_are_exact() {
        // SEQUENCE { INTEGER 0x01ff01 (17 bits), INTEGER 3 }
        let der = [0x30, 0x08, 0x02, 0x03, 0x01, 0xff, 0x01, 0x02, 0x01, 0x03];
        assert_eq!(rsa_modulus_bits(&der), Some(17));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse_cert(b""), Err(SpidError::ParseError(_))));
    }

    #[test]
    fn truncated_der_is_rejected() {
        assert!(matches!(
            parse_cert(&[0x30, 0x82, 0x01]),
            Err(SpidError::DerError(_))
        ));
    }
}
