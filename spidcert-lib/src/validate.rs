//! Validation orchestrator: runs the rules in order and builds the report.

use crate::fields::CertificateInfo;
use crate::profile::{Profile, Sector};
use crate::report::{Check, Report, Test};
use crate::rules::{self, RuleResult};
use crate::{parser, util, SpidError};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Description of the test that replaces an aborted rule group.
pub const CRITICAL_ERROR: &str = "Critical error while checking x509 extensions";

/// Parameters of one validation run.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub sector: Sector,
    pub profile: Profile,
    /// Evaluation time as a Unix timestamp. `None` means now.
    pub at_time: Option<i64>,
}

impl ValidateOptions {
    pub fn new(sector: Sector) -> Self {
        Self {
            sector,
            profile: Profile::default(),
            at_time: None,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn at_time(mut self, timestamp: i64) -> Self {
        self.at_time = Some(timestamp);
        self
    }
}

/// What a rule can see besides the certificate.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub sector: Sector,
    pub profile: &'a Profile,
    /// Evaluation time as a Unix timestamp.
    pub now: i64,
}

/// Rules sharing a group are skipped together once one of them fails
/// structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleGroup {
    Certificate,
    Extensions,
}

/// One step of the validation sequence.
pub struct Rule {
    /// Test description used in the report.
    pub description: &'static str,
    pub group: RuleGroup,
    pub run: fn(&CertificateInfo, &RuleContext<'_>) -> RuleResult,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("description", &self.description)
            .field("group", &self.group)
            .finish()
    }
}

/// The validation sequence, in report order.
pub static RULES: &[Rule] = &[
    Rule {
        description: "Checking the key type and size",
        group: RuleGroup::Certificate,
        run: run_key,
    },
    Rule {
        description: "Checking the signature digest algorithm",
        group: RuleGroup::Certificate,
        run: run_digest,
    },
    Rule {
        description: "Checking the SubjectDN",
        group: RuleGroup::Certificate,
        run: run_subject_dn,
    },
    Rule {
        description: "Checking the certificate expiration",
        group: RuleGroup::Certificate,
        run: run_expiration,
    },
    Rule {
        description: "Checking basicConstraints x509 extension",
        group: RuleGroup::Extensions,
        run: run_basic_constraints,
    },
    Rule {
        description: "Checking keyUsage x509 extension",
        group: RuleGroup::Extensions,
        run: run_key_usage,
    },
    Rule {
        description: "Checking certificatePolicies x509 extension",
        group: RuleGroup::Extensions,
        run: run_certificate_policies,
    },
];

fn run_key(cert: &CertificateInfo, ctx: &RuleContext<'_>) -> RuleResult {
    Ok(rules::key_type_and_size(&cert.public_key, ctx.profile))
}

fn run_digest(cert: &CertificateInfo, ctx: &RuleContext<'_>) -> RuleResult {
    Ok(rules::digest_algorithm(
        cert.signature_digest.as_deref(),
        &cert.signature_algorithm,
        ctx.profile,
    ))
}

fn run_subject_dn(cert: &CertificateInfo, ctx: &RuleContext<'_>) -> RuleResult {
    Ok(rules::subject_dn(&cert.subject, ctx.sector))
}

fn run_expiration(cert: &CertificateInfo, ctx: &RuleContext<'_>) -> RuleResult {
    Ok(rules::not_expired(&cert.not_after, ctx.now))
}

fn run_basic_constraints(cert: &CertificateInfo, _ctx: &RuleContext<'_>) -> RuleResult {
    rules::basic_constraints(&cert.extensions)
}

fn run_key_usage(cert: &CertificateInfo, _ctx: &RuleContext<'_>) -> RuleResult {
    rules::key_usage(&cert.extensions)
}

fn run_certificate_policies(cert: &CertificateInfo, ctx: &RuleContext<'_>) -> RuleResult {
    rules::certificate_policies(&cert.extensions, ctx.sector)
}

/// Validate a decoded certificate.
///
/// Never fails: a structurally malformed extension turns the rest of its
/// group into a single [`CRITICAL_ERROR`] test.
pub fn validate_cert(target: &str, cert: &CertificateInfo, opts: &ValidateOptions) -> Report {
    let ctx = RuleContext {
        sector: opts.sector,
        profile: &opts.profile,
        now: opts.at_time.unwrap_or_else(util::now_timestamp),
    };

    let mut report = Report::new(target);
    let mut aborted: Option<RuleGroup> = None;

    for rule in RULES {
        if aborted == Some(rule.group) {
            debug!(rule = rule.description, "skipped");
            continue;
        }
        match (rule.run)(cert, &ctx) {
            Ok(checks) => {
                let test = Test::with_checks(rule.description, checks);
                log_test(&test);
                report.add_test(test);
            }
            Err(e) => {
                error!(rule = rule.description, error = %e, "{}", CRITICAL_ERROR);
                let mut test = Test::new(CRITICAL_ERROR);
                test.add_check(Check::verify(rule.description, false, e.to_string()));
                report.add_test(test);
                aborted = Some(rule.group);
            }
        }
    }

    if report.is_success() {
        info!(cert = %report.target(), "certificate is compliant");
    } else {
        warn!(
            cert = %report.target(),
            failures = report.failures(),
            "certificate is not compliant"
        );
    }
    report
}

fn log_test(test: &Test) {
    if test.is_success() {
        info!("{}: success", test.description());
    } else {
        error!("{}: failure", test.description());
    }
    for check in test.checks() {
        if check.is_success() {
            debug!("    {}", check.description());
        } else {
            error!("    {}", check.description());
        }
    }
}

/// Decode `input` (PEM or DER) and validate it.
pub fn validate_bytes(
    target: &str,
    input: &[u8],
    opts: &ValidateOptions,
) -> Result<Report, SpidError> {
    let cert = parser::parse_cert(input).map_err(|e| SpidError::CertificateLoad {
        target: target.to_string(),
        reason: e.to_string(),
    })?;
    debug!(cert = target, subject = %cert.subject, "certificate decoded");
    Ok(validate_cert(target, &cert, opts))
}

/// Read, decode and validate a certificate file.
///
/// The report target is the absolute path of the file.
pub fn validate_file(path: &Path, opts: &ValidateOptions) -> Result<Report, SpidError> {
    let target = std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();
    let input = std::fs::read(path).map_err(|e| SpidError::CertificateLoad {
        target: target.clone(),
        reason: e.to_string(),
    })?;
    validate_bytes(&target, &input, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{
        DateTime, DistinguishedName, Extension, ExtensionValue, Extensions, KeyUsage,
        NameAttribute, PolicyInformation, PolicyQualifier, PublicKeyInfo,
    };
    use crate::oid;
    use crate::report::Value;

    const NOW: i64 = 1_700_000_000;

    fn notice(text: &str) -> Vec<PolicyQualifier> {
        vec![PolicyQualifier::UserNotice {
            explicit_text: Some(text.to_string()),
        }]
    }

    fn compliant_cert() -> CertificateInfo {
        let subject = DistinguishedName::new(vec![
            NameAttribute::new(oid::COMMON_NAME, "Comune di Roma"),
            NameAttribute::new(oid::ORGANIZATION, "Comune di Roma"),
            NameAttribute::new(oid::URI, "https://sp.example.it"),
            NameAttribute::new(oid::ORGANIZATION_IDENTIFIER, "PA:IT-c_h501"),
            NameAttribute::new(oid::COUNTRY, "IT"),
            NameAttribute::new(oid::LOCALITY, "Roma"),
        ]);
        CertificateInfo {
            version: 3,
            signature_algorithm: "sha256WithRSAEncryption".into(),
            signature_digest: Some("sha256".into()),
            issuer: subject.clone(),
            subject,
            not_after: DateTime::from_timestamp(NOW + 86_400),
            public_key: PublicKeyInfo {
                algorithm: "RSA".into(),
                key_size: Some(2048),
                curve: None,
            },
            extensions: Extensions::new(vec![
                Extension {
                    oid: oid::EXT_BASIC_CONSTRAINTS.into(),
                    critical: false,
                    value: ExtensionValue::BasicConstraints {
                        ca: false,
                        path_len: None,
                    },
                },
                Extension {
                    oid: oid::EXT_KEY_USAGE.into(),
                    critical: true,
                    value: ExtensionValue::KeyUsage(KeyUsage {
                        digital_signature: true,
                        content_commitment: true,
                        ..KeyUsage::default()
                    }),
                },
                Extension {
                    oid: oid::EXT_CERTIFICATE_POLICIES.into(),
                    critical: false,
                    value: ExtensionValue::CertificatePolicies(vec![
                        PolicyInformation {
                            oid: oid::POLICY_AGID_CERT.into(),
                            qualifiers: notice("agIDcert"),
                        },
                        PolicyInformation {
                            oid: oid::POLICY_SPID_PUBLIC_SP.into(),
                            qualifiers: notice("cert_SP_Pub"),
                        },
                    ]),
                },
            ]),
        }
    }

    fn opts() -> ValidateOptions {
        ValidateOptions::new(Sector::Public).at_time(NOW)
    }

    fn descriptions(report: &Report) -> Vec<&str> {
        report.tests().iter().map(Test::description).collect()
    }

    fn replace_extension(cert: &mut CertificateInfo, oid: &str, value: ExtensionValue) {
        for ext in cert.extensions.0.iter_mut() {
            if ext.oid == oid {
                ext.value = value.clone();
            }
        }
    }

    #[test]
    fn rule_order() {
        let names: Vec<_> = RULES.iter().map(|r| r.description).collect();
        assert_eq!(
            names,
            [
                "Checking the key type and size",
                "Checking the signature digest algorithm",
                "Checking the SubjectDN",
                "Checking the certificate expiration",
                "Checking basicConstraints x509 extension",
                "Checking keyUsage x509 extension",
                "Checking certificatePolicies x509 extension",
            ]
        );
        assert_eq!(
            RULES
                .iter()
                .filter(|r| r.group == RuleGroup::Extensions)
                .count(),
            3
        );
    }

    #[test]
    fn compliant_certificate_passes() {
        let report = validate_cert("mem", &compliant_cert(), &opts());
        assert!(report.is_success(), "{:#?}", report);
        assert_eq!(report.tests().len(), RULES.len());
        assert_eq!(report.target(), "mem");
    }

    #[test]
    fn wrong_sector_fails_subject_and_policies() {
        let opts = ValidateOptions::new(Sector::Private).at_time(NOW);
        let report = validate_cert("mem", &compliant_cert(), &opts);
        assert!(!report.is_success());
        let failed: Vec<_> = report
            .tests()
            .iter()
            .filter(|t| !t.is_success())
            .map(Test::description)
            .collect();
        assert_eq!(
            failed,
            [
                "Checking the SubjectDN",
                "Checking certificatePolicies x509 extension"
            ]
        );
    }

    #[test]
    fn evaluation_time_drives_expiration() {
        let cert = compliant_cert();
        let later = ValidateOptions::new(Sector::Public).at_time(NOW + 2 * 86_400);
        let report = validate_cert("mem", &cert, &later);
        let expiration = &report.tests()[3];
        assert_eq!(expiration.description(), "Checking the certificate expiration");
        assert!(!expiration.is_success());
    }

    #[test]
    fn malformed_extension_aborts_rest_of_group() {
        let mut cert = compliant_cert();
        replace_extension(
            &mut cert,
            oid::EXT_KEY_USAGE,
            ExtensionValue::Malformed("invalid bit string".into()),
        );
        let report = validate_cert("mem", &cert, &opts());
        assert!(!report.is_success());
        assert_eq!(
            descriptions(&report),
            [
                "Checking the key type and size",
                "Checking the signature digest algorithm",
                "Checking the SubjectDN",
                "Checking the certificate expiration",
                "Checking basicConstraints x509 extension",
                CRITICAL_ERROR,
            ]
        );

        let critical = &report.tests()[5];
        assert_eq!(critical.checks().len(), 1);
        let check = &critical.checks()[0];
        assert_eq!(check.description(), "Checking keyUsage x509 extension");
        assert!(!check.is_success());
        assert_eq!(
            check.value(),
            Some(&Value::from(
                "malformed keyUsage extension: invalid bit string"
            ))
        );
    }

    #[test]
    fn first_extension_error_skips_whole_group() {
        let mut cert = compliant_cert();
        cert.extensions.0.push(Extension {
            oid: oid::EXT_BASIC_CONSTRAINTS.into(),
            critical: false,
            value: ExtensionValue::BasicConstraints {
                ca: false,
                path_len: None,
            },
        });
        let report = validate_cert("mem", &cert, &opts());
        assert_eq!(report.tests().len(), 5);
        assert_eq!(report.tests()[4].description(), CRITICAL_ERROR);
    }

    #[test]
    fn missing_extensions_are_ordinary_failures() {
        let mut cert = compliant_cert();
        cert.extensions = Extensions::default();
        let report = validate_cert("mem", &cert, &opts());
        assert_eq!(report.tests().len(), RULES.len());
        for test in &report.tests()[4..] {
            assert_eq!(test.checks().len(), 1);
            assert!(test.checks()[0].description().ends_with("must be present"));
        }
    }

    #[test]
    fn undecodable_input_is_a_load_error() {
        let err = validate_bytes("garbage.pem", b"not a certificate", &opts()).unwrap_err();
        match err {
            SpidError::CertificateLoad { target, .. } => assert_eq!(target, "garbage.pem"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn unreadable_file_is_a_load_error() {
        let err = validate_file(Path::new("/nonexistent/cert.pem"), &opts()).unwrap_err();
        assert!(matches!(err, SpidError::CertificateLoad { .. }));
    }
}
