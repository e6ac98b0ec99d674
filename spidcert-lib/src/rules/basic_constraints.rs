//! basicConstraints: the subject must be an end entity.

use super::{missing_extension, RuleResult};
use crate::fields::{ExtensionError, ExtensionKind, ExtensionValue, Extensions};
use crate::report::Check;

pub fn basic_constraints(extensions: &Extensions) -> RuleResult {
    let kind = ExtensionKind::BasicConstraints;
    let Some(ext) = extensions.get(kind)? else {
        return Ok(vec![missing_extension(kind)]);
    };

    let ExtensionValue::BasicConstraints { ca, .. } = ext.value else {
        return Err(ExtensionError::new(kind.name(), "unexpected extension value"));
    };

    Ok(vec![Check::verify(
        format!("{} CA flag must be unset", kind),
        !ca,
        ca,
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Extension;
    use crate::oid;

    fn with_bc(ca: bool) -> Extensions {
        Extensions::new(vec![Extension {
            oid: oid::EXT_BASIC_CONSTRAINTS.into(),
            critical: true,
            value: ExtensionValue::BasicConstraints { ca, path_len: None },
        }])
    }

    #[test]
    fn end_entity_passes() {
        let checks = basic_constraints(&with_bc(false)).unwrap();
        assert_eq!(checks.len(), 1);
        assert!(checks[0].is_success());
    }

    #[test]
    fn ca_fails() {
        let checks = basic_constraints(&with_bc(true)).unwrap();
        assert!(!checks[0].is_success());
    }

    #[test]
    fn absent_extension_is_one_failing_check() {
        let checks = basic_constraints(&Extensions::default()).unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].description(), "basicConstraints must be present");
        assert!(!checks[0].is_success());
    }

    #[test]
    fn malformed_extension_is_an_error() {
        let exts = Extensions::new(vec![Extension {
            oid: oid::EXT_BASIC_CONSTRAINTS.into(),
            critical: false,
            value: ExtensionValue::Malformed("truncated".into()),
        }]);
        assert!(basic_constraints(&exts).is_err());
    }
}
