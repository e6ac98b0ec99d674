//! Conformance rules, one module per certificate aspect.
//!
//! Every rule is a pure function returning its checks in evaluation order.
//! A failed predicate is an ordinary failing [`Check`]; only the rules that
//! read the extensions block can fail outright, with an [`ExtensionError`],
//! when that block is structurally malformed.

pub mod basic_constraints;
pub mod certificate_policies;
pub mod digest;
pub mod key;
pub mod key_usage;
pub mod subject_dn;
pub mod time_validity;

use crate::fields::{ExtensionError, ExtensionKind};
use crate::report::Check;

pub use basic_constraints::basic_constraints;
pub use certificate_policies::certificate_policies;
pub use digest::digest_algorithm;
pub use key::key_type_and_size;
pub use key_usage::key_usage;
pub use subject_dn::subject_dn;
pub use time_validity::not_expired;

/// Checks produced by a rule, or the structural error that stopped it.
pub type RuleResult = Result<Vec<Check>, ExtensionError>;

/// The single failing check emitted when a required extension is absent.
pub(crate) fn missing_extension(kind: ExtensionKind) -> Check {
    Check::verify(
        format!("{} must be present", kind),
        false,
        format!("extension {} not found", kind.oid()),
    )
}

/// Render a list as `[a, b, c]` for check descriptions.
pub(crate) fn bracketed(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}
