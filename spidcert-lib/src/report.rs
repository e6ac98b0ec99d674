//! Report model: checks grouped into tests, tests grouped into a report.
//!
//! Results roll up from the leaves. A [`Test`] fails as soon as one of its
//! checks fails and a [`Report`] fails as soon as one of its tests fails.
//! The derived `result` fields are only ever updated by [`Test::add_check`]
//! and [`Report::add_test`], so a failure can never be reversed by later
//! successes. Deserialized reports are rebuilt through the same methods, so
//! a stored `result` is ignored and derived again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a check, a test or a whole report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// `Success` if `passed`, `Failure` otherwise.
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
        }
    }
}

/// The concrete value a check inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// One atomic predicate outcome. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    description: String,
    result: Outcome,
    value: Option<Value>,
}

impl Check {
    pub fn new(description: impl Into<String>, result: Outcome, value: Option<Value>) -> Self {
        Self {
            description: description.into(),
            result,
            value,
        }
    }

    /// A check that passed iff `passed`, recording `value`.
    pub fn verify(description: impl Into<String>, passed: bool, value: impl Into<Value>) -> Self {
        Self::new(description, Outcome::from_bool(passed), Some(value.into()))
    }

    /// A failing check without an observed value.
    pub fn failed(description: impl Into<String>) -> Self {
        Self::new(description, Outcome::Failure, None)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn result(&self) -> Outcome {
        self.result
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Checks produced by one rule, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TestRecord")]
pub struct Test {
    description: String,
    result: Outcome,
    checks: Vec<Check>,
}

impl Test {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            result: Outcome::Success,
            checks: Vec::new(),
        }
    }

    /// Build a test from an ordered list of checks.
    pub fn with_checks(description: impl Into<String>, checks: Vec<Check>) -> Self {
        let mut test = Self::new(description);
        for check in checks {
            test.add_check(check);
        }
        test
    }

    pub fn add_check(&mut self, check: Check) {
        if !check.is_success() {
            self.result = Outcome::Failure;
        }
        self.checks.push(check);
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn result(&self) -> Outcome {
        self.result
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Number of failing checks.
    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|c| !c.is_success()).count()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Verdict for one certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReportRecord")]
pub struct Report {
    result: Outcome,
    target: String,
    timestamp: String,
    tests: Vec<Test>,
}

impl Report {
    /// Create an empty, successful report stamped with the current UTC time.
    pub fn new(target: impl Into<String>) -> Self {
        Self::with_timestamp(target, crate::util::format_iso8601(crate::util::now_timestamp()))
    }

    /// Create an empty report with an explicit timestamp.
    pub fn with_timestamp(target: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            result: Outcome::Success,
            target: target.into(),
            timestamp: timestamp.into(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: Test) {
        if !test.is_success() {
            self.result = Outcome::Failure;
        }
        self.tests.push(test);
    }

    pub fn result(&self) -> Outcome {
        self.result
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    /// Number of failing checks across all tests.
    pub fn failures(&self) -> usize {
        self.tests.iter().map(Test::failures).sum()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

#[derive(Deserialize)]
struct TestRecord {
    description: String,
    checks: Vec<Check>,
}

impl From<TestRecord> for Test {
    fn from(record: TestRecord) -> Self {
        Test::with_checks(record.description, record.checks)
    }
}

#[derive(Deserialize)]
struct ReportRecord {
    target: String,
    timestamp: String,
    tests: Vec<Test>,
}

impl From<ReportRecord> for Report {
    fn from(record: ReportRecord) -> Self {
        let mut report = Report::with_timestamp(record.target, record.timestamp);
        for test in record.tests {
            report.add_test(test);
        }
        report
    }
}
