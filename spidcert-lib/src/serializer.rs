//! Report rendering: JSON, plain text, XML and YAML.

use crate::report::{Check, Report, Test};
use crate::SpidError;
use std::fmt;
use std::str::FromStr;

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Txt,
    Xml,
    Yaml,
}

type Renderer = fn(&Report) -> Result<String, SpidError>;

impl Format {
    pub const ALL: [Format; 4] = [Format::Json, Format::Txt, Format::Xml, Format::Yaml];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Txt => "txt",
            Format::Xml => "xml",
            Format::Yaml => "yaml",
        }
    }

    fn renderer(self) -> Renderer {
        match self {
            Format::Json => to_json,
            Format::Txt => to_txt,
            Format::Xml => to_xml,
            Format::Yaml => to_yaml,
        }
    }

    /// Render `report` in this format.
    pub fn render(self, report: &Report) -> Result<String, SpidError> {
        self.renderer()(report)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = SpidError;

    /// Format names are case-sensitive: `json` is accepted, `JSON` is not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| SpidError::UnsupportedFormat(s.to_string()))
    }
}

/// Render `report` in the named format.
pub fn serialize(report: &Report, format: &str) -> Result<String, SpidError> {
    format.parse::<Format>()?.render(report)
}

fn to_json(report: &Report) -> Result<String, SpidError> {
    serde_json::to_string(report).map_err(SpidError::Json)
}

fn to_yaml(report: &Report) -> Result<String, SpidError> {
    serde_yaml::to_string(report).map_err(SpidError::Yaml)
}

fn check_txt(check: &Check) -> String {
    let value = check.value().map(|v| v.to_string()).unwrap_or_default();
    format!("{} [{}][{}]", check.description(), check.result(), value)
}

fn to_txt(report: &Report) -> Result<String, SpidError> {
    let mut lines = vec![
        format!("Result: {}", report.result()),
        format!("Target: {}", report.target()),
        format!("Timestamp: {}", report.timestamp()),
    ];
    for test in report.tests() {
        lines.push(format!("  Test: {}", test.description()));
        lines.push(format!("  Result: {}", test.result()));
        for check in test.checks() {
            lines.push(format!("    {}", check_txt(check)));
        }
    }
    Ok(lines.join("\n"))
}

fn to_xml(report: &Report) -> Result<String, SpidError> {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<report>\n");
    write_element(&mut out, 1, "result", &report.result().to_string());
    write_element(&mut out, 1, "target", report.target());
    write_element(&mut out, 1, "timestamp", report.timestamp());
    out.push_str("  <tests>\n");
    for test in report.tests() {
        test_xml(&mut out, test);
    }
    out.push_str("  </tests>\n</report>\n");
    Ok(out)
}

fn test_xml(out: &mut String, test: &Test) {
    out.push_str("    <test>\n");
    write_element(out, 3, "description", test.description());
    write_element(out, 3, "result", &test.result().to_string());
    out.push_str("      <checks>\n");
    for check in test.checks() {
        out.push_str("        <check>\n");
        write_element(out, 5, "description", check.description());
        write_element(out, 5, "result", &check.result().to_string());
        match check.value() {
            Some(value) => write_element(out, 5, "value", &value.to_string()),
            None => out.push_str("          <value/>\n"),
        }
        out.push_str("        </check>\n");
    }
    out.push_str("      </checks>\n    </test>\n");
}

fn write_element(out: &mut String, depth: usize, tag: &str, text: &str) {
    out.push_str(&format!(
        "{:indent$}<{tag}>{}</{tag}>\n",
        "",
        escape_xml(text),
        indent = depth * 2,
        tag = tag
    ));
}

/// Escape text for use as XML 1.0 element content.
///
/// The five special characters become entities and tab, newline and
/// carriage return become character references. Characters XML 1.0 cannot
/// represent at all (other C0 controls, U+FFFE and U+FFFF) are replaced
/// with U+FFFD.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push_str(&format!("&#x{:X};", u32::from(ch))),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => out.push(char::REPLACEMENT_CHARACTER),
            _ => out.push(ch),
        }
    }
    out
}
