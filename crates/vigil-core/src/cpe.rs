//! CPE (Common Platform Enumeration) parsing and matching
//!
//! Both the 2.2 URI and the 2.3 formatted string bindings are accepted.
//! Omitted trailing components compare as `*`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of attribute components in a CPE 2.3 name (after `cpe:2.3:`)
const COMPONENTS: usize = 11;

/// A parsed CPE name.
///
/// Components are stored in CPE 2.3 order: part, vendor, product, version,
/// update, edition, language, sw_edition, target_sw, target_hw, other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpe {
    components: [String; COMPONENTS],
}

impl Cpe {
    /// Parse a CPE 2.3 formatted string or a CPE 2.2 URI
    pub fn parse(cpe_str: &str) -> Result<Self, CpeParseError> {
        let cpe_str = cpe_str.trim();
        let body = if let Some(rest) = cpe_str.strip_prefix("cpe:2.3:") {
            rest
        } else if let Some(rest) = cpe_str.strip_prefix("cpe:/") {
            rest
        } else {
            return Err(CpeParseError::InvalidPrefix);
        };

        let raw: Vec<&str> = split_unescaped(body);
        if raw.len() < 2 {
            return Err(CpeParseError::TooFewComponents);
        }
        if raw.len() > COMPONENTS {
            return Err(CpeParseError::TooManyComponents);
        }

        let part = raw[0].to_lowercase();
        if !matches!(part.as_str(), "a" | "o" | "h" | "*" | "") {
            return Err(CpeParseError::InvalidPart(raw[0].to_string()));
        }

        let mut components: [String; COMPONENTS] = Default::default();
        for (i, slot) in components.iter_mut().enumerate() {
            *slot = match raw.get(i) {
                Some(value) if !value.is_empty() => unescape(value).to_lowercase(),
                _ => String::from("*"),
            };
        }

        Ok(Self { components })
    }

    pub fn part(&self) -> &str {
        &self.components[0]
    }

    pub fn vendor(&self) -> &str {
        &self.components[1]
    }

    pub fn product(&self) -> &str {
        &self.components[2]
    }

    pub fn version(&self) -> &str {
        &self.components[3]
    }

    /// Check if this CPE (as a pattern) matches another CPE
    pub fn matches(&self, other: &Cpe) -> bool {
        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(pattern, value)| component_matches(pattern, value))
    }

    /// Format as CPE 2.3 string
    pub fn to_cpe_string(&self) -> String {
        format!("cpe:2.3:{}", self.components.join(":"))
    }
}

/// Compare two CPE strings, falling back to exact comparison when either side
/// is not a valid CPE name
pub fn cpe_matches(pattern: &str, value: &str) -> bool {
    match (Cpe::parse(pattern), Cpe::parse(value)) {
        (Ok(p), Ok(v)) => p.matches(&v),
        _ => pattern.trim().eq_ignore_ascii_case(value.trim()),
    }
}

fn split_unescaped(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            ':' if !escaped => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => escaped = false,
        }
    }
    parts.push(&body[start..]);
    parts
}

fn unescape(s: &str) -> String {
    s.replace("\\:", ":")
        .replace("\\*", "*")
        .replace("\\?", "?")
        .replace("%21", "!")
        .replace("%2a", "*")
        .replace("%2f", "/")
        .replace("%7e", "~")
}

fn component_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" || value == "*" {
        return true;
    }
    if pattern == "-" || value == "-" {
        return pattern == value;
    }

    match pattern.split_once('*') {
        Some((prefix, suffix)) if !suffix.contains('*') => {
            value.len() >= prefix.len() + suffix.len()
                && value.starts_with(prefix)
                && value.ends_with(suffix)
        }
        _ => pattern == value,
    }
}

impl fmt::Display for Cpe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cpe_string())
    }
}

impl FromStr for Cpe {
    type Err = CpeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cpe::parse(s)
    }
}

/// CPE parsing error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CpeParseError {
    #[error("CPE must start with 'cpe:2.3:' or 'cpe:/'")]
    InvalidPrefix,
    #[error("CPE has too few components")]
    TooFewComponents,
    #[error("CPE has too many components")]
    TooManyComponents,
    #[error("Invalid CPE part: {0}")]
    InvalidPart(String),
}
