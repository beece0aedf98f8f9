//! Built-in filter types
//!
//! - `regex`: keep items whose text matches a pattern
//! - `attr`: replace each item with the value at a dotted path
//! - `compare`: keep items where `path OP literal` holds
//! - `foreach`: expand the array at a dotted path into its elements

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use vigil_core::hint::{item_text, lookup};
use vigil_core::{CompiledFilter, ConfigError, FilterPlugin, FilterVerdict, Item};

static COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^\s=!<>~]*)\s*(==|!=|<=|>=|=~|<|>)\s*(.*?)\s*$")
        .expect("comparison grammar is a valid regex")
});

/// `regex` - predicate on the item's text
pub struct RegexFilter;

impl FilterPlugin for RegexFilter {
    fn name(&self) -> &str {
        "regex"
    }

    fn compile(&self, expression: &str) -> Result<Box<dyn CompiledFilter>, ConfigError> {
        if expression.is_empty() {
            return Err(ConfigError::malformed(self.name(), expression, "empty pattern"));
        }
        let pattern = Regex::new(expression)
            .map_err(|e| ConfigError::malformed(self.name(), expression, e.to_string()))?;
        Ok(Box::new(CompiledRegex { pattern }))
    }
}

#[derive(Debug)]
struct CompiledRegex {
    pattern: Regex,
}

impl CompiledFilter for CompiledRegex {
    fn evaluate(&self, item: &Item) -> FilterVerdict {
        if self.pattern.is_match(&item_text(item)) {
            FilterVerdict::Keep
        } else {
            FilterVerdict::Drop
        }
    }
}

/// `attr` - transform to the value at a dotted path
pub struct AttrFilter;

impl FilterPlugin for AttrFilter {
    fn name(&self) -> &str {
        "attr"
    }

    fn compile(&self, expression: &str) -> Result<Box<dyn CompiledFilter>, ConfigError> {
        let path = expression.trim();
        if path.is_empty() {
            return Err(ConfigError::malformed(self.name(), expression, "empty attribute path"));
        }
        Ok(Box::new(CompiledAttr {
            path: path.to_string(),
        }))
    }
}

#[derive(Debug)]
struct CompiledAttr {
    path: String,
}

impl CompiledFilter for CompiledAttr {
    fn evaluate(&self, item: &Item) -> FilterVerdict {
        match lookup(item, &self.path) {
            Some(value) => FilterVerdict::Replace(vec![value.clone()]),
            None => FilterVerdict::Drop,
        }
    }
}

/// `foreach` - expand an array into its elements
pub struct ForEachFilter;

impl FilterPlugin for ForEachFilter {
    fn name(&self) -> &str {
        "foreach"
    }

    fn compile(&self, expression: &str) -> Result<Box<dyn CompiledFilter>, ConfigError> {
        Ok(Box::new(CompiledForEach {
            path: expression.trim().to_string(),
        }))
    }
}

#[derive(Debug)]
struct CompiledForEach {
    path: String,
}

impl CompiledFilter for CompiledForEach {
    fn evaluate(&self, item: &Item) -> FilterVerdict {
        match lookup(item, &self.path) {
            Some(Item::Array(values)) => FilterVerdict::Replace(values.clone()),
            _ => FilterVerdict::Drop,
        }
    }
}

/// `compare` - predicate `path OP literal`
pub struct CompareFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Matches,
}

impl Operator {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "=~" => Operator::Matches,
            _ => return None,
        })
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
            Operator::Matches => false,
        }
    }
}

impl FilterPlugin for CompareFilter {
    fn name(&self) -> &str {
        "compare"
    }

    fn compile(&self, expression: &str) -> Result<Box<dyn CompiledFilter>, ConfigError> {
        let caps = COMPARISON.captures(expression).ok_or_else(|| {
            ConfigError::malformed(self.name(), expression, "expected `path OP value`")
        })?;

        let path = caps[1].to_string();
        let operator = Operator::parse(&caps[2])
            .ok_or_else(|| ConfigError::malformed(self.name(), expression, "unknown operator"))?;
        let literal = unquote(&caps[3]).to_string();

        let pattern = if operator == Operator::Matches {
            Some(
                Regex::new(&literal)
                    .map_err(|e| ConfigError::malformed(self.name(), expression, e.to_string()))?,
            )
        } else {
            None
        };

        Ok(Box::new(CompiledCompare {
            path,
            operator,
            number: literal.parse::<f64>().ok(),
            literal,
            pattern,
        }))
    }
}

fn unquote(s: &str) -> &str {
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

#[derive(Debug)]
struct CompiledCompare {
    path: String,
    operator: Operator,
    literal: String,
    number: Option<f64>,
    pattern: Option<Regex>,
}

impl CompiledCompare {
    fn holds(&self, value: &Item) -> bool {
        let text = item_text(value);

        if let Some(pattern) = &self.pattern {
            return pattern.is_match(&text);
        }

        let ordering = match (self.number, as_number(value)) {
            (Some(want), Some(have)) => have.partial_cmp(&want),
            _ => Some(text.as_str().cmp(self.literal.as_str())),
        };

        ordering.is_some_and(|o| self.operator.accepts(o))
    }
}

fn as_number(value: &Item) -> Option<f64> {
    match value {
        Item::Number(n) => n.as_f64(),
        Item::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

impl CompiledFilter for CompiledCompare {
    fn evaluate(&self, item: &Item) -> FilterVerdict {
        match lookup(item, &self.path) {
            Some(value) if self.holds(value) => FilterVerdict::Keep,
            _ => FilterVerdict::Drop,
        }
    }
}
