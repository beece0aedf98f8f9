//! Built-in artifact parsers

use serde_json::json;
use vigil_core::{Item, ParserPlugin};

fn expect_text<'a>(parser: &str, item: &'a Item) -> Result<&'a str, String> {
    item.as_str()
        .ok_or_else(|| format!("{} expects string items, got {}", parser, item))
}

/// Non-empty lines that are not `#` or `;` comments
fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
}

/// `lines` - one string item per content line
pub struct LinesParser;

impl ParserPlugin for LinesParser {
    fn name(&self) -> &str {
        "lines"
    }

    fn parse(&self, item: &Item) -> Result<Vec<Item>, String> {
        let text = expect_text(self.name(), item)?;
        Ok(content_lines(text).map(|line| Item::String(line.to_string())).collect())
    }
}

/// `key_value` - one `{key, value}` object per `key value` or `key=value` line
pub struct KeyValueParser;

impl ParserPlugin for KeyValueParser {
    fn name(&self) -> &str {
        "key_value"
    }

    fn parse(&self, item: &Item) -> Result<Vec<Item>, String> {
        let text = expect_text(self.name(), item)?;
        let pairs = content_lines(text)
            .filter_map(|line| {
                if line.contains('=') {
                    line.split_once('=')
                } else {
                    line.split_once(char::is_whitespace)
                }
            })
            .map(|(key, value)| json!({"key": key.trim(), "value": value.trim()}))
            .collect();
        Ok(pairs)
    }
}

/// `json` - parse string items as JSON; structured items pass through
pub struct JsonParser;

impl ParserPlugin for JsonParser {
    fn name(&self) -> &str {
        "json"
    }

    fn parse(&self, item: &Item) -> Result<Vec<Item>, String> {
        match item {
            Item::String(text) => serde_json::from_str(text)
                .map(|value| vec![value])
                .map_err(|e| format!("invalid JSON: {}", e)),
            other => Ok(vec![other.clone()]),
        }
    }
}
