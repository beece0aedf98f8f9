//! Operator hints - problem/fix text and finding formatting

use crate::knowledge::Item;
use serde::{Deserialize, Serialize};

/// Human-readable remediation text attached to a check, method, probe or filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    /// Template for rendering each matched item, `{path}` placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Cap on rendered items per anomaly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl Hint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.problem = Some(problem.into());
        self
    }

    pub fn fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Fill every unset field from `parent`
    pub fn overlay(&self, parent: &Hint) -> Hint {
        Hint {
            problem: self.problem.clone().or_else(|| parent.problem.clone()),
            fix: self.fix.clone().or_else(|| parent.fix.clone()),
            format: self.format.clone().or_else(|| parent.format.clone()),
            summary: self.summary.clone().or_else(|| parent.summary.clone()),
            max_results: self.max_results.or(parent.max_results),
        }
    }

    /// Effective hint for the most specific level of a hierarchy.
    ///
    /// `chain` runs from most to least specific (filter, probe, method, check).
    pub fn resolve<'a>(chain: impl IntoIterator<Item = Option<&'a Hint>>) -> Hint {
        chain
            .into_iter()
            .flatten()
            .fold(Hint::default(), |acc, parent| acc.overlay(parent))
    }

    /// Render matched items for an anomaly, honouring `format` and `max_results`
    pub fn render_all(&self, items: &[Item]) -> Vec<String> {
        let limit = self.max_results.unwrap_or(usize::MAX);
        items.iter().take(limit).map(|item| self.render(item)).collect()
    }

    /// Render one item
    pub fn render(&self, item: &Item) -> String {
        match self.format.as_deref() {
            Some(template) if !template.is_empty() => render_template(template, item),
            _ => item_text(item),
        }
    }
}

/// Plain text for an item: strings unquoted, everything else as JSON
pub fn item_text(item: &Item) -> String {
    match item {
        Item::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Look up a dotted path (`a.b.0.c`) inside an item
pub fn lookup<'a>(item: &'a Item, path: &str) -> Option<&'a Item> {
    let path = path.trim();
    if path.is_empty() {
        return Some(item);
    }
    path.split('.').try_fold(item, |current, key| match current {
        Item::Object(map) => map.get(key),
        Item::Array(values) => key.parse::<usize>().ok().and_then(|i| values.get(i)),
        _ => None,
    })
}

fn render_template(template: &str, item: &Item) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let path = &after[..close];
                if let Some(value) = lookup(item, path) {
                    out.push_str(&item_text(value));
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overlay_fills_gaps() {
        let check = Hint::new().problem("Insecure services").fix("Remove them").summary("svc");
        let probe = Hint::new().problem("telnetd installed");
        let effective = Hint::resolve([None, Some(&probe), None, Some(&check)]);

        assert_eq!(effective.problem.as_deref(), Some("telnetd installed"));
        assert_eq!(effective.fix.as_deref(), Some("Remove them"));
        assert_eq!(effective.summary.as_deref(), Some("svc"));
    }

    #[test]
    fn test_render_with_format() {
        let hint = Hint::new().format("{name} {version}");
        let item = json!({"name": "telnetd", "version": "0.17"});
        assert_eq!(hint.render(&item), "telnetd 0.17");
    }

    #[test]
    fn test_render_without_format() {
        let hint = Hint::new();
        assert_eq!(hint.render(&json!("bash-5.0")), "bash-5.0");
        assert_eq!(hint.render(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_render_all_truncates() {
        let hint = Hint::new().max_results(2);
        let items = vec![json!("a"), json!("b"), json!("c")];
        assert_eq!(hint.render_all(&items), vec!["a", "b"]);
    }

    #[test]
    fn test_lookup_paths() {
        let item = json!({"stat": {"mode": 420, "paths": ["/etc/passwd"]}});
        assert_eq!(lookup(&item, "stat.mode"), Some(&json!(420)));
        assert_eq!(lookup(&item, "stat.paths.0"), Some(&json!("/etc/passwd")));
        assert_eq!(lookup(&item, "stat.owner"), None);
        assert_eq!(lookup(&item, ""), Some(&item));
    }
}
