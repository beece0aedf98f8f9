//! Plugin registry - filter and parser implementations indexed by name

use crate::{filters, parsers};
use std::collections::HashMap;
use std::sync::Arc;
use vigil_core::{FilterPlugin, ParserPlugin};

/// Registry of every filter and parser a catalog may refer to
pub struct PluginRegistry {
    /// Filters indexed by type name
    filters: HashMap<String, Arc<dyn FilterPlugin>>,
    /// Parsers indexed by name
    parsers: HashMap<String, Arc<dyn ParserPlugin>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
            parsers: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in filters and parsers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_filter(Arc::new(filters::RegexFilter));
        registry.register_filter(Arc::new(filters::AttrFilter));
        registry.register_filter(Arc::new(filters::CompareFilter));
        registry.register_filter(Arc::new(filters::ForEachFilter));
        registry.register_parser(Arc::new(parsers::LinesParser));
        registry.register_parser(Arc::new(parsers::KeyValueParser));
        registry.register_parser(Arc::new(parsers::JsonParser));
        registry
    }

    /// Register a filter, replacing any filter of the same name
    pub fn register_filter(&mut self, filter: Arc<dyn FilterPlugin>) {
        self.filters.insert(filter.name().to_string(), filter);
    }

    /// Register a parser, replacing any parser of the same name
    pub fn register_parser(&mut self, parser: Arc<dyn ParserPlugin>) {
        self.parsers.insert(parser.name().to_string(), parser);
    }

    /// Resolve a filter type
    pub fn filter(&self, name: &str) -> Option<Arc<dyn FilterPlugin>> {
        self.filters.get(name).cloned()
    }

    /// Resolve a parser
    pub fn parser(&self, name: &str) -> Option<Arc<dyn ParserPlugin>> {
        self.parsers.get(name).cloned()
    }

    /// Registered filter type names, sorted
    pub fn filter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Registered parser names, sorted
    pub fn parser_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parsers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
