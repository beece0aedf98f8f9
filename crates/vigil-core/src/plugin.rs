//! Filter and parser plugin interfaces (implemented in vigil-checks)

use crate::error::ConfigError;
use crate::knowledge::Item;

/// What a compiled filter does with one item
#[derive(Debug, Clone, PartialEq)]
pub enum FilterVerdict {
    /// Pass the item on unchanged
    Keep,
    /// Remove the item from the sequence
    Drop,
    /// Replace the item with zero or more reshaped items
    Replace(Vec<Item>),
}

/// A filter type, resolved by name from the registry
pub trait FilterPlugin: Send + Sync {
    /// Name checks refer to this filter by
    fn name(&self) -> &str;

    /// Validate and compile an expression once, at catalog-load time
    fn compile(&self, expression: &str) -> Result<Box<dyn CompiledFilter>, ConfigError>;
}

/// A filter bound to its expression
pub trait CompiledFilter: Send + Sync + std::fmt::Debug {
    fn evaluate(&self, item: &Item) -> FilterVerdict;
}

/// Turns raw artifact items into structured items
pub trait ParserPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Parse one raw item into zero or more structured items
    fn parse(&self, item: &Item) -> Result<Vec<Item>, String>;
}
