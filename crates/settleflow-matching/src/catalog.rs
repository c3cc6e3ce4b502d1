//! The commodity-catalog capability seam.
//!
//! Declaration items carry a `ProductId`; invoice lines carry the declared
//! commodity name printed on the fiscal document. The catalog resolves one
//! to the other. Product master data lives outside this core, so the
//! resolution is a trait the host wires in.

use std::collections::HashMap;

use settleflow_types::ProductId;

/// Resolves a product to its declared commodity name.
pub trait CommodityCatalog {
    /// The declared name for a product, or `None` if no mapping exists.
    fn declared_name(&self, product: ProductId) -> Option<&str>;
}

/// In-memory catalog backed by a plain map. Suitable for tests and for
/// hosts that preload the full mapping.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    names: HashMap<ProductId, String>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Register (or replace) the declared name for a product.
    pub fn insert(&mut self, product: ProductId, declared_name: impl Into<String>) {
        self.names.insert(product, declared_name.into());
    }
}

impl CommodityCatalog for StaticCatalog {
    fn declared_name(&self, product: ProductId) -> Option<&str> {
        self.names.get(&product).map(String::as_str)
    }
}
