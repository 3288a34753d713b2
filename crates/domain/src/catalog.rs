//! Catalog records and picture URI composition.

use common::CatalogItemId;
use serde::{Deserialize, Serialize};

/// Current catalog record for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    /// Picture reference as stored in the catalog, possibly with a placeholder base.
    pub picture_uri: String,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<CatalogItemId>,
        name: impl Into<String>,
        picture_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            picture_uri: picture_uri.into(),
        }
    }
}

/// Turns a catalog picture reference into the URI frozen in an order item.
pub trait PictureUriComposer: Send + Sync {
    fn compose(&self, picture_uri: &str) -> String;
}

/// Composer that swaps the catalog's placeholder base for the configured one.
#[derive(Debug, Clone)]
pub struct CatalogUriComposer {
    base_url: String,
}

impl CatalogUriComposer {
    /// Base that catalog seed data uses in place of the real host.
    pub const PLACEHOLDER_BASE: &'static str = "http://catalogbaseurltobereplaced";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl PictureUriComposer for CatalogUriComposer {
    fn compose(&self, picture_uri: &str) -> String {
        match picture_uri.strip_prefix(Self::PLACEHOLDER_BASE) {
            Some(rest) => format!("{}{}", self.base_url, rest),
            None => picture_uri.to_string(),
        }
    }
}
