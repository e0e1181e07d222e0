//! Static asset catalog.
//!
//! Maps an asset id to the file name that backs it. Seeded once from
//! configuration and never mutated afterwards.

use crate::config::CatalogEntry;
use std::collections::HashMap;

/// Read-only mapping from asset id to file name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Build a catalog from configured entries.
    ///
    /// Later entries with a repeated id are ignored, mirroring insert-or-ignore
    /// seeding.
    #[must_use]
    pub fn new(entries: &[CatalogEntry]) -> Self {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            map.entry(entry.id.clone())
                .or_insert_with(|| entry.filename.clone());
        }
        Self { entries: map }
    }

    /// Look up the file name registered for `asset_id`.
    #[must_use]
    pub fn lookup(&self, asset_id: &str) -> Option<&str> {
        self.entries.get(asset_id).map(String::as_str)
    }

    /// Whether `asset_id` is purchasable.
    #[must_use]
    pub fn contains(&self, asset_id: &str) -> bool {
        self.entries.contains_key(asset_id)
    }

    /// Iterate over `(asset_id, filename)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
