use include_dir::{include_dir, Dir};
use std::{collections::HashSet, path::Path};
use thiserror::Error;
use tracing::info;

use crate::models::ClothingItem;

static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file missing: {0}")] Missing(String),
    #[error("catalog parse error: {0}")] Parse(String),
    #[error("catalog is empty")] Empty,
    #[error("duplicate catalog id: {0}")] Duplicate(String),
}

/// Read-only, ordered list of clothing items the user can pick from.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<ClothingItem>,
}

impl Catalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        let file = ASSETS
            .get_file("catalog.json")
            .ok_or_else(|| CatalogError::Missing("assets/catalog.json".into()))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| CatalogError::Parse("catalog.json is not UTF-8".into()))?;
        Self::from_json(text)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Missing(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&text)?;
        info!("👗 Loaded {} catalog items from {}", catalog.items.len(), path.display());
        Ok(catalog)
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let items: Vec<ClothingItem> = serde_json::from_str(text)
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(items)
    }

    pub fn new(items: Vec<ClothingItem>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id.as_str()) {
                return Err(CatalogError::Duplicate(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[ClothingItem] { &self.items }

    pub fn get(&self, id: &str) -> Option<&ClothingItem> {
        self.items.iter().find(|item| item.id == id)
    }
}
