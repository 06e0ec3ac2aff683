//! Ingredient reference data.
//!
//! Provides two loading methods:
//! - `IngredientCatalog::builtin()` - The curated catalog compiled into the binary
//! - `IngredientCatalog::load(path)` - A catalog from a TOML file

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analyzer::SkinCondition;

/// Curated catalog embedded in the binary at compile time.
const BUILTIN_CATALOG: &str = include_str!("../../config/ingredients.toml");

/// A skincare ingredient and the conditions it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default, alias = "helps_with")]
    pub helps_with: Vec<SkinCondition>,
    #[serde(default)]
    pub cautions: Vec<String>,
    /// Other spellings accepted by `IngredientCatalog::find`.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Ingredient {
    pub fn helps_with(&self, condition: SkinCondition) -> bool {
        self.helps_with.contains(&condition)
    }

    fn matches(&self, key: &str) -> bool {
        normalize(&self.name) == key || self.aliases.iter().any(|a| normalize(a) == key)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    ingredients: Vec<Ingredient>,
}

/// Ordered, read-only list of known ingredients.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientCatalog {
    ingredients: Vec<Ingredient>,
}

impl IngredientCatalog {
    /// # Panics
    /// Panics if the embedded TOML is invalid (this would be a compile-time bug).
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_CATALOG).expect("embedded ingredients.toml must be valid TOML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ingredient catalog {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Invalid ingredient catalog {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Ok(Self {
            ingredients: file.ingredients,
        })
    }

    pub fn all(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Look up by name or alias, ignoring case and whitespace.
    pub fn find(&self, name: &str) -> Option<&Ingredient> {
        let key = normalize(name);
        if key.is_empty() {
            return None;
        }
        self.ingredients.iter().find(|i| i.matches(&key))
    }

    /// Ingredients that target `condition`, in catalog order.
    pub fn for_condition(&self, condition: SkinCondition) -> Vec<&Ingredient> {
        self.ingredients
            .iter()
            .filter(|i| i.helps_with(condition))
            .collect()
    }

    /// Catalog entries for free-form names, in input order. Unknown names
    /// are skipped and each entry appears once.
    pub fn resolve(&self, names: &[String]) -> Vec<&Ingredient> {
        let mut found: Vec<&Ingredient> = Vec::new();
        for name in names {
            if let Some(ingredient) = self.find(name) {
                if !found.iter().any(|f| f.name == ingredient.name) {
                    found.push(ingredient);
                }
            }
        }
        found
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
