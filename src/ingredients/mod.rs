//! Ingredient catalog and the user's favorites.

pub mod catalog;
pub mod favorites;

pub use catalog::{Ingredient, IngredientCatalog};
pub use favorites::FavoritesStore;
