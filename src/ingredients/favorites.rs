use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::storage::Repository;

/// Ingredient names the user marked as favorite.
///
/// Names are stored exactly as given. Persistence is best-effort, like the
/// scan history.
pub struct FavoritesStore {
    names: BTreeSet<String>,
    repo: Box<dyn Repository<BTreeSet<String>>>,
}

impl FavoritesStore {
    /// Restore favorites from `repo`. Unreadable data yields an empty set.
    pub fn load(repo: impl Repository<BTreeSet<String>> + 'static) -> Self {
        let names = match repo.load() {
            Ok(names) => names.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load favorite ingredients, starting empty: {:#}", e);
                BTreeSet::new()
            }
        };

        Self {
            names,
            repo: Box::new(repo),
        }
    }

    /// Flip the favorite flag for `name`. Returns true if it is now a favorite.
    pub fn toggle(&mut self, name: &str) -> bool {
        let now_favorite = if self.names.remove(name) {
            false
        } else {
            self.names.insert(name.to_string());
            true
        };
        debug!("Ingredient '{}' favorite: {}", name, now_favorite);
        self.persist();
        now_favorite
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Favorite names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn persist(&self) {
        if let Err(e) = self.repo.save(&self.names) {
            warn!("Failed to persist favorite ingredients: {:#}", e);
        }
    }
}
