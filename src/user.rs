//! Optional personal details used to tailor remote analysis prompts.

use serde::{Deserialize, Serialize};

/// Youngest and oldest ages accepted as valid input.
pub const MIN_AGE: u32 = 13;
pub const MAX_AGE: u32 = 100;

/// Name and age as entered by the user. Both may be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
}

impl UserContext {
    pub fn new(name: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: age.into(),
        }
    }

    /// True when neither a name nor an age was provided.
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.age.trim().is_empty()
    }

    pub fn age_years(&self) -> Option<u32> {
        self.age.trim().parse().ok()
    }

    pub fn has_valid_age(&self) -> bool {
        self.age_years()
            .map(|age| (MIN_AGE..=MAX_AGE).contains(&age))
            .unwrap_or(false)
    }
}
