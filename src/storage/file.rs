use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use super::Repository;

/// A JSON value stored in its own file.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so an interrupted write never leaves a partial
/// file behind.
pub struct JsonFileRepository<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileRepository<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Repository<T> for JsonFileRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to decode {:?}", self.path))?;
        Ok(Some(value))
    }

    fn save(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Target path has no parent directory: {:?}", self.path))?;
        std::fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path)?;

        debug!("Wrote {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let repo: JsonFileRepository<Vec<u8>> = JsonFileRepository::new(dir.path().join("x.json"));
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("sub").join("goals.json"));
        repo.save(&vec!["a".to_string(), "b".to_string()]).unwrap();

        let loaded: Option<Vec<String>> = repo.load().unwrap();
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));

        // No temp files left next to the target
        let entries = std::fs::read_dir(dir.path().join("sub")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let repo: JsonFileRepository<Vec<String>> = JsonFileRepository::new(&path);
        assert!(repo.load().is_err());
    }
}
