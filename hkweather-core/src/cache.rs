use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::warn;

use crate::config::Config;

/// A fetched value and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
        }
    }

    /// Younger than `refresh_rate` at `now`. Snapshots from the future count as stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, refresh_rate: Duration) -> bool {
        let age = now.signed_duration_since(self.fetched_at);
        match age.to_std() {
            Ok(age) => age < refresh_rate,
            Err(_) => false,
        }
    }
}

/// One JSON file per feed in the cache directory.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform cache directory.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::project_dirs()?.cache_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Stored snapshot for `name`. Unreadable or outdated files are ignored.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<Snapshot<T>> {
        let path = self.path(name);
        let contents = fs::read_to_string(&path).ok()?;

        match serde_json::from_str(&contents) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(path = %path.display(), "ignoring unreadable cache file: {err}");
                None
            }
        }
    }

    pub fn store<T: Serialize>(&self, name: &str, snapshot: &Snapshot<T>) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache directory: {}", self.dir.display()))?;

        let path = self.path(name);
        let json = serde_json::to_string(snapshot).context("Failed to serialize snapshot")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;

        Ok(())
    }

    pub fn clear(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn freshness_follows_refresh_rate() {
        let snapshot = Snapshot::new(1);
        let rate = Duration::from_secs(30 * 60);

        assert!(snapshot.is_fresh(snapshot.fetched_at + TimeDelta::minutes(29), rate));
        assert!(!snapshot.is_fresh(snapshot.fetched_at + TimeDelta::minutes(30), rate));
        assert!(!snapshot.is_fresh(snapshot.fetched_at - TimeDelta::minutes(1), rate));
    }

    #[test]
    fn store_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().join("cache"));

        assert!(cache.load::<Vec<String>>("tips").is_none());

        let snapshot = Snapshot::new(vec!["Hot".to_string()]);
        cache.store("tips", &snapshot).unwrap();
        assert_eq!(cache.load::<Vec<String>>("tips"), Some(snapshot));

        cache.clear("tips").unwrap();
        assert!(cache.load::<Vec<String>>("tips").is_none());
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path());
        fs::write(dir.path().join("current.json"), "{not json").unwrap();

        assert!(cache.load::<u32>("current").is_none());
    }
}
