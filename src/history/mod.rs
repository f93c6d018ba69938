//! Search history and public share links

use crate::error::{Error, Result};
use crate::results::SearchResult;
use crate::search::SearchConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// One stored search and its results snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub query: String,
    pub config: SearchConfig,
    pub result_count: usize,
    pub results: Vec<SearchResult>,
    pub shared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SearchHistoryEntry {
    pub fn new(user_id: impl Into<String>, config: SearchConfig, results: Vec<SearchResult>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            query: config.query.clone(),
            result_count: results.len(),
            config,
            results,
            shared: false,
            share_token: None,
            created_at: Utc::now(),
        }
    }

    /// Fraction of results carrying an analysis
    pub fn analysis_progress(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        let analyzed = self.results.iter().filter(|r| r.is_analyzed()).count();
        analyzed as f64 / self.results.len() as f64
    }
}

/// Create an unguessable share token: 16 random bytes, hex encoded
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Storage for search history.
///
/// Every operation taking a `user_id` only touches that user's entries.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert(&self, entry: SearchHistoryEntry) -> Result<SearchHistoryEntry>;

    /// Entry owned by `user_id`
    async fn get(&self, id: &str, user_id: &str) -> Result<SearchHistoryEntry>;

    /// Most recent entries first
    async fn list_recent(&self, user_id: &str, limit: usize) -> Result<Vec<SearchHistoryEntry>>;

    /// Replace one result in an entry's snapshot
    async fn update_result(&self, id: &str, index: usize, result: SearchResult) -> Result<()>;

    /// Mark an entry shared, returning its new token
    async fn share(&self, id: &str, user_id: &str) -> Result<String>;

    async fn unshare(&self, id: &str, user_id: &str) -> Result<()>;

    /// Shared entry for a token, whoever owns it
    async fn find_shared(&self, token: &str) -> Result<SearchHistoryEntry>;

    async fn delete(&self, id: &str, user_id: &str) -> Result<()>;
}

/// In-process history store
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<HashMap<String, SearchHistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_owned<T, F>(&self, id: &str, user_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut SearchHistoryEntry) -> T,
    {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        match entries.get_mut(id) {
            Some(entry) if entry.user_id == user_id => Ok(f(entry)),
            _ => Err(Error::NotFound("Search".into())),
        }
    }
}

fn poisoned() -> Error {
    Error::Internal(anyhow::anyhow!("history store lock poisoned"))
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn insert(&self, entry: SearchHistoryEntry) -> Result<SearchHistoryEntry> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: &str, user_id: &str) -> Result<SearchHistoryEntry> {
        self.with_owned(id, user_id, |entry| entry.clone())
    }

    async fn list_recent(&self, user_id: &str, limit: usize) -> Result<Vec<SearchHistoryEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut owned: Vec<SearchHistoryEntry> = entries
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(limit);
        Ok(owned)
    }

    async fn update_result(&self, id: &str, index: usize, result: SearchResult) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| Error::NotFound("Search".into()))?;
        let slot = entry
            .results
            .get_mut(index)
            .ok_or_else(|| Error::NotFound("Result".into()))?;
        *slot = result;
        Ok(())
    }

    async fn share(&self, id: &str, user_id: &str) -> Result<String> {
        let token = generate_share_token();
        self.with_owned(id, user_id, |entry| {
            entry.shared = true;
            entry.share_token = Some(token.clone());
        })?;
        Ok(token)
    }

    async fn unshare(&self, id: &str, user_id: &str) -> Result<()> {
        self.with_owned(id, user_id, |entry| {
            entry.shared = false;
            entry.share_token = None;
        })
    }

    async fn find_shared(&self, token: &str) -> Result<SearchHistoryEntry> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        entries
            .values()
            .find(|e| e.shared && e.share_token.as_deref() == Some(token))
            .cloned()
            .ok_or_else(|| Error::NotFound("Shared search".into()))
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let owned = entries.get(id).map(|e| e.user_id == user_id).unwrap_or(false);
        if !owned {
            return Err(Error::NotFound("Search".into()));
        }
        entries.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    fn entry(user: &str, query: &str) -> SearchHistoryEntry {
        let results = vec![
            SearchResult::new("https://nme.com/a", "A", "NME"),
            SearchResult::new("https://nme.com/b", "B", "NME"),
        ];
        SearchHistoryEntry::new(user, SearchConfig::simple(query), results)
    }

    #[test]
    fn test_share_token_shape_and_uniqueness() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_share_token()).collect();
        assert_eq!(tokens.len(), 1000);
        for token in &tokens {
            assert_eq!(token.len(), 32);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let store = MemoryHistoryStore::new();
        let saved = store.insert(entry("alice", "Radiohead")).await.unwrap();

        assert!(store.get(&saved.id, "alice").await.is_ok());
        assert!(matches!(
            store.get(&saved.id, "bob").await,
            Err(Error::NotFound(_))
        ));
        assert!(store.share(&saved.id, "bob").await.is_err());
        assert!(store.delete(&saved.id, "bob").await.is_err());
        assert!(store.delete(&saved.id, "alice").await.is_ok());
        assert!(store.get(&saved.id, "alice").await.is_err());
    }

    #[tokio::test]
    async fn test_share_and_unshare() {
        let store = MemoryHistoryStore::new();
        let saved = store.insert(entry("alice", "Radiohead")).await.unwrap();

        let token = store.share(&saved.id, "alice").await.unwrap();
        let shared = store.find_shared(&token).await.unwrap();
        assert_eq!(shared.id, saved.id);
        assert!(shared.shared);

        // a second share rotates the token
        let rotated = store.share(&saved.id, "alice").await.unwrap();
        assert_ne!(token, rotated);
        assert!(store.find_shared(&token).await.is_err());

        store.unshare(&saved.id, "alice").await.unwrap();
        assert!(store.find_shared(&rotated).await.is_err());
        assert_eq!(store.get(&saved.id, "alice").await.unwrap().share_token, None);
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let store = MemoryHistoryStore::new();
        let base = Utc::now();
        for i in 0..25 {
            let mut e = entry("alice", &format!("q{}", i));
            e.created_at = base + Duration::seconds(i);
            store.insert(e).await.unwrap();
        }
        store.insert(entry("bob", "other")).await.unwrap();

        let recent = store.list_recent("alice", 20).await.unwrap();
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].query, "q24");
        assert_eq!(recent[19].query, "q5");
    }

    #[tokio::test]
    async fn test_update_result() {
        let store = MemoryHistoryStore::new();
        let saved = store.insert(entry("alice", "Radiohead")).await.unwrap();

        let mut updated = saved.results[1].clone();
        updated.is_analyzing = true;
        store.update_result(&saved.id, 1, updated).await.unwrap();

        let stored = store.get(&saved.id, "alice").await.unwrap();
        assert!(stored.results[1].is_analyzing);
        assert_eq!(stored.result_count, 2);
        assert!(store
            .update_result(&saved.id, 5, saved.results[0].clone())
            .await
            .is_err());
        assert_eq!(stored.analysis_progress(), 0.0);
    }
}
