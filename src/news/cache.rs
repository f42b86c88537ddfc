use std::collections::HashMap;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::Article;
use crate::domain::Topic;

struct Entry {
    expires_at: DateTime<Utc>,
    articles: Vec<Article>,
}

/// In-memory TTL cache for fetched articles, keyed by topic and page size.
/// Expired entries are dropped on read. The aggregator's output changes
/// slowly, so a few minutes of staleness is a fine trade for not hammering a
/// metered API on every page view.
pub struct NewsCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl NewsCache {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(
        topic: Topic,
        page_size: u32,
    ) -> String {
        format!("news:{topic}:{page_size}")
    }

    pub fn get(
        &self,
        topic: Topic,
        page_size: u32,
    ) -> Option<Vec<Article>> {
        self.get_at(topic, page_size, Utc::now())
    }

    fn get_at(
        &self,
        topic: Topic,
        page_size: u32,
        now: DateTime<Utc>,
    ) -> Option<Vec<Article>> {
        let key = Self::key(topic, page_size);
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&key) {
            Some(entry) if now <= entry.expires_at => Some(entry.articles.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn set(
        &self,
        topic: Topic,
        page_size: u32,
        articles: Vec<Article>,
    ) {
        self.set_at(topic, page_size, articles, Utc::now())
    }

    fn set_at(
        &self,
        topic: Topic,
        page_size: u32,
        articles: Vec<Article>,
        now: DateTime<Utc>,
    ) {
        let entry = Entry {
            expires_at: now + self.ttl,
            articles,
        };
        self.entries
            .lock()
            .unwrap()
            .insert(Self::key(topic, page_size), entry);
    }

    pub fn clear(&self) { self.entries.lock().unwrap().clear(); }
}
