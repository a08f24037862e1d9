// In-memory credential store
//
// Everything sits behind one parking_lot RwLock so concurrent handlers see a
// consistent view. News keep insertion order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{CredentialStore, NewNews, News, NewsUpdate, StoreError, StoreResult, User};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    usernames: HashMap<String, String>,
    news: Vec<News>,
    last_created_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    // Wall clock can step backwards; creation times must not.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created_at = Some(ts);
        ts
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut inner = self.inner.write();
        if inner.usernames.contains_key(&user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }
        inner.usernames.insert(user.username.clone(), user.id.clone());
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().users.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read();
        Ok(inner
            .usernames
            .get(username)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn list_news(&self) -> StoreResult<Vec<News>> {
        Ok(self.inner.read().news.clone())
    }

    async fn get_news(&self, id: &str) -> StoreResult<Option<News>> {
        Ok(self.inner.read().news.iter().find(|n| n.id == id).cloned())
    }

    async fn insert_news(&self, news: NewNews) -> StoreResult<News> {
        let mut inner = self.inner.write();
        if !inner.users.contains_key(&news.author) {
            return Err(StoreError::UnknownAuthor(news.author));
        }
        let record = News {
            id: news.id,
            title: news.title,
            body: news.body,
            author: news.author,
            created_at: inner.next_created_at(),
        };
        inner.news.push(record.clone());
        Ok(record)
    }

    async fn update_news(&self, id: &str, update: NewsUpdate) -> StoreResult<News> {
        let mut inner = self.inner.write();
        if let Some(author) = &update.author {
            if !inner.users.contains_key(author) {
                return Err(StoreError::UnknownAuthor(author.clone()));
            }
        }
        let record = inner
            .news
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StoreError::NotFound)?;
        update.apply_to(record);
        Ok(record.clone())
    }

    async fn delete_news(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let position = inner
            .news
            .iter()
            .position(|n| n.id == id)
            .ok_or(StoreError::NotFound)?;
        inner.news.remove(position);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
