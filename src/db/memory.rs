//! In-memory `Store` for service tests.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};

use super::store::{Association, Counter, Store};
use crate::article::Article;
use crate::types::ApiError;
use crate::users::models::User;

#[derive(Debug, Clone)]
struct Row {
    id: i32,
    kind: Association,
    user_id: i32,
    article_id: i32,
    modified_at: NaiveDateTime,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: BTreeMap<i32, User>,
    articles: BTreeMap<i32, Article>,
    rows: Vec<Row>,
    next_row_id: i32,
}

pub fn user(id: i32, email: &str) -> User {
    User {
        id,
        email: email.to_string(),
        user_name: format!("user{}", id),
        img_url: None,
        introduction: None,
        is_open: true,
        bookmark_count: 0,
        like_count: 0,
        subscribe_count: 0,
    }
}

pub fn article(id: i32, title: &str) -> Article {
    Article {
        id,
        title: title.to_string(),
        body: format!("body of {}", title),
        like_count: 0,
        created_at: at(0),
    }
}

/// A fixed timestamp `seconds` after midnight, 2023-02-08.
pub fn at(seconds: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 2, 8)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight + chrono::Duration::seconds(seconds.into()))
        .expect("valid timestamp")
}

impl MemoryStore {
    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.id, user);
        self
    }

    pub fn with_article(mut self, article: Article) -> Self {
        self.articles.insert(article.id, article);
        self
    }

    pub fn user(&self, id: i32) -> &User {
        &self.users[&id]
    }

    pub fn article(&self, id: i32) -> &Article {
        &self.articles[&id]
    }

    pub fn has(&self, kind: Association, user_id: i32, article_id: i32) -> bool {
        self.rows
            .iter()
            .any(|row| row.kind == kind && row.user_id == user_id && row.article_id == article_id)
    }

    pub fn count(&self, kind: Association, user_id: i32) -> usize {
        self.rows
            .iter()
            .filter(|row| row.kind == kind && row.user_id == user_id)
            .count()
    }
}

impl Store for MemoryStore {
    fn find_user(&mut self, id: i32) -> Result<Option<User>, ApiError> {
        Ok(self.users.get(&id).cloned())
    }

    fn find_article(&mut self, id: i32) -> Result<Option<Article>, ApiError> {
        Ok(self.articles.get(&id).cloned())
    }

    fn save_profile(&mut self, user: &User) -> Result<(), ApiError> {
        let stored = self.users.get_mut(&user.id).ok_or(ApiError::NotFound("user"))?;
        stored.user_name = user.user_name.clone();
        stored.img_url = user.img_url.clone();
        stored.introduction = user.introduction.clone();
        stored.is_open = user.is_open;
        Ok(())
    }

    fn insert_association(
        &mut self,
        kind: Association,
        user_id: i32,
        article_id: i32,
        at: NaiveDateTime,
    ) -> Result<bool, ApiError> {
        if self.has(kind, user_id, article_id) {
            return Ok(false);
        }
        self.next_row_id += 1;
        self.rows.push(Row {
            id: self.next_row_id,
            kind,
            user_id,
            article_id,
            modified_at: at,
        });
        Ok(true)
    }

    fn delete_association(
        &mut self,
        kind: Association,
        user_id: i32,
        article_id: i32,
    ) -> Result<bool, ApiError> {
        let before = self.rows.len();
        self.rows.retain(|row| {
            !(row.kind == kind && row.user_id == user_id && row.article_id == article_id)
        });
        Ok(self.rows.len() < before)
    }

    fn associated_articles(
        &mut self,
        kind: Association,
        user_id: i32,
    ) -> Result<Vec<Article>, ApiError> {
        let mut rows: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| row.kind == kind && row.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| (b.modified_at, b.id).cmp(&(a.modified_at, a.id)));
        Ok(rows
            .into_iter()
            .filter_map(|row| self.articles.get(&row.article_id).cloned())
            .collect())
    }

    fn associated_among(
        &mut self,
        kind: Association,
        user_id: i32,
        article_ids: &[i32],
    ) -> Result<HashSet<i32>, ApiError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.kind == kind && row.user_id == user_id)
            .filter(|row| article_ids.contains(&row.article_id))
            .map(|row| row.article_id)
            .collect())
    }

    fn bump_user_counter(
        &mut self,
        user_id: i32,
        counter: Counter,
        delta: i32,
    ) -> Result<(), ApiError> {
        let user = self.users.get_mut(&user_id).ok_or(ApiError::NotFound("user"))?;
        match counter {
            Counter::Bookmarks => user.bookmark_count += delta,
            Counter::Likes => user.like_count += delta,
        }
        Ok(())
    }

    fn bump_article_likes(&mut self, article_id: i32, delta: i32) -> Result<(), ApiError> {
        let article = self
            .articles
            .get_mut(&article_id)
            .ok_or(ApiError::NotFound("article"))?;
        article.like_count += delta;
        Ok(())
    }
}
