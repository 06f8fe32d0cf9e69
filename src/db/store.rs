use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::article::Article;
use crate::types::ApiError;
use crate::users::models::User;

/// The two kinds of user → article association rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Association {
    Bookmark,
    Like,
}

impl Association {
    pub fn name(self) -> &'static str {
        match self {
            Association::Bookmark => "bookmark",
            Association::Like => "like",
        }
    }

    pub fn other(self) -> Association {
        match self {
            Association::Bookmark => Association::Like,
            Association::Like => Association::Bookmark,
        }
    }

    /// The counter on the owning user that mirrors the number of rows.
    pub fn user_counter(self) -> Counter {
        match self {
            Association::Bookmark => Counter::Bookmarks,
            Association::Like => Counter::Likes,
        }
    }

    /// Likes are also counted on the article side.
    pub fn counts_on_article(self) -> bool {
        self == Association::Like
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Bookmarks,
    Likes,
}

/// Persistence operations the profile and association services need.
///
/// Every method is a single statement; callers that need several of them to
/// commit together run inside `DbConnection::transact`.
pub trait Store {
    fn find_user(&mut self, id: i32) -> Result<Option<User>, ApiError>;

    fn find_article(&mut self, id: i32) -> Result<Option<Article>, ApiError>;

    /// Writes the profile columns of `user`. Counters are left untouched.
    fn save_profile(&mut self, user: &User) -> Result<(), ApiError>;

    /// Returns `false` when the row already existed.
    fn insert_association(
        &mut self,
        kind: Association,
        user_id: i32,
        article_id: i32,
        at: NaiveDateTime,
    ) -> Result<bool, ApiError>;

    /// Returns `false` when there was no row to delete.
    fn delete_association(
        &mut self,
        kind: Association,
        user_id: i32,
        article_id: i32,
    ) -> Result<bool, ApiError>;

    /// Articles associated with the user, most recently modified row first.
    fn associated_articles(
        &mut self,
        kind: Association,
        user_id: i32,
    ) -> Result<Vec<Article>, ApiError>;

    /// The subset of `article_ids` the user has a `kind` row for.
    fn associated_among(
        &mut self,
        kind: Association,
        user_id: i32,
        article_ids: &[i32],
    ) -> Result<HashSet<i32>, ApiError>;

    fn bump_user_counter(
        &mut self,
        user_id: i32,
        counter: Counter,
        delta: i32,
    ) -> Result<(), ApiError>;

    fn bump_article_likes(&mut self, article_id: i32, delta: i32) -> Result<(), ApiError>;
}
