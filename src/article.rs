use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::articles;
use crate::db::store::Association;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = articles)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub like_count: i32,
    pub created_at: NaiveDateTime,
}

/// One row of a "my bookmarks" / "my likes" listing.
///
/// `editors` and `img` are reserved for article credits and cover images,
/// which articles don't carry yet; they always serialize as `null`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub id: i32,
    pub title: String,
    pub like_count: i32,
    pub editors: Option<String>,
    pub img: Option<String>,
    pub is_bookmarked: bool,
    pub is_liked: bool,
}

impl ArticleView {
    /// `listed` is the association the row was listed through; `also` says
    /// whether the user holds the other kind of association too.
    pub fn new(article: Article, listed: Association, also: bool) -> Self {
        let (is_bookmarked, is_liked) = match listed {
            Association::Bookmark => (true, also),
            Association::Like => (also, true),
        };
        ArticleView {
            id: article.id,
            title: article.title,
            like_count: article.like_count,
            editors: None,
            img: None,
            is_bookmarked,
            is_liked,
        }
    }
}
