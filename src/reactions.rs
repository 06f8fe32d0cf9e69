//! Bookmarks and likes: toggling, explicit add/remove and the "my articles"
//! listings, keeping the denormalized counters in step with the rows.

use chrono::Utc;
use rocket::serde::json::Json;
use serde::Serialize;
use tracing::info;

use crate::article::{Article, ArticleView};
use crate::auth::{CurrentPrincipal, Principal};
use crate::db::store::{Association, Store};
use crate::db::DbConnection;
use crate::types::{ApiError, ApiResult};
use crate::users::authorize;

fn load_article<S: Store>(store: &mut S, article_id: i32) -> Result<Article, ApiError> {
    store
        .find_article(article_id)?
        .ok_or(ApiError::NotFound("article"))
}

/// Moves the counters that mirror `kind` rows by `delta`.
fn adjust_counters<S: Store>(
    store: &mut S,
    kind: Association,
    user_id: i32,
    article_id: i32,
    delta: i32,
) -> Result<(), ApiError> {
    store.bump_user_counter(user_id, kind.user_counter(), delta)?;
    if kind.counts_on_article() {
        store.bump_article_likes(article_id, delta)?;
    }
    Ok(())
}

/// Creates the association if it is absent, removes it otherwise. Returns
/// whether the association exists afterwards.
pub fn toggle<S: Store>(
    store: &mut S,
    principal: &Principal,
    kind: Association,
    user_id: i32,
    article_id: i32,
) -> Result<bool, ApiError> {
    let user = authorize(store, principal, user_id)?;
    let article = load_article(store, article_id)?;

    let active = if store.delete_association(kind, user.id, article.id)? {
        adjust_counters(store, kind, user.id, article.id, -1)?;
        false
    } else {
        // A concurrent toggle may have inserted the row between the delete
        // and here; only the insert that actually wrote it counts.
        if store.insert_association(kind, user.id, article.id, Utc::now().naive_utc())? {
            adjust_counters(store, kind, user.id, article.id, 1)?;
        }
        true
    };

    info!(user_id, article_id, kind = kind.name(), active, "association toggled");
    Ok(active)
}

/// Fails with a conflict when the association already exists.
pub fn add<S: Store>(
    store: &mut S,
    principal: &Principal,
    kind: Association,
    user_id: i32,
    article_id: i32,
) -> Result<(), ApiError> {
    let user = authorize(store, principal, user_id)?;
    let article = load_article(store, article_id)?;

    if !store.insert_association(kind, user.id, article.id, Utc::now().naive_utc())? {
        return Err(ApiError::Conflict(match kind {
            Association::Bookmark => "article is already bookmarked",
            Association::Like => "article is already liked",
        }));
    }
    adjust_counters(store, kind, user.id, article.id, 1)?;

    info!(user_id, article_id, kind = kind.name(), "association added");
    Ok(())
}

/// Fails with a conflict when there is no association to remove.
pub fn remove<S: Store>(
    store: &mut S,
    principal: &Principal,
    kind: Association,
    user_id: i32,
    article_id: i32,
) -> Result<(), ApiError> {
    let user = authorize(store, principal, user_id)?;
    let article = load_article(store, article_id)?;

    if !store.delete_association(kind, user.id, article.id)? {
        return Err(ApiError::Conflict(match kind {
            Association::Bookmark => "article is not bookmarked",
            Association::Like => "article is not liked",
        }));
    }
    adjust_counters(store, kind, user.id, article.id, -1)?;

    info!(user_id, article_id, kind = kind.name(), "association removed");
    Ok(())
}

/// The user's `kind` articles, most recent first, flagged with whether the
/// user also holds the other kind of association on each.
pub fn list<S: Store>(
    store: &mut S,
    principal: &Principal,
    kind: Association,
    user_id: i32,
) -> Result<Vec<ArticleView>, ApiError> {
    let user = authorize(store, principal, user_id)?;
    let articles = store.associated_articles(kind, user.id)?;
    let ids = articles.iter().map(|article| article.id).collect::<Vec<i32>>();
    let also = store.associated_among(kind.other(), user.id, &ids)?;

    Ok(articles
        .into_iter()
        .map(|article| {
            let other = also.contains(&article.id);
            ArticleView::new(article, kind, other)
        })
        .collect())
}

#[derive(Debug, Serialize)]
pub struct BookmarkState {
    bookmarked: bool,
}

#[derive(Debug, Serialize)]
pub struct LikeState {
    liked: bool,
}

#[derive(Debug, Serialize)]
pub struct ArticleList {
    articles: Vec<ArticleView>,
}

#[post("/users/<user_id>/bookmarks/<article_id>")]
pub async fn toggle_bookmark(
    user_id: i32,
    article_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<BookmarkState> {
    let principal = principal?;
    let bookmarked = connection
        .transact(move |store| toggle(store, &principal, Association::Bookmark, user_id, article_id))
        .await?;
    Ok(Json(BookmarkState { bookmarked }))
}

#[put("/users/<user_id>/bookmarks/<article_id>")]
pub async fn add_bookmark(
    user_id: i32,
    article_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<BookmarkState> {
    let principal = principal?;
    connection
        .transact(move |store| add(store, &principal, Association::Bookmark, user_id, article_id))
        .await?;
    Ok(Json(BookmarkState { bookmarked: true }))
}

#[delete("/users/<user_id>/bookmarks/<article_id>")]
pub async fn remove_bookmark(
    user_id: i32,
    article_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<BookmarkState> {
    let principal = principal?;
    connection
        .transact(move |store| remove(store, &principal, Association::Bookmark, user_id, article_id))
        .await?;
    Ok(Json(BookmarkState { bookmarked: false }))
}

#[get("/users/<user_id>/bookmarks")]
pub async fn bookmarks(
    user_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<ArticleList> {
    let principal = principal?;
    let articles = connection
        .transact(move |store| list(store, &principal, Association::Bookmark, user_id))
        .await?;
    Ok(Json(ArticleList { articles }))
}

#[post("/users/<user_id>/likes/<article_id>")]
pub async fn toggle_like(
    user_id: i32,
    article_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<LikeState> {
    let principal = principal?;
    let liked = connection
        .transact(move |store| toggle(store, &principal, Association::Like, user_id, article_id))
        .await?;
    Ok(Json(LikeState { liked }))
}

#[put("/users/<user_id>/likes/<article_id>")]
pub async fn add_like(
    user_id: i32,
    article_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<LikeState> {
    let principal = principal?;
    connection
        .transact(move |store| add(store, &principal, Association::Like, user_id, article_id))
        .await?;
    Ok(Json(LikeState { liked: true }))
}

#[delete("/users/<user_id>/likes/<article_id>")]
pub async fn remove_like(
    user_id: i32,
    article_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<LikeState> {
    let principal = principal?;
    connection
        .transact(move |store| remove(store, &principal, Association::Like, user_id, article_id))
        .await?;
    Ok(Json(LikeState { liked: false }))
}

#[get("/users/<user_id>/likes")]
pub async fn likes(
    user_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<ArticleList> {
    let principal = principal?;
    let articles = connection
        .transact(move |store| list(store, &principal, Association::Like, user_id))
        .await?;
    Ok(Json(ArticleList { articles }))
}
