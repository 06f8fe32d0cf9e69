use std::collections::HashSet;

use chrono::NaiveDateTime;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::schema::{articles, users};
use super::store::{Association, Counter, Store};
use crate::article::Article;
use crate::types::ApiError;
use crate::users::models::User;

/// Expands `$body` once per association table, with `$table` bound to the
/// matching schema module.
macro_rules! association_table {
    ($kind:expr, $table:ident => $body:expr) => {
        match $kind {
            Association::Bookmark => {
                use crate::db::schema::bookmarks as $table;
                $body
            }
            Association::Like => {
                use crate::db::schema::likes as $table;
                $body
            }
        }
    };
}

pub struct PgStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgStore<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        PgStore { conn }
    }

    fn conn(&mut self) -> &mut PgConnection {
        self.conn
    }
}

impl<'c> Store for PgStore<'c> {
    fn find_user(&mut self, id: i32) -> Result<Option<User>, ApiError> {
        let user = users::table
            .find(id)
            .select(User::as_select())
            .first(self.conn())
            .optional()?;
        Ok(user)
    }

    fn find_article(&mut self, id: i32) -> Result<Option<Article>, ApiError> {
        let article = articles::table
            .find(id)
            .select(Article::as_select())
            .first(self.conn())
            .optional()?;
        Ok(article)
    }

    fn save_profile(&mut self, user: &User) -> Result<(), ApiError> {
        diesel::update(users::table.find(user.id))
            .set((
                users::user_name.eq(&user.user_name),
                users::img_url.eq(&user.img_url),
                users::introduction.eq(&user.introduction),
                users::is_open.eq(user.is_open),
            ))
            .execute(self.conn())?;
        Ok(())
    }

    fn insert_association(
        &mut self,
        kind: Association,
        user_id: i32,
        article_id: i32,
        at: NaiveDateTime,
    ) -> Result<bool, ApiError> {
        let conn = self.conn();
        let inserted = association_table!(kind, assoc => diesel::insert_into(assoc::table)
            .values((
                assoc::user_id.eq(user_id),
                assoc::article_id.eq(article_id),
                assoc::created_at.eq(at),
                assoc::modified_at.eq(at),
            ))
            .on_conflict((assoc::user_id, assoc::article_id))
            .do_nothing()
            .execute(conn)?);
        Ok(inserted == 1)
    }

    fn delete_association(
        &mut self,
        kind: Association,
        user_id: i32,
        article_id: i32,
    ) -> Result<bool, ApiError> {
        let conn = self.conn();
        let deleted = association_table!(kind, assoc => diesel::delete(
            assoc::table
                .filter(assoc::user_id.eq(user_id))
                .filter(assoc::article_id.eq(article_id)),
        )
        .execute(conn)?);
        Ok(deleted > 0)
    }

    fn associated_articles(
        &mut self,
        kind: Association,
        user_id: i32,
    ) -> Result<Vec<Article>, ApiError> {
        let conn = self.conn();
        let rows = association_table!(kind, assoc => assoc::table
            .inner_join(articles::table)
            .filter(assoc::user_id.eq(user_id))
            .order((assoc::modified_at.desc(), assoc::id.desc()))
            .select(Article::as_select())
            .load::<Article>(conn)?);
        Ok(rows)
    }

    fn associated_among(
        &mut self,
        kind: Association,
        user_id: i32,
        article_ids: &[i32],
    ) -> Result<HashSet<i32>, ApiError> {
        if article_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.conn();
        let ids = article_ids.to_vec();
        let found = association_table!(kind, assoc => assoc::table
            .filter(assoc::user_id.eq(user_id))
            .filter(assoc::article_id.eq_any(ids))
            .select(assoc::article_id)
            .load::<i32>(conn)?);
        Ok(found.into_iter().collect())
    }

    fn bump_user_counter(
        &mut self,
        user_id: i32,
        counter: Counter,
        delta: i32,
    ) -> Result<(), ApiError> {
        let conn = self.conn();
        let target = users::table.find(user_id);
        let updated = match counter {
            Counter::Bookmarks => diesel::update(target)
                .set(users::bookmark_count.eq(users::bookmark_count + delta))
                .execute(conn)?,
            Counter::Likes => diesel::update(target)
                .set(users::like_count.eq(users::like_count + delta))
                .execute(conn)?,
        };
        if updated == 0 {
            return Err(ApiError::NotFound("user"));
        }
        Ok(())
    }

    fn bump_article_likes(&mut self, article_id: i32, delta: i32) -> Result<(), ApiError> {
        let updated = diesel::update(articles::table.find(article_id))
            .set(articles::like_count.eq(articles::like_count + delta))
            .execute(self.conn())?;
        if updated == 0 {
            return Err(ApiError::NotFound("article"));
        }
        Ok(())
    }
}
