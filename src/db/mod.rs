use std::sync::{Arc, Mutex};

use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use rocket::tokio::task::spawn_blocking;
use tracing::info;

use crate::blob::BlobError;
use crate::config::AppConfig;
use crate::types::ApiError;

#[cfg(test)]
pub mod memory;
pub mod pg;
pub mod schema;
pub mod store;
#[cfg(test)]
pub mod testing;

pub use self::pg::PgStore;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

// An alias to the type for a pool of Diesel Postgres connections.
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

type PooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// A pooled connection held for the length of one request. Each `transact`
/// call borrows it on the blocking pool, so a handler can run several
/// transactions and do other work in between.
pub struct DbConnection(Arc<Mutex<PooledConnection>>);

error_chain! {
    foreign_links {
        Var(::std::env::VarError);
        ParseInt(::std::num::ParseIntError);
        R2D2(r2d2::Error);
        Blob(BlobError);
    }

    errors {
        MissingSetting(key: &'static str) {
            description("required setting is missing")
            display("required setting is missing: {}", key)
        }
        InvalidSetting(key: &'static str, reason: String) {
            description("setting has an invalid value")
            display("setting {} is invalid: {}", key, reason)
        }
        Migration(reason: String) {
            description("database migration failed")
            display("database migration failed: {}", reason)
        }
    }
}

/// Attempts to retrieve a single connection from the managed database pool. If
/// no pool is currently managed, fails with an `InternalServerError` status. If
/// no connections are available, fails with a `ServiceUnavailable` status.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for DbConnection {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<DbConnection, ()> {
        let pool = match request.rocket().state::<Pool>() {
            Some(pool) => pool.clone(),
            None => return Outcome::Error((Status::InternalServerError, ())),
        };
        match spawn_blocking(move || pool.get()).await {
            Ok(Ok(conn)) => Outcome::Success(DbConnection(Arc::new(Mutex::new(conn)))),
            _ => Outcome::Error((Status::ServiceUnavailable, ())),
        }
    }
}

impl DbConnection {
    /// Runs `f` inside a single database transaction on the blocking pool.
    /// Any error returned by `f` rolls the whole call back.
    pub async fn transact<T, F>(&self, f: F) -> std::result::Result<T, ApiError>
    where
        F: FnOnce(&mut PgStore<'_>) -> std::result::Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let shared = Arc::clone(&self.0);
        spawn_blocking(move || {
            let mut pooled = shared.lock().map_err(|_| ApiError::Internal)?;
            let conn: &mut PgConnection = &mut pooled;
            conn.transaction(|conn| f(&mut PgStore::new(conn)))
        })
        .await
        .map_err(|_| ApiError::Internal)?
    }
}

pub fn init_pool(config: &AppConfig) -> Result<Pool> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url.as_str());
    Ok(Pool::builder().max_size(config.pool_size).build(manager)?)
}

pub fn run_migrations(pool: &Pool) -> Result<()> {
    let mut pooled = pool.get()?;
    let conn: &mut PgConnection = &mut pooled;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| ErrorKind::Migration(e.to_string()))?;
    info!(applied = applied.len(), "database migrations applied");
    Ok(())
}
