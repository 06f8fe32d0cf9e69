//! Throwaway Postgres databases for tests, created on an embedded cluster
//! shared by the whole test binary.
//!
//! Where the cluster cannot start, set `SKIP_TEST_CLUSTER=1` and the suites
//! that need it are skipped instead of failing.

use std::path::Path;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use rocket::http::Header;
use rocket::local::blocking::Client;
use uuid::Uuid;

use super::schema::{articles, users};
use super::{init_pool, run_migrations, Pool};
use crate::auth::sign_token;
use crate::config::AppConfig;

pub const TOKEN_SECRET: &str = "test-secret";

pub struct TestDatabase {
    pub url: String,
    pub pool: Pool,
}

impl TestDatabase {
    pub fn config(&self, blob_root: &Path) -> AppConfig {
        AppConfig {
            database_url: self.url.clone(),
            token_secret: TOKEN_SECRET.to_string(),
            pool_size: 2,
            blob_root: blob_root.to_path_buf(),
            blob_base_url: "/uploads".to_string(),
        }
    }

    /// The full application, as `main` builds it, on this database.
    pub fn client(&self, blob_root: &Path) -> Client {
        let rocket = crate::build(&self.config(blob_root)).expect("rocket should build");
        Client::tracked(rocket).expect("valid rocket")
    }

    pub fn connection(&self) -> r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>> {
        self.pool.get().expect("pooled connection")
    }
}

fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {}", reason);
        None
    } else {
        panic!("Test cluster setup failed: {}. Set SKIP_TEST_CLUSTER=1 to skip.", reason);
    }
}

fn create_database() -> Result<TestDatabase, String> {
    let cluster = shared_cluster_handle().map_err(|err| format!("{:?}", err))?;
    let name = format!("mypage_{}", Uuid::new_v4().simple());
    cluster
        .create_database(name.as_str())
        .map_err(|err| format!("create database: {:?}", err))?;
    let url = cluster.connection().database_url(name.as_str()).to_string();

    let config = AppConfig {
        database_url: url.clone(),
        token_secret: TOKEN_SECRET.to_string(),
        pool_size: 2,
        blob_root: std::env::temp_dir(),
        blob_base_url: "/uploads".to_string(),
    };
    let pool = init_pool(&config).map_err(|err| err.to_string())?;
    run_migrations(&pool).map_err(|err| err.to_string())?;

    Ok(TestDatabase { url, pool })
}

/// A freshly migrated database, or `None` when the cluster is unavailable and
/// skipping was asked for.
pub fn test_database() -> Option<TestDatabase> {
    match create_database() {
        Ok(database) => Some(database),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

pub fn insert_user(conn: &mut PgConnection, email: &str) -> QueryResult<i32> {
    diesel::insert_into(users::table)
        .values((users::email.eq(email), users::user_name.eq("reader")))
        .returning(users::id)
        .get_result(conn)
}

pub fn insert_article(conn: &mut PgConnection, title: &str) -> QueryResult<i32> {
    diesel::insert_into(articles::table)
        .values((articles::title.eq(title), articles::body.eq("body")))
        .returning(articles::id)
        .get_result(conn)
}

pub fn bearer(email: &str) -> Header<'static> {
    let token = sign_token(TOKEN_SECRET.as_bytes(), email, None);
    Header::new("Authorization", format!("Bearer {}", token))
}
