#[macro_use]
extern crate diesel;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate rocket;

mod article;
mod auth;
mod blob;
mod config;
mod db;
mod profile;
mod reactions;
mod types;
mod users;
mod utils;

use std::process;
use std::sync::Arc;

use error_chain::ChainedError;
use rocket::fs::FileServer;
use rocket::{Build, Catcher, Rocket};
use serde_json::{json, Value};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::auth::TokenKey;
use crate::blob::{FileStore, SharedBlobStore};
use crate::config::AppConfig;

#[catch(401)]
fn unauthorized() -> Value {
    json!({
        "errors": {
            "status": "401 Unauthorized"
        }
    })
}

#[catch(404)]
fn not_found() -> Value {
    json!({
        "errors": [
            "entity not found"
        ]
    })
}

#[catch(422)]
fn unprocessable() -> Value {
    json!({
        "errors": [
            "request could not be processed"
        ]
    })
}

#[catch(500)]
fn internal_error() -> Value {
    json!({
        "errors": {
            "status": "500 Internal Server Error"
        }
    })
}

#[catch(503)]
fn unavailable() -> Value {
    json!({
        "errors": {
            "status": "503 Service Unavailable"
        }
    })
}

fn json_catchers() -> Vec<Catcher> {
    catchers![unauthorized, not_found, unprocessable, internal_error, unavailable]
}

fn build(config: &AppConfig) -> db::Result<Rocket<Build>> {
    let pool = db::init_pool(config)?;
    db::run_migrations(&pool)?;

    let token_key = TokenKey::new(config.token_secret.as_bytes())
        .ok_or(db::ErrorKind::InvalidSetting("TOKEN_SECRET", "unusable HMAC key".into()))?;
    let blobs = FileStore::open(&config.blob_root, &config.blob_base_url)?;
    let uploads = FileServer::from(blobs.root());
    let blobs: SharedBlobStore = Arc::new(blobs);

    Ok(rocket::build()
        .manage(pool)
        .manage(token_key)
        .manage(blobs)
        .mount("/api", routes![profile::profile, profile::update])
        .mount(
            "/api",
            routes![
                reactions::toggle_bookmark,
                reactions::add_bookmark,
                reactions::remove_bookmark,
                reactions::bookmarks,
                reactions::toggle_like,
                reactions::add_like,
                reactions::remove_like,
                reactions::likes,
            ],
        )
        .mount("/uploads", uploads)
        .register("/", json_catchers()))
}

#[rocket::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rocket = match AppConfig::from_env().and_then(|config| build(&config)) {
        Ok(rocket) => rocket,
        Err(e) => {
            error!(error = %e.display_chain(), "failed to start");
            process::exit(1);
        }
    };

    if let Err(e) = rocket.launch().await {
        error!(error = %e, "server stopped with an error");
        process::exit(1);
    }
}
