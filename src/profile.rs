use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rocket::form::{Form, FromForm};
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::tokio::io::AsyncReadExt;
use rocket::tokio::task::spawn_blocking;
use rocket::State;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{CurrentPrincipal, Principal};
use crate::blob::{BlobStore, SharedBlobStore};
use crate::db::store::Store;
use crate::db::DbConnection;
use crate::types::{ApiError, ApiResult, Validate};
use crate::users::authorize;
use crate::users::models::{ImageUpload, ProfilePatch, ProfileUpdate, ProfileView};
use crate::users::utils::sanitize_file_name;

pub fn get_profile<S: Store>(
    store: &mut S,
    principal: &Principal,
    user_id: i32,
) -> Result<ProfileView, ApiError> {
    let user = authorize(store, principal, user_id)?;
    Ok(user.profile())
}

/// Storage key for an uploaded profile image: grouped by upload day, made
/// unique with a random prefix.
pub fn image_key(day: NaiveDate, file_name: &str) -> String {
    format!(
        "user/{}/{}_{}",
        day.format("%Y-%m-%d"),
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

/// Ownership and field checks, run before anything is stored. An empty image
/// part counts as no image at all.
pub fn check_update<S: Store>(
    store: &mut S,
    principal: &Principal,
    user_id: i32,
    mut update: ProfileUpdate,
) -> Result<ProfileUpdate, ApiError> {
    authorize(store, principal, user_id)?;
    update.image = update.image.filter(|image| !image.data.is_empty());
    Ok(update.validate()?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

pub fn store_image(
    blobs: &dyn BlobStore,
    image: &ImageUpload,
    day: NaiveDate,
) -> Result<StoredImage, ApiError> {
    let key = image_key(day, &image.file_name);
    let url = blobs.put(&key, &image.data, image.content_type.as_deref())?;
    info!(%key, "profile image stored");
    Ok(StoredImage { key, url })
}

/// Removes an image whose profile update was not saved.
pub fn discard_image(blobs: &dyn BlobStore, image: &StoredImage) {
    match blobs.delete(&image.key) {
        Ok(()) => info!(key = %image.key, "unused profile image removed"),
        Err(error) => warn!(%error, key = %image.key, "profile image left behind"),
    }
}

/// Applies a checked patch and, when given, points the profile at a newly
/// stored image.
pub fn save_update<S: Store>(
    store: &mut S,
    principal: &Principal,
    user_id: i32,
    patch: ProfilePatch,
    img_url: Option<String>,
) -> Result<ProfileView, ApiError> {
    let mut user = authorize(store, principal, user_id)?;
    if let Some(url) = img_url {
        user.img_url = Some(url);
    }

    user.apply(patch);
    store.save_profile(&user)?;

    info!(user_id, is_open = user.is_open, "profile updated");
    Ok(user.profile())
}

#[derive(Debug, FromForm)]
pub struct ProfileForm<'r> {
    #[field(name = "userName")]
    user_name: Option<String>,
    introduction: Option<String>,
    #[field(name = "isOpen")]
    is_open: bool,
    image: Option<TempFile<'r>>,
}

async fn read_upload(file: &TempFile<'_>) -> Result<ImageUpload, ApiError> {
    let mut data = Vec::with_capacity(file.len() as usize);
    let mut reader = Box::pin(file.open().await?);
    reader.read_to_end(&mut data).await?;

    let stem = file.name().unwrap_or("image");
    let file_name = match file.content_type().and_then(|ct| ct.extension()) {
        Some(extension) => format!("{}.{}", stem, extension),
        None => stem.to_string(),
    };

    Ok(ImageUpload {
        file_name,
        content_type: file.content_type().map(|ct| ct.to_string()),
        data,
    })
}

#[get("/users/<user_id>/profile")]
pub async fn profile(
    user_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
) -> ApiResult<ProfileView> {
    let principal = principal?;
    let profile = connection
        .transact(move |store| get_profile(store, &principal, user_id))
        .await?;
    Ok(Json(profile))
}

// The image is written between two transactions so no connection is held
// inside one during file I/O. A failed save removes it again.
#[patch("/users/<user_id>/profile", data = "<form>")]
pub async fn update(
    user_id: i32,
    principal: CurrentPrincipal,
    connection: DbConnection,
    blobs: &State<SharedBlobStore>,
    form: Form<ProfileForm<'_>>,
) -> ApiResult<ProfileView> {
    let principal = principal?;
    let form = form.into_inner();

    let image = match &form.image {
        Some(file) if file.len() > 0 => Some(read_upload(file).await?),
        _ => None,
    };
    let update = ProfileUpdate {
        patch: ProfilePatch {
            user_name: form.user_name,
            introduction: form.introduction,
            is_open: form.is_open,
        },
        image,
    };

    let checker = principal.clone();
    let ProfileUpdate { patch, image } = connection
        .transact(move |store| check_update(store, &checker, user_id, update))
        .await?;

    let blobs: SharedBlobStore = Arc::clone(blobs.inner());
    let stored = match image {
        Some(image) => {
            let blobs = Arc::clone(&blobs);
            let day = Utc::now().date_naive();
            let stored = spawn_blocking(move || store_image(blobs.as_ref(), &image, day))
                .await
                .map_err(|_| ApiError::Internal)??;
            Some(stored)
        }
        None => None,
    };

    let img_url = stored.as_ref().map(|image| image.url.clone());
    let saved = connection
        .transact(move |store| save_update(store, &principal, user_id, patch, img_url))
        .await;
    if let (Err(_), Some(image)) = (&saved, &stored) {
        discard_image(blobs.as_ref(), image);
    }
    Ok(Json(saved?))
}
