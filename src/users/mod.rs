use tracing::warn;

use crate::auth::Principal;
use crate::db::store::Store;
use crate::types::ApiError;

pub mod models;
pub mod utils;

/// Loads `user_id` and checks that it belongs to the authenticated caller.
///
/// Every profile and association operation starts here.
pub fn authorize<S: Store>(
    store: &mut S,
    principal: &Principal,
    user_id: i32,
) -> Result<models::User, ApiError> {
    let user = store.find_user(user_id)?.ok_or(ApiError::NotFound("user"))?;
    if !user.owned_by(principal.email()) {
        warn!(user_id, "caller does not own the requested user");
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}
