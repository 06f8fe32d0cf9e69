use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::users;
use crate::types::{Validate, ValidationError};

use super::utils::{validate_image_type, validate_introduction, validate_user_name};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub user_name: String,
    pub img_url: Option<String>,
    pub introduction: Option<String>,
    pub is_open: bool,
    pub bookmark_count: i32,
    pub like_count: i32,
    pub subscribe_count: i32,
}

impl User {
    pub fn owned_by(&self, email: &str) -> bool {
        self.email == email
    }

    /// Absent fields keep their value; the visibility flag is always taken
    /// from the patch.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(user_name) = patch.user_name {
            self.user_name = user_name;
        }
        if let Some(introduction) = patch.introduction {
            self.introduction = Some(introduction);
        }
        self.is_open = patch.is_open;
    }

    pub fn profile(&self) -> ProfileView {
        ProfileView {
            img_url: self.img_url.clone(),
            user_name: self.user_name.clone(),
            introduction: self.introduction.clone(),
            bookmark_count: self.bookmark_count,
            like_count: self.like_count,
            subscribe_count: self.subscribe_count,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub img_url: Option<String>,
    pub user_name: String,
    pub introduction: Option<String>,
    pub bookmark_count: i32,
    pub like_count: i32,
    pub subscribe_count: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub user_name: Option<String>,
    pub introduction: Option<String>,
    pub is_open: bool,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub patch: ProfilePatch,
    pub image: Option<ImageUpload>,
}

impl Validate for ProfileUpdate {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::default();

        if let Some(user_name) = &self.patch.user_name {
            if let Err(e) = validate_user_name(user_name) {
                errors.merge(e);
            }
        }

        if let Some(introduction) = &self.patch.introduction {
            if let Err(e) = validate_introduction(introduction) {
                errors.merge(e);
            }
        }

        if let Some(image) = &self.image {
            if let Err(e) = validate_image_type(image.content_type.as_deref()) {
                errors.merge(e);
            }
        }

        if errors.empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }
}
