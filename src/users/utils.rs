use regex::Regex;

use crate::types::ValidationError;

pub const MAX_USER_NAME_CHARS: usize = 30;
pub const MAX_INTRODUCTION_CHARS: usize = 200;

lazy_static! {
    static ref CONTROL_RE: Regex = Regex::new(r"\p{Cc}").unwrap();
    static ref UNSAFE_FILE_CHARS_RE: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

pub fn validate_user_name(user_name: &str) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    if user_name.trim().is_empty() {
        errors.add_error("userName", "user name can't be blank");
    }
    if user_name.chars().count() > MAX_USER_NAME_CHARS {
        errors.add_error(
            "userName",
            format!("user name is longer than {} characters", MAX_USER_NAME_CHARS),
        );
    }
    if CONTROL_RE.is_match(user_name) {
        errors.add_error("userName", "user name contains control characters");
    }
    if errors.empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_introduction(introduction: &str) -> Result<(), ValidationError> {
    if introduction.chars().count() > MAX_INTRODUCTION_CHARS {
        Err(ValidationError::from(
            "introduction",
            format!("introduction is longer than {} characters", MAX_INTRODUCTION_CHARS),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_image_type(content_type: Option<&str>) -> Result<(), ValidationError> {
    let is_image = content_type
        .and_then(|ct| ct.split('/').next())
        .map(|top| top.trim().eq_ignore_ascii_case("image"))
        .unwrap_or(false);
    if is_image {
        Ok(())
    } else {
        Err(ValidationError::from(
            "image",
            format!("not an image: {}", content_type.unwrap_or("unknown type")),
        ))
    }
}

/// Collapses anything outside `[A-Za-z0-9._-]` so client file names are safe
/// to embed in a storage key.
pub fn sanitize_file_name(file_name: &str) -> String {
    let cleaned = UNSAFE_FILE_CHARS_RE.replace_all(file_name, "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}
