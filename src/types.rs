use std::collections::HashMap;
use std::io::Error as IoError;

use diesel::result::Error as DieselError;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::blob::BlobError;
use crate::utils::try_respond;

pub trait Validate
where
    Self: Sized,
{
    type Error;
    fn validate(self) -> Result<Self, Self::Error>;
}

#[derive(Debug)]
pub enum ApiError {
    Diesel(DieselError),
    Validation(ValidationError),
    NotFound(&'static str),
    Unauthorized,
    Forbidden,
    Conflict(&'static str),
    Upload(BlobError),
    Internal,
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        ApiError::Diesel(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> ApiError {
        ApiError::Validation(err)
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> ApiError {
        ApiError::Upload(err)
    }
}

impl From<IoError> for ApiError {
    fn from(_: IoError) -> ApiError {
        ApiError::Internal
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize, Default)]
pub struct ValidationError(HashMap<String, Vec<String>>);

impl ValidationError {
    pub fn add_error<K: Into<String>, V: Into<String>>(&mut self, key: K, val: V) {
        let entry = self.0.entry(key.into()).or_default();
        entry.push(val.into());
    }

    pub fn from<K: Into<String>, V: Into<String>>(key: K, val: V) -> Self {
        let mut error = ValidationError::default();
        error.add_error(key, val);
        error
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: ValidationError) {
        for (key, errors) in other.0.into_iter() {
            let entry = self.0.entry(key).or_default();
            entry.extend(errors);
        }
    }

    pub fn empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn messages(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        match self {
            ApiError::Diesel(DieselError::NotFound) => {
                let body = json!({ "errors": { "status": "404 Not Found" }});
                try_respond(req, &body, Status::NotFound)
            }
            ApiError::Diesel(error) => {
                error!(%error, "database failure");
                Err(Status::InternalServerError)
            }

            ApiError::Validation(error) => {
                let body = json!({ "errors": error });
                try_respond(req, &body, Status::UnprocessableEntity)
            }

            ApiError::NotFound(entity) => {
                let body = json!({ "errors": {
                    "status": "404 Not Found",
                    "entity": entity
                }});
                try_respond(req, &body, Status::NotFound)
            }

            ApiError::Unauthorized => {
                let body = json!({ "errors": {
                    "status": "401 Unauthorized"
                }});
                try_respond(req, &body, Status::Unauthorized)
            }

            ApiError::Forbidden => {
                let body = json!({ "errors": {
                    "status": "403 Forbidden"
                }});
                try_respond(req, &body, Status::Forbidden)
            }

            ApiError::Conflict(reason) => {
                let body = json!({ "errors": {
                    "status": "409 Conflict",
                    "reason": reason
                }});
                try_respond(req, &body, Status::Conflict)
            }

            ApiError::Upload(error) => {
                error!(%error, "image upload failed");
                Err(Status::InternalServerError)
            }
            ApiError::Internal => Err(Status::InternalServerError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::local::blocking::Client;
    use rstest::rstest;
    use serde_json::Value;

    #[get("/fail/<kind>")]
    fn fail(kind: &str) -> ApiResult<()> {
        match kind {
            "missing" => Err(ApiError::NotFound("article")),
            "diesel-missing" => Err(DieselError::NotFound.into()),
            "forbidden" => Err(ApiError::Forbidden),
            "unauthorized" => Err(ApiError::Unauthorized),
            "conflict" => Err(ApiError::Conflict("bookmark already exists")),
            "invalid" => Err(ValidationError::from("userName", "blank user name").into()),
            _ => Err(ApiError::Internal),
        }
    }

    fn client() -> Client {
        Client::tracked(rocket::build().mount("/", routes![fail])).expect("valid rocket")
    }

    #[rstest]
    #[case("missing", Status::NotFound)]
    #[case("diesel-missing", Status::NotFound)]
    #[case("forbidden", Status::Forbidden)]
    #[case("unauthorized", Status::Unauthorized)]
    #[case("conflict", Status::Conflict)]
    #[case("invalid", Status::UnprocessableEntity)]
    #[case("boom", Status::InternalServerError)]
    fn errors_map_to_statuses(#[case] kind: &str, #[case] status: Status) {
        let client = client();
        let response = client.get(format!("/fail/{}", kind)).dispatch();
        assert_eq!(response.status(), status);
    }

    #[rstest]
    fn validation_errors_are_keyed_by_field() {
        let client = client();
        let response = client.get("/fail/invalid").dispatch();
        let body: Value = response.into_json().expect("json body");
        assert_eq!(body["errors"]["userName"][0], "blank user name");
    }

    #[rstest]
    fn merge_keeps_messages_of_both_sides() {
        let mut errors = ValidationError::from("userName", "too long");
        errors.merge(ValidationError::from("userName", "control characters"));
        errors.merge(ValidationError::from("image", "not an image"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.messages("userName").len(), 2);
        assert!(!errors.empty());
    }
}
