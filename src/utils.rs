use rocket::http::Status;
use rocket::request::Request;
use rocket::response::content::RawJson;
use rocket::response::{self, Responder, Response};
use serde_json::Value;

pub fn try_respond<'r>(
    req: &'r Request<'_>,
    json: &Value,
    status: Status,
) -> response::Result<'static> {
    let as_json = serde_json::to_string(&json);
    match as_json {
        Ok(json) => RawJson(json)
            .respond_to(req)
            .and_then(|resp| Response::build_from(resp).status(status).ok()),

        Err(_) => Err(Status::InternalServerError),
    }
}
