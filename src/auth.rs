use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::{RegisteredClaims, VerifyWithKey};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use sha2::Sha256;
use tracing::debug;

use crate::types::ApiError;

/// The authenticated caller, identified by the email in the token subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    email: String,
}

impl Principal {
    pub fn new<E: Into<String>>(email: E) -> Self {
        Principal {
            email: email.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

pub type CurrentPrincipal = Result<Principal, ApiError>;

/// HS256 key used to check bearer tokens issued by the identity service.
pub struct TokenKey(Hmac<Sha256>);

impl TokenKey {
    pub fn new(secret: &[u8]) -> Option<TokenKey> {
        if secret.is_empty() {
            return None;
        }
        Hmac::new_from_slice(secret).ok().map(TokenKey)
    }

    /// `now` is a unix timestamp; tokens whose `exp` is not after it are
    /// rejected.
    pub fn verify(&self, token: &str, now: i64) -> Result<Principal, ApiError> {
        let claims: RegisteredClaims = token.verify_with_key(&self.0).map_err(|e| {
            debug!(error = %e, "rejected bearer token");
            ApiError::Unauthorized
        })?;

        if let Some(expiration) = claims.expiration {
            let expiration = i64::try_from(expiration).map_err(|_| {
                debug!(expiration, "rejected bearer token with out-of-range expiry");
                ApiError::Unauthorized
            })?;
            if expiration <= now {
                debug!(expiration, "rejected expired bearer token");
                return Err(ApiError::Unauthorized);
            }
        }

        match claims.subject {
            Some(email) if !email.trim().is_empty() => Ok(Principal::new(email)),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

/// Signs a token the way the identity service does.
#[cfg(test)]
pub fn sign_token(secret: &[u8], email: &str, expiration: Option<u64>) -> String {
    use jwt::SignWithKey;

    let key: Hmac<Sha256> = Hmac::new_from_slice(secret).expect("hmac key");
    let claims = RegisteredClaims {
        subject: Some(email.to_string()),
        expiration,
        ..Default::default()
    };
    claims.sign_with_key(&key).expect("signed token")
}

fn bearer_token(header: &str) -> &str {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("Token "))
        .unwrap_or(header)
        .trim()
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Principal {
    type Error = ApiError;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let key = match request.rocket().state::<TokenKey>() {
            Some(key) => key,
            None => return Outcome::Error((Status::InternalServerError, ApiError::Internal)),
        };
        let header = match request.headers().get_one("Authorization") {
            Some(header) => header,
            None => return Outcome::Error((Status::Unauthorized, ApiError::Unauthorized)),
        };
        match key.verify(bearer_token(header), Utc::now().timestamp()) {
            Ok(principal) => Outcome::Success(principal),
            Err(e) => Outcome::Error((Status::Unauthorized, e)),
        }
    }
}
