use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::User;
use crate::services::activity::ActivityService;

const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// HS256 signing material shared through app data.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Generates a JWT token for the given username.
    pub fn generate_token(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let expiration = (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS))
            .timestamp() as usize;

        let claims = Claims {
            sub: username.to_string(),
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Validates a JWT token and returns the claims if valid.
    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &self.decoding,
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        )
        .map(|data| data.claims)
    }
}

/// Validator function for the `HttpAuthentication::bearer` middleware.
/// Valid tokens leave their `Claims` in the request extensions.
pub async fn validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let claims = match req.app_data::<web::Data<JwtKeys>>().cloned() {
        Some(keys) => keys.validate_token(credentials.token()),
        None => {
            return Err((
                AppError::InternalServerError("JWT keys not configured".to_string()).into(),
                req,
            ))
        }
    };
    match claims {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(req)
        }
        Err(_) => Err((AppError::Unauthorized("Invalid token".to_string()).into(), req)),
    }
}

/// The caller resolved from a validated bearer token.
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let service = req.app_data::<web::Data<ActivityService>>().cloned();

        Box::pin(async move {
            let claims = claims.ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;
            let service = service.ok_or_else(|| {
                AppError::InternalServerError("Activity service not configured".to_string())
            })?;
            let user = service
                .repository()
                .find_user_by_username(&claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;
            Ok(AuthenticatedUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_subject() {
        let keys = JwtKeys::new("test-secret");
        let token = keys.generate_token("alice").unwrap();
        assert_eq!(keys.validate_token(&token).unwrap().sub, "alice");
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = JwtKeys::new("one").generate_token("alice").unwrap();
        assert!(JwtKeys::new("two").validate_token(&token).is_err());
    }
}
