use actix_web::rt::task::spawn_blocking;
use actix_web::{web, HttpResponse};
use bcrypt::{hash, verify};
use log::{info, warn};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::AppError;
use crate::services::activity::ActivityService;
use crate::utils::jwt::JwtKeys;

const BCRYPT_COST: u32 = 10;

/// Usernames known to be taken, checked before paying for a bcrypt hash.
#[derive(Clone)]
pub struct KnownUsernames(Cache<String, ()>);

impl KnownUsernames {
    pub fn new(capacity: u64) -> Self {
        Self(Cache::new(capacity))
    }
}

#[derive(Deserialize, Validate)]
pub struct AuthRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"))]
    username: String,

    #[validate(length(min = 8, max = 32, message = "Password must be between 8 and 32 characters"))]
    password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    username: String,
    token: String,
}

// POST /api/login/
pub async fn login(
    req: web::Json<AuthRequest>,
    service: web::Data<ActivityService>,
    keys: web::Data<JwtKeys>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|err| AppError::BadRequest(err.to_string()))?;
    let AuthRequest { username, password } = req.into_inner();

    let user = service
        .repository()
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("Username not found".to_string()))?;

    let is_valid = spawn_blocking(move || verify(password.as_str(), &user.password))
        .await
        .map_err(|_| AppError::InternalServerError("Password verification error".to_string()))?
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if !is_valid {
        warn!("Rejected login for {}", username);
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    let token = keys
        .generate_token(&username)
        .map_err(|_| AppError::InternalServerError("Token generation error".to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse { username, token }))
}

// POST /api/register/
pub async fn register(
    req: web::Json<AuthRequest>,
    service: web::Data<ActivityService>,
    keys: web::Data<JwtKeys>,
    known: web::Data<KnownUsernames>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|err| AppError::BadRequest(err.to_string()))?;
    let AuthRequest { username, password } = req.into_inner();

    if known.0.contains_key(&username) {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let password_hash = spawn_blocking(move || hash(&password, BCRYPT_COST))
        .await
        .map_err(|_| AppError::InternalServerError("Hashing failed".to_string()))?
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let created = service
        .repository()
        .create_user(&username, &password_hash)
        .await?;
    known.0.insert(username.clone(), ());

    if created.is_none() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    info!("Registered user {}", username);

    let token = keys
        .generate_token(&username)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(HttpResponse::Created().json(AuthResponse { username, token }))
}
