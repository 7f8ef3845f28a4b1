use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::AppError;
use crate::services::activity::ActivityService;
use crate::utils::jwt::AuthenticatedUser;

#[derive(Serialize)]
struct FootprintResponse {
    #[serde(with = "rust_decimal::serde::float")]
    total_carbon_kg: Decimal,
}

// GET /api/carbon-footprint/
pub async fn carbon_footprint(
    AuthenticatedUser(user): AuthenticatedUser,
    service: web::Data<ActivityService>,
) -> Result<HttpResponse, AppError> {
    let total_carbon_kg = service.footprint(user.user_id).await?;
    Ok(HttpResponse::Ok().json(FootprintResponse { total_carbon_kg }))
}

// GET /api/leaderboard/
// Deliberately open: every user's total is visible without a token.
pub async fn leaderboard(service: web::Data<ActivityService>) -> Result<HttpResponse, AppError> {
    let entries = service.leaderboard().await?;
    Ok(HttpResponse::Ok().json(entries))
}
