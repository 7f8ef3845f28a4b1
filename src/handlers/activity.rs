use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::errors::AppError;
use crate::models::activity::NewActivity;
use crate::services::activity::ActivityService;
use crate::utils::date::parse_date;
use crate::utils::jwt::AuthenticatedUser;

/// Create payload. Unknown keys, including any `user` field, are dropped:
/// the owner always comes from the bearer token.
#[derive(Deserialize, Validate)]
pub struct ActivityRequest {
    #[validate(required(message = "Date is required"))]
    date: Option<String>,

    #[validate(required(message = "Category is required"))]
    #[validate(length(min = 1, max = 100, message = "Category must be between 1 and 100 characters"))]
    category: Option<String>,

    description: Option<String>,

    quantity: Option<Decimal>,

    #[validate(required(message = "Carbon emission is required"))]
    carbon_emission_kg: Option<Decimal>,
}

impl ActivityRequest {
    fn into_new_activity(self) -> Result<NewActivity, AppError> {
        self.validate().map_err(|err| AppError::BadRequest(err.to_string()))?;

        let date = self.date.as_deref().unwrap_or_default();
        let date = parse_date(date)
            .map_err(|_| AppError::BadRequest("Date must be in YYYY-MM-DD format".to_string()))?;

        let carbon_emission_kg = self.carbon_emission_kg.unwrap_or_default();
        check_amount(carbon_emission_kg, "Carbon emission")?;
        if let Some(quantity) = self.quantity {
            check_amount(quantity, "Quantity")?;
        }

        Ok(NewActivity {
            date,
            category: self.category.unwrap_or_default(),
            description: self.description,
            quantity: self.quantity,
            carbon_emission_kg,
        })
    }
}

/// Amounts are stored as NUMERIC(12, 3): non-negative, below 10^9, at most three decimals.
const MAX_AMOUNT_SCALE: u32 = 3;

fn check_amount(value: Decimal, field: &str) -> Result<(), AppError> {
    if value < Decimal::ZERO {
        return Err(AppError::BadRequest(format!("{} cannot be negative", field)));
    }
    if value >= Decimal::from(1_000_000_000u32) {
        return Err(AppError::BadRequest(format!("{} must be below 1000000000", field)));
    }
    if value.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(AppError::BadRequest(format!(
            "{} allows at most {} decimal places",
            field, MAX_AMOUNT_SCALE
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct DateQuery {
    date: Option<String>,
}

// GET /api/activities/
pub async fn list_activities(
    AuthenticatedUser(user): AuthenticatedUser,
    service: web::Data<ActivityService>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse, AppError> {
    let activities = service.list(user.user_id, query.date.as_deref()).await?;
    Ok(HttpResponse::Ok().json(activities))
}

// POST /api/activities/
pub async fn create_activity(
    AuthenticatedUser(user): AuthenticatedUser,
    service: web::Data<ActivityService>,
    payload: web::Json<ActivityRequest>,
) -> Result<HttpResponse, AppError> {
    let activity = payload.into_inner().into_new_activity()?;
    let created = service.create(user.user_id, activity).await?;
    Ok(HttpResponse::Created().json(created))
}

// GET /api/activities/{date}/
pub async fn activities_by_date(
    AuthenticatedUser(user): AuthenticatedUser,
    service: web::Data<ActivityService>,
    date: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let activities = service.on_date(user.user_id, &date).await?;
    Ok(HttpResponse::Ok().json(activities))
}

// GET /api/activities/week/{date}/
pub async fn weekly_activities(
    AuthenticatedUser(user): AuthenticatedUser,
    service: web::Data<ActivityService>,
    date: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let activities = service.week_ending(user.user_id, &date).await?;
    Ok(HttpResponse::Ok().json(activities))
}

// GET /api/activities/month/{date}/
pub async fn monthly_activities(
    AuthenticatedUser(user): AuthenticatedUser,
    service: web::Data<ActivityService>,
    date: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let activities = service.month_of(user.user_id, &date).await?;
    Ok(HttpResponse::Ok().json(activities))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{authed, create_activity, get_json, init_app, register_user};
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn requires_bearer_token() {
        let app = init_app().await;
        let req = test::TestRequest::get().uri("/api/activities/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/activities/week/2024-06-12/")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn create_forces_owner_to_caller() {
        let app = init_app().await;
        let alice = register_user(&app, "alice").await;
        let bob = register_user(&app, "bob").await;
        let bob_first = create_activity(&app, &bob, "2024-06-10", 1.0).await;
        let bob_id = bob_first["user"].clone();

        let req = authed(test::TestRequest::post(), &alice)
            .uri("/api/activities/")
            .set_json(json!({
                "date": "2024-06-11",
                "category": "food",
                "description": "beef burger",
                "quantity": 1,
                "carbon_emission_kg": 4.5,
                "user": bob_id.clone(),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_ne!(created["user"], bob_id);
        assert_eq!(created["carbon_emission_kg"], json!(4.5));
        assert_eq!(created["date"], "2024-06-11");
        assert!(created["id"].is_string());

        let bobs = get_json(&app, &bob, "/api/activities/").await;
        assert_eq!(bobs.as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn create_rejects_invalid_payloads() {
        let app = init_app().await;
        let token = register_user(&app, "alice").await;

        for payload in [
            json!({"category": "food", "carbon_emission_kg": 1}),
            json!({"date": "2024-06-11", "category": "food"}),
            json!({"date": "2024-06-11", "category": "food", "carbon_emission_kg": -1}),
            json!({"date": "11/06/2024", "category": "food", "carbon_emission_kg": 1}),
            json!({"date": "2024-06-11", "category": "", "carbon_emission_kg": 1}),
            json!({"date": "24-06-11", "category": "food", "carbon_emission_kg": 1}),
            json!({"date": "2024-06-11", "category": "food", "carbon_emission_kg": "79228162514264337593543950335"}),
            json!({"date": "2024-06-11", "category": "food", "carbon_emission_kg": 1000000000}),
            json!({"date": "2024-06-11", "category": "food", "carbon_emission_kg": "0.0001"}),
            json!({"date": "2024-06-11", "category": "food", "carbon_emission_kg": 1, "quantity": "1e20"}),
        ] {
            let req = authed(test::TestRequest::post(), &token)
                .uri("/api/activities/")
                .set_json(&payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{payload}");
            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].is_string());
        }
    }

    #[actix_web::test]
    async fn query_filter_falls_back_but_path_filter_empties() {
        let app = init_app().await;
        let token = register_user(&app, "alice").await;
        create_activity(&app, &token, "2024-06-10", 1.0).await;
        create_activity(&app, &token, "2024-06-11", 2.0).await;

        let count = |body: Value| body.as_array().map(Vec::len).unwrap_or_default();

        assert_eq!(count(get_json(&app, &token, "/api/activities/?date=2024-06-10").await), 1);
        assert_eq!(count(get_json(&app, &token, "/api/activities/?date=junk").await), 2);
        assert_eq!(count(get_json(&app, &token, "/api/activities/2024-06-11/").await), 1);
        assert_eq!(count(get_json(&app, &token, "/api/activities/junk/").await), 0);
    }

    #[actix_web::test]
    async fn amounts_at_the_storage_bound_are_accepted() {
        let app = init_app().await;
        let token = register_user(&app, "alice").await;

        let req = authed(test::TestRequest::post(), &token)
            .uri("/api/activities/")
            .set_json(json!({
                "date": "2024-06-11",
                "category": "flight",
                "carbon_emission_kg": "999999999.999",
                "quantity": "2.500",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = get_json(&app, &token, "/api/carbon-footprint/").await;
        let total = body["total_carbon_kg"].as_f64().unwrap();
        assert!((total - 999_999_999.999).abs() < 1e-3, "{total}");
    }

    #[actix_web::test]
    async fn short_signed_and_extreme_path_dates_are_empty() {
        let app = init_app().await;
        let token = register_user(&app, "alice").await;
        create_activity(&app, &token, "2024-06-12", 1.0).await;

        let count = |body: Value| body.as_array().map(Vec::len).unwrap_or_default();

        assert_eq!(count(get_json(&app, &token, "/api/activities/?date=24-06-12").await), 1);
        assert_eq!(count(get_json(&app, &token, "/api/activities/24-06-12/").await), 0);
        assert_eq!(count(get_json(&app, &token, "/api/activities/+2024-06-12/").await), 0);
        assert_eq!(count(get_json(&app, &token, "/api/activities/week/-262143-01-01/").await), 0);
        assert_eq!(count(get_json(&app, &token, "/api/activities/week/24-06-12/").await), 0);
        assert_eq!(count(get_json(&app, &token, "/api/activities/month/0-1-1/").await), 0);
    }

    #[actix_web::test]
    async fn week_and_month_windows() {
        let app = init_app().await;
        let token = register_user(&app, "alice").await;
        for day in ["2024-06-08", "2024-06-09", "2024-06-12", "2024-06-30", "2024-07-01"] {
            create_activity(&app, &token, day, 1.0).await;
        }

        let week = get_json(&app, &token, "/api/activities/week/2024-06-12/").await;
        let days: Vec<_> = week.as_array().unwrap().iter().map(|a| a["date"].clone()).collect();
        assert_eq!(days, vec![json!("2024-06-09"), json!("2024-06-12")]);

        let month = get_json(&app, &token, "/api/activities/month/2024-06-01/").await;
        assert_eq!(month.as_array().unwrap().len(), 4);

        let req = authed(test::TestRequest::get(), &token)
            .uri("/api/activities/month/2024-6-x/")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let empty: Value = test::read_body_json(resp).await;
        assert_eq!(empty, json!([]));
    }
}
