use actix_web::{web, HttpResponse};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminPrincipal;
use crate::db::{CarPatch, NewCar, RentalPatch, UserProfile};
use crate::error::AppError;
use crate::rentals::handlers::rental_fields;
use crate::validation::{Field, Schema, Validate, Validated};
use crate::{AppState, Result};

#[derive(Debug, Deserialize)]
pub struct CarRequest {
    pub brand: String,
    pub model: String,
    pub year: String,
    pub colour: String,
    pub noplate: String,
}

fn car_fields() -> Vec<Field> {
    vec![
        Field::required("brand").non_empty(),
        Field::required("model").non_empty(),
        Field::required("year").year(),
        Field::required("colour").non_empty(),
        Field::required("noplate").trim().non_empty(),
    ]
}

static CAR_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new(car_fields()));
static CAR_PATCH_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::partial(car_fields()));
static RENTAL_PATCH_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::partial(rental_fields()));

impl Validate for CarRequest {
    fn schema() -> &'static Schema {
        &CAR_SCHEMA
    }
}

impl Validate for CarPatch {
    fn schema() -> &'static Schema {
        &CAR_PATCH_SCHEMA
    }
}

impl Validate for RentalPatch {
    fn schema() -> &'static Schema {
        &RENTAL_PATCH_SCHEMA
    }
}

/// Object ids arrive as raw path segments; a malformed one is a server-side
/// failure like any other driver error.
fn parse_car_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::InternalError(format!("malformed car id {:?}: {}", raw, e)))
}

pub async fn admin_view_data(
    admin: AdminPrincipal,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let snapshot = state.store.snapshot().await?;
    let users: Vec<UserProfile> = snapshot.users.iter().map(UserProfile::from).collect();

    info!(
        "{} viewed {} users, {} rentals, {} cars",
        admin.username,
        users.len(),
        snapshot.rentals.len(),
        snapshot.cars.len()
    );
    Ok(HttpResponse::Ok().json(json!({
        "users": users,
        "RentalDetails": snapshot.rentals,
        "CarDetails": snapshot.cars,
    })))
}

pub async fn admin_create_car(
    admin: AdminPrincipal,
    req: Validated<CarRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let car = state
        .store
        .insert_car(NewCar {
            username: admin.username,
            brand: req.brand,
            model: req.model,
            year: req.year,
            colour: req.colour,
            noplate: req.noplate,
        })
        .await?;

    info!("Car {} ({} {}) created", car.id, car.brand, car.model);
    Ok(HttpResponse::Created().json(json!({
        "message": "Car details created successfully by admin",
        "car": car,
    })))
}

pub async fn admin_update_car(
    _admin: AdminPrincipal,
    path: web::Path<String>,
    patch: Validated<CarPatch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let car_id = parse_car_id(&path)?;
    let updated = state.store.update_car(car_id, patch.into_inner()).await?;

    if updated == 0 {
        return Err(AppError::NotFound("Car entry not found".into()));
    }

    info!("Car {} updated", car_id);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Car details updated successfully by admin",
    })))
}

pub async fn admin_delete_car(
    _admin: AdminPrincipal,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let car_id = parse_car_id(&path)?;
    let deleted = state.store.delete_car(car_id).await?;

    if deleted == 0 {
        return Err(AppError::NotFound("Car entry not found".into()));
    }

    info!("Car {} deleted", car_id);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Car entry deleted successfully by admin",
    })))
}

pub async fn admin_update_rental(
    _admin: AdminPrincipal,
    path: web::Path<String>,
    patch: Validated<RentalPatch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    let updated = state.store.update_rental(&username, patch.into_inner()).await?;

    if updated == 0 {
        return Err(AppError::NotFound("Rental details not found".into()));
    }

    info!("Rental of {} updated", username);
    Ok(HttpResponse::Ok().json(json!({
        "message": "User data updated successfully by admin",
    })))
}
