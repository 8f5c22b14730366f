use actix_web::{web, HttpResponse};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::{UserPrincipal, UserRequest};
use crate::db::NewRental;
use crate::error::AppError;
use crate::validation::{Field, Schema, Validate};
use crate::{AppState, Result};

#[derive(Debug, Deserialize)]
pub struct RentalRequest {
    pub name: String,
    pub phonenumber: String,
    #[serde(rename = "rentalDate")]
    pub rental_date: String,
    #[serde(rename = "ICnumber")]
    pub ic_number: String,
    pub email: String,
}

pub(crate) fn rental_fields() -> Vec<Field> {
    vec![
        Field::required("name").non_empty(),
        Field::required("phonenumber").mobile_phone(),
        Field::required("rentalDate").iso8601(),
        Field::required("ICnumber").non_empty(),
        Field::required("email").email(),
    ]
}

static RENTAL_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new(rental_fields()));

impl Validate for RentalRequest {
    fn schema() -> &'static Schema {
        &RENTAL_SCHEMA
    }
}

/// Books a rental for the caller. The owner comes from the token, never the body.
pub async fn rent_car(
    req: UserRequest<RentalRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let UserRequest { body: req, user } = req;
    let rental = state
        .store
        .insert_rental(NewRental {
            username: user.username,
            name: req.name,
            phonenumber: req.phonenumber,
            rental_date: req.rental_date,
            ic_number: req.ic_number,
            email: req.email,
        })
        .await?;

    info!("Rental {} created for {} on {}", rental.id, rental.username, rental.rental_date);
    Ok(HttpResponse::Created().json(json!({
        "message": "Rent created successfully",
        "rental": rental,
    })))
}

pub async fn delete_rent_car(
    path: web::Path<String>,
    user: UserPrincipal,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let rental_date = path.into_inner();
    let deleted = state.store.delete_rental(&user.username, &rental_date).await?;

    if deleted == 0 {
        return Err(AppError::NotFound("Car rental entry not found".into()));
    }

    info!("Rental on {} deleted for {}", rental_date, user.username);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Car rental entry deleted successfully",
    })))
}
