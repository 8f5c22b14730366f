use actix_web::{web, HttpResponse};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::db::{NewUser, UserProfile};
use crate::error::{AuthError, DatabaseError};
use crate::validation::{Field, Schema, Validate, Validated};
use crate::{AppState, Result};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
}

static REGISTER_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        Field::required("username").trim().alphanumeric().min_length(5),
        Field::required("password").min_length(8),
        Field::required("name"),
        Field::required("email").email(),
    ])
});

impl Validate for RegisterRequest {
    fn schema() -> &'static Schema {
        &REGISTER_SCHEMA
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

static LOGIN_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![Field::required("username"), Field::required("password")])
});

impl Validate for LoginRequest {
    fn schema() -> &'static Schema {
        &LOGIN_SCHEMA
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

static ADMIN_LOGIN_SCHEMA: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![Field::required("privateKey")]));

impl Validate for AdminLoginRequest {
    fn schema() -> &'static Schema {
        &ADMIN_LOGIN_SCHEMA
    }
}

pub async fn register(
    req: Validated<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    info!("Received registration request for username: {}", req.username);

    // Best effort; the unique index on users.username catches a concurrent twin.
    if state.store.find_user(&req.username).await?.is_some() {
        warn!("Registration rejected, username taken: {}", req.username);
        return Err(DatabaseError::Duplicate("Error! User already registered.".into()).into());
    }

    let password_hash = hash_password(&req.password, state.config.auth.bcrypt_cost).await?;
    let user = state
        .store
        .insert_user(NewUser {
            username: req.username,
            password_hash,
            name: req.name,
            email: req.email,
        })
        .await?;

    info!("Registration successful for username: {}", user.username);
    Ok(HttpResponse::Created().json(json!({
        "message": "Registration successful!",
        "user": UserProfile::from(&user),
    })))
}

pub async fn login_user(
    req: Validated<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("Received login request for username: {}", req.username);

    let verified = match state.store.find_user(&req.username).await? {
        Some(user) => verify_password(&req.password, &user.password_hash).await?,
        None => {
            // Spend the same bcrypt work as a real comparison.
            hash_password(&req.password, state.config.auth.bcrypt_cost).await?;
            false
        }
    };

    if !verified {
        warn!("Login failed for username: {}", req.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue_user_token(&req.username)?;
    info!("Login successful for username: {}", req.username);
    Ok(HttpResponse::Ok().json(json!({ "userToken": token })))
}

/// Compares without short-circuiting on the first differing byte.
fn passphrase_matches(given: &str, expected: &str) -> bool {
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub async fn login_admin(
    req: Validated<AdminLoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !passphrase_matches(&req.private_key, &state.config.auth.admin_private_key) {
        warn!("Admin login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue_admin_token()?;
    info!("Admin login successful");
    Ok(HttpResponse::Ok().json(json!({
        "adminToken": token,
        "message": "Admin login successful",
    })))
}
