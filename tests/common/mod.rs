#![allow(dead_code)]

use actix_web::{test::TestRequest, web};
use async_trait::async_trait;
use carrental_server::db::{
    CarDetails, CarPatch, NewCar, NewRental, NewUser, RentalDetails, RentalPatch, Snapshot, User,
};
use carrental_server::error::DatabaseError;
use carrental_server::{AppState, Settings, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const ADMIN_KEY: &str = "it_admin_key";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    rentals: Vec<RentalDetails>,
    cars: Vec<CarDetails>,
}

/// Store backed by vectors, with the same row semantics as the Postgres one.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub async fn users(&self) -> Vec<User> {
        self.tables.read().await.users.clone()
    }

    pub async fn rentals(&self) -> Vec<RentalDetails> {
        self.tables.read().await.rentals.clone()
    }

    pub async fn cars(&self) -> Vec<CarDetails> {
        self.tables.read().await.cars.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, username: &str) -> carrental_server::Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> carrental_server::Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(DatabaseError::Duplicate("Error! User already registered.".into()).into());
        }
        let user = user.into_user();
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn insert_rental(&self, rental: NewRental) -> carrental_server::Result<RentalDetails> {
        let rental = rental.into_rental();
        self.tables.write().await.rentals.push(rental.clone());
        Ok(rental)
    }

    async fn delete_rental(&self, username: &str, rental_date: &str) -> carrental_server::Result<u64> {
        let mut tables = self.tables.write().await;
        match tables
            .rentals
            .iter()
            .position(|r| r.username == username && r.rental_date == rental_date)
        {
            Some(index) => {
                tables.rentals.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_rental(&self, username: &str, patch: RentalPatch) -> carrental_server::Result<u64> {
        let mut tables = self.tables.write().await;
        match tables.rentals.iter_mut().find(|r| r.username == username) {
            Some(rental) if !patch.is_empty() => {
                patch.apply_to(rental);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn insert_car(&self, car: NewCar) -> carrental_server::Result<CarDetails> {
        let car = car.into_car();
        self.tables.write().await.cars.push(car.clone());
        Ok(car)
    }

    async fn update_car(&self, id: Uuid, patch: CarPatch) -> carrental_server::Result<u64> {
        let mut tables = self.tables.write().await;
        match tables.cars.iter_mut().find(|c| c.id == id) {
            Some(car) if !patch.is_empty() => {
                patch.apply_to(car);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_car(&self, id: Uuid) -> carrental_server::Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.cars.len();
        tables.cars.retain(|c| c.id != id);
        Ok((before - tables.cars.len()) as u64)
    }

    async fn snapshot(&self) -> carrental_server::Result<Snapshot> {
        let tables = self.tables.read().await;
        Ok(Snapshot {
            users: tables.users.clone(),
            rentals: tables.rentals.clone(),
            cars: tables.cars.clone(),
        })
    }
}

pub fn settings() -> Settings {
    let builder = Settings::defaults()
        .and_then(|b| b.set_override("environment", "test"))
        .and_then(|b| b.set_override("auth.user_token_secret", "it_user_secret"))
        .and_then(|b| b.set_override("auth.admin_token_secret", "it_admin_secret"))
        .and_then(|b| b.set_override("auth.admin_private_key", ADMIN_KEY))
        .and_then(|b| b.set_override("auth.bcrypt_cost", 4))
        .expect("Failed to build test config");
    Settings::from_builder(builder).expect("Failed to load test config")
}

/// Fresh in-memory store and the state wrapping it.
pub fn state() -> (Arc<MemoryStore>, web::Data<AppState>) {
    let store = Arc::new(MemoryStore::default());
    let state = AppState::with_store(settings(), store.clone());
    (store, web::Data::new(state))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn user_token(state: &web::Data<AppState>, username: &str) -> String {
    state.tokens.issue_user_token(username).expect("Failed to issue user token")
}

pub fn admin_token(state: &web::Data<AppState>) -> String {
    state.tokens.issue_admin_token().expect("Failed to issue admin token")
}

pub fn register_request(username: &str, password: &str) -> TestRequest {
    TestRequest::post().uri("/register-User").set_json(json!({
        "username": username,
        "password": password,
        "name": "Test User",
        "email": format!("{}@example.com", username.trim()),
    }))
}

pub fn login_request(username: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/login-user")
        .set_json(json!({ "username": username, "password": password }))
}

pub fn rental_body(date: &str) -> Value {
    json!({
        "name": "Alice Tan",
        "phonenumber": "+60 12-345 6789",
        "rentalDate": date,
        "ICnumber": "990101-14-5555",
        "email": "alice@example.com"
    })
}

pub fn car_body() -> Value {
    json!({
        "brand": "Toyota",
        "model": "Vios",
        "year": "2019",
        "colour": "White",
        "noplate": "WXY1234"
    })
}

pub fn violation_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .map(|e| e["field"].as_str().unwrap_or_default().to_string())
        .collect()
}
