//! Request-body validation.
//!
//! Each request type declares a [`Schema`] of per-field rules. The
//! [`Validated`] extractor checks the raw JSON against that schema, collecting
//! every violation, and only deserialises the body once it is clean. A handler
//! taking `Validated<T>` therefore never runs on a bad body.

mod rules;

pub use rules::{Field, FieldViolation, Schema, ValidationErrors};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::Deref;
use tracing::debug;

use crate::error::AppError;

const MALFORMED_BODY: &str = "must be a valid JSON object";

fn malformed_body(detail: impl std::fmt::Display) -> ValidationErrors {
    debug!(error = %detail, "Request body rejected");
    ValidationErrors::single("body", MALFORMED_BODY)
}

/// A request body with a declared shape.
pub trait Validate: DeserializeOwned {
    fn schema() -> &'static Schema;
}

/// Extractor yielding a body that already passed its schema.
#[derive(Debug)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Validates `body` against `T`'s schema and deserialises it.
pub fn validate_value<T: Validate>(mut body: Value) -> Result<T, ValidationErrors> {
    T::schema().validate(&mut body)?;
    serde_json::from_value(body).map_err(malformed_body)
}

impl<T: Validate + 'static> FromRequest for Validated<T> {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let json = web::Json::<Value>::from_request(req, payload);
        Box::pin(async move {
            let body = json
                .await
                .map_err(malformed_body)?
                .into_inner();
            Ok(Validated(validate_value::<T>(body)?))
        })
    }
}
