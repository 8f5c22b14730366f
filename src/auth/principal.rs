use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use tracing::warn;

use crate::auth::service::{TokenKind, ADMIN_PRINCIPAL};
use crate::error::{AppError, AuthError};
use crate::validation::{Validate, Validated};
use crate::AppState;

/// Raw `Authorization` header, if present and readable.
fn authorization_header(req: &HttpRequest) -> Option<&str> {
    req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok())
}

/// Splits `Bearer <token>` into its token.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalError("application state is not registered".into()))
}

/// Identity of a logged-in user, taken from a user-kind bearer token.
#[derive(Debug, Clone)]
pub struct UserPrincipal {
    pub username: String,
}

impl UserPrincipal {
    fn authenticate(req: &HttpRequest) -> Result<Self, AppError> {
        let state = app_state(req)?;
        let header = authorization_header(req).ok_or(AuthError::MissingToken)?;
        let token = parse_bearer(header).ok_or(AuthError::InvalidToken)?;
        let claims = state.tokens.verify(token, TokenKind::User)?;
        Ok(Self { username: claims.username })
    }
}

impl FromRequest for UserPrincipal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::authenticate(req).map_err(|e| {
            warn!(path = %req.path(), error = %e, "User authentication rejected");
            e
        }))
    }
}

/// Validated body plus the user it belongs to.
///
/// The body is read and checked to completion before the token is looked at,
/// so a request that is wrong on both counts is always a 400.
#[derive(Debug)]
pub struct UserRequest<T> {
    pub body: T,
    pub user: UserPrincipal,
}

impl<T: Validate + 'static> FromRequest for UserRequest<T> {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = Validated::<T>::from_request(req, payload);
        let req = req.clone();
        Box::pin(async move {
            let body = body.await?.into_inner();
            let user = UserPrincipal::authenticate(&req).map_err(|e| {
                warn!(path = %req.path(), error = %e, "User authentication rejected");
                e
            })?;
            Ok(Self { body, user })
        })
    }
}

/// Gate for admin routes.
///
/// No header is 401. A header that is malformed, carries a token that fails
/// admin verification, or names anyone but the admin principal is 403.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub username: String,
}

impl AdminPrincipal {
    fn authorize(req: &HttpRequest) -> Result<Self, AppError> {
        let state = app_state(req)?;
        let header = authorization_header(req).ok_or(AuthError::MissingToken)?;
        let token = parse_bearer(header).ok_or(AuthError::Forbidden)?;
        let claims = state
            .tokens
            .verify(token, TokenKind::Admin)
            .map_err(|_| AuthError::Forbidden)?;

        if claims.username != ADMIN_PRINCIPAL {
            return Err(AuthError::Forbidden.into());
        }

        Ok(Self { username: claims.username })
    }
}

impl FromRequest for AdminPrincipal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::authorize(req).map_err(|e| {
            warn!(path = %req.path(), error = %e, "Admin authorization rejected");
            e
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::config::Settings;
    use crate::db::MockStore;
    use crate::validation::{Field, Schema};
    use actix_web::error::PayloadError;
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::test::TestRequest;
    use actix_web::web::Bytes;
    use chrono::Utc;
    use futures::{stream, Stream};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use once_cell::sync::Lazy;
    use serde::Deserialize;
    use std::pin::Pin;
    use std::sync::Arc;

    fn state() -> web::Data<AppState> {
        let config = Settings::new_for_test().expect("Failed to load test config");
        web::Data::new(AppState::with_store(config, Arc::new(MockStore::new())))
    }

    fn tokens(state: &web::Data<AppState>) -> &TokenService {
        state.tokens.as_ref()
    }

    async fn admin(state: &web::Data<AppState>, header: Option<String>) -> Result<AdminPrincipal, AppError> {
        let mut req = TestRequest::get().app_data(state.clone());
        if let Some(header) = header {
            req = req.insert_header((AUTHORIZATION, header));
        }
        let (req, mut payload) = req.to_http_parts();
        AdminPrincipal::from_request(&req, &mut payload).await
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(parse_bearer("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer   "), None);
        assert_eq!(parse_bearer("abc"), None);
    }

    #[actix_web::test]
    async fn test_admin_state_machine() {
        let state = state();

        let err = admin(&state, None).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::MissingToken)));

        let err = admin(&state, Some("Token abc".into())).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::Forbidden)));

        let user_token = tokens(&state).issue_user_token("alice1").unwrap();
        let err = admin(&state, Some(format!("Bearer {}", user_token))).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::Forbidden)));

        let admin_token = tokens(&state).issue_admin_token().unwrap();
        let principal = admin(&state, Some(format!("Bearer {}", admin_token))).await.unwrap();
        assert_eq!(principal.username, ADMIN_PRINCIPAL);
    }

    #[actix_web::test]
    async fn test_admin_secret_with_other_principal_is_forbidden() {
        let state = state();
        let claims = crate::auth::Claims {
            username: "mallory".into(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.auth.admin_token_secret.as_bytes()),
        )
        .unwrap();

        let err = admin(&state, Some(format!("Bearer {}", token))).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::Forbidden)));
    }

    #[actix_web::test]
    async fn test_user_principal() {
        let state = state();

        let (req, mut payload) = TestRequest::get().app_data(state.clone()).to_http_parts();
        let err = UserPrincipal::from_request(&req, &mut payload).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::MissingToken)));

        let admin_token = tokens(&state).issue_admin_token().unwrap();
        let (req, mut payload) = TestRequest::get()
            .app_data(state.clone())
            .insert_header((AUTHORIZATION, format!("Bearer {}", admin_token)))
            .to_http_parts();
        let err = UserPrincipal::from_request(&req, &mut payload).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::InvalidToken)));

        let user_token = tokens(&state).issue_user_token("alice1").unwrap();
        let (req, mut payload) = TestRequest::get()
            .app_data(state.clone())
            .insert_header((AUTHORIZATION, format!("Bearer {}", user_token)))
            .to_http_parts();
        let principal = UserPrincipal::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(principal.username, "alice1");
    }

    #[derive(Debug, Deserialize)]
    struct Note {
        text: String,
    }

    static NOTE: Lazy<Schema> = Lazy::new(|| Schema::new(vec![Field::required("text").min_length(3)]));

    impl Validate for Note {
        fn schema() -> &'static Schema {
            &NOTE
        }
    }

    /// Body that only shows up after the extractor has been polled once.
    fn late_payload(json: &'static str) -> Payload {
        let stream: Pin<Box<dyn Stream<Item = Result<Bytes, PayloadError>>>> =
            Box::pin(stream::once(async move {
                tokio::task::yield_now().await;
                Ok(Bytes::from_static(json.as_bytes()))
            }));
        Payload::from(stream)
    }

    #[actix_web::test]
    async fn test_user_request_validates_before_authenticating() {
        let state = state();
        let (req, _) = TestRequest::post()
            .app_data(state.clone())
            .insert_header((CONTENT_TYPE, "application/json"))
            .insert_header((AUTHORIZATION, "Bearer not.a.token"))
            .to_http_parts();

        let mut payload = late_payload(r#"{"text": "no"}"#);
        let err = UserRequest::<Note>::from_request(&req, &mut payload).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)), "got {:?}", err);

        let mut payload = late_payload(r#"{"text": "fine"}"#);
        let err = UserRequest::<Note>::from_request(&req, &mut payload).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::InvalidToken)));
    }

    #[actix_web::test]
    async fn test_user_request_carries_principal() {
        let state = state();
        let token = tokens(&state).issue_user_token("alice1").unwrap();
        let (req, _) = TestRequest::post()
            .app_data(state.clone())
            .insert_header((CONTENT_TYPE, "application/json"))
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_parts();

        let mut payload = late_payload(r#"{"text": "fine"}"#);
        let request = UserRequest::<Note>::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(request.user.username, "alice1");
        assert_eq!(request.body.text, "fine");
    }
}
