//! Authentication for the rental API.
//!
//! Bearer tokens are the only carrier of identity: user tokens and admin
//! tokens are signed with separate secrets, and the [`UserPrincipal`],
//! [`UserRequest`] and [`AdminPrincipal`] extractors verify them before a
//! handler body runs.
//! There is no server-side session state.

pub mod handlers;
pub mod password;
mod principal;
mod service;

pub use principal::{parse_bearer, AdminPrincipal, UserPrincipal, UserRequest};
pub use service::{Claims, TokenKind, TokenService, ADMIN_PRINCIPAL, TOKEN_TTL_SECS};
