//! Admin-only routes: the data overview, car inventory and rental edits.
//! Every handler takes an [`AdminPrincipal`](crate::auth::AdminPrincipal) as
//! its first argument, so the gate runs before anything else.

pub mod handlers;
