//! User-facing rental bookings.

pub mod handlers;
