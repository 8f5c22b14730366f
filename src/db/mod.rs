//! Persistence for users, rentals and cars.
//!
//! Handlers only see the [`Store`] trait; [`DbOperations`] is the PostgreSQL
//! implementation wired in at startup.

pub mod models;
pub mod operations;
mod store;

pub use models::{
    CarDetails, CarPatch, NewCar, NewRental, NewUser, RentalDetails, RentalPatch, Snapshot, User,
    UserProfile,
};
pub use operations::DbOperations;
pub use store::Store;

#[cfg(test)]
pub use store::MockStore;
