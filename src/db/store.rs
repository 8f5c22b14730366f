use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{
    CarDetails, CarPatch, NewCar, NewRental, NewUser, RentalDetails, RentalPatch, Snapshot, User,
};
use crate::Result;

/// Storage seam for the route handlers. Each method is one logical database
/// operation; counts are rows affected.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>>;

    /// Fails with `DatabaseError::Duplicate` if the username is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn insert_rental(&self, rental: NewRental) -> Result<RentalDetails>;

    /// Removes at most one rental matching `(username, rental_date)`.
    async fn delete_rental(&self, username: &str, rental_date: &str) -> Result<u64>;

    /// Patches at most one rental, the oldest belonging to `username`.
    async fn update_rental(&self, username: &str, patch: RentalPatch) -> Result<u64>;

    async fn insert_car(&self, car: NewCar) -> Result<CarDetails>;

    async fn update_car(&self, id: Uuid, patch: CarPatch) -> Result<u64>;

    async fn delete_car(&self, id: Uuid) -> Result<u64>;

    async fn snapshot(&self) -> Result<Snapshot>;

    async fn close(&self) {}
}
