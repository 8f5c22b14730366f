use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::models::{
    CarDetails, CarPatch, NewCar, NewRental, NewUser, RentalDetails, RentalPatch, Snapshot, User,
};
use crate::db::store::Store;
use crate::error::{AppError, DatabaseError};
use crate::Result;

const USER_COLUMNS: &str = "id, username, password_hash, name, email, created_at";
const RENTAL_COLUMNS: &str = "id, username, name, phonenumber, rental_date, ic_number, email, created_at";
const CAR_COLUMNS: &str = "id, username, brand, model, year, colour, noplate, created_at";

/// PostgreSQL-backed [`Store`] over one shared pool.
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(DatabaseError::ConnectionError(e.to_string())))?;

        Ok(Self::new(Arc::new(pool)))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| AppError::DatabaseError(DatabaseError::MigrationError(e.to_string())))?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }
}

/// Appends `column = $n` for every field present in a patch.
fn push_set<'a>(
    set: &mut sqlx::query_builder::Separated<'_, 'a, Postgres, &'static str>,
    column: &'static str,
    value: &Option<String>,
) {
    if let Some(value) = value {
        set.push(format!("{} = ", column));
        set.push_bind_unseparated(value.clone());
    }
}

fn rental_update_query(username: &str, patch: &RentalPatch) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("UPDATE rental_details SET ");
    {
        let mut set = query.separated(", ");
        push_set(&mut set, "name", &patch.name);
        push_set(&mut set, "email", &patch.email);
        push_set(&mut set, "phonenumber", &patch.phonenumber);
        push_set(&mut set, "rental_date", &patch.rental_date);
        push_set(&mut set, "ic_number", &patch.ic_number);
    }
    query.push(
        " WHERE id = (SELECT id FROM rental_details WHERE username = ",
    );
    query.push_bind(username.to_string());
    query.push(" ORDER BY created_at LIMIT 1)");
    query
}

fn car_update_query(id: Uuid, patch: &CarPatch) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("UPDATE car_details SET ");
    {
        let mut set = query.separated(", ");
        push_set(&mut set, "brand", &patch.brand);
        push_set(&mut set, "model", &patch.model);
        push_set(&mut set, "year", &patch.year);
        push_set(&mut set, "colour", &patch.colour);
        push_set(&mut set, "noplate", &patch.noplate);
    }
    query.push(" WHERE id = ");
    query.push_bind(id);
    query
}

#[async_trait]
impl Store for DbOperations {
    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let user = user.into_user();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.created_at)
        .fetch_one(self.pool())
        .await?;

        Ok(user)
    }

    async fn insert_rental(&self, rental: NewRental) -> Result<RentalDetails> {
        let rental = rental.into_rental();
        let rental = sqlx::query_as::<_, RentalDetails>(&format!(
            "INSERT INTO rental_details ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {cols}",
            cols = RENTAL_COLUMNS
        ))
        .bind(rental.id)
        .bind(&rental.username)
        .bind(&rental.name)
        .bind(&rental.phonenumber)
        .bind(&rental.rental_date)
        .bind(&rental.ic_number)
        .bind(&rental.email)
        .bind(rental.created_at)
        .fetch_one(self.pool())
        .await?;

        Ok(rental)
    }

    async fn delete_rental(&self, username: &str, rental_date: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM rental_details
            WHERE id = (
                SELECT id FROM rental_details
                WHERE username = $1 AND rental_date = $2
                ORDER BY created_at
                LIMIT 1
            )
            "#,
        )
        .bind(username)
        .bind(rental_date)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_rental(&self, username: &str, patch: RentalPatch) -> Result<u64> {
        if patch.is_empty() {
            return Ok(0);
        }
        let result = rental_update_query(username, &patch)
            .build()
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_car(&self, car: NewCar) -> Result<CarDetails> {
        let car = car.into_car();
        let car = sqlx::query_as::<_, CarDetails>(&format!(
            "INSERT INTO car_details ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {cols}",
            cols = CAR_COLUMNS
        ))
        .bind(car.id)
        .bind(&car.username)
        .bind(&car.brand)
        .bind(&car.model)
        .bind(&car.year)
        .bind(&car.colour)
        .bind(&car.noplate)
        .bind(car.created_at)
        .fetch_one(self.pool())
        .await?;

        Ok(car)
    }

    async fn update_car(&self, id: Uuid, patch: CarPatch) -> Result<u64> {
        if patch.is_empty() {
            return Ok(0);
        }
        let result = car_update_query(id, &patch)
            .build()
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_car(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM car_details WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let users_sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
        let rentals_sql = format!("SELECT {} FROM rental_details ORDER BY created_at", RENTAL_COLUMNS);
        let cars_sql = format!("SELECT {} FROM car_details ORDER BY created_at", CAR_COLUMNS);

        let (users, rentals, cars) = futures::try_join!(
            sqlx::query_as::<_, User>(&users_sql).fetch_all(self.pool()),
            sqlx::query_as::<_, RentalDetails>(&rentals_sql).fetch_all(self.pool()),
            sqlx::query_as::<_, CarDetails>(&cars_sql).fetch_all(self.pool()),
        )?;

        Ok(Snapshot { users, rentals, cars })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
