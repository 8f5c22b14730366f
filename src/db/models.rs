use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored credential row. Deliberately not `Serialize`: responses go through
/// [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            username: self.username,
            password_hash: self.password_hash,
            name: self.name,
            email: self.email,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RentalDetails {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub phonenumber: String,
    #[serde(rename = "rentalDate")]
    pub rental_date: String,
    #[serde(rename = "ICnumber")]
    pub ic_number: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRental {
    pub username: String,
    pub name: String,
    pub phonenumber: String,
    pub rental_date: String,
    pub ic_number: String,
    pub email: String,
}

impl NewRental {
    pub fn into_rental(self) -> RentalDetails {
        RentalDetails {
            id: Uuid::new_v4(),
            username: self.username,
            name: self.name,
            phonenumber: self.phonenumber,
            rental_date: self.rental_date,
            ic_number: self.ic_number,
            email: self.email,
            created_at: Utc::now(),
        }
    }
}

/// Admin patch of a rental. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RentalPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phonenumber: Option<String>,
    #[serde(rename = "rentalDate")]
    pub rental_date: Option<String>,
    #[serde(rename = "ICnumber")]
    pub ic_number: Option<String>,
}

impl RentalPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phonenumber.is_none()
            && self.rental_date.is_none()
            && self.ic_number.is_none()
    }

    pub fn apply_to(&self, rental: &mut RentalDetails) {
        if let Some(name) = &self.name {
            rental.name = name.clone();
        }
        if let Some(email) = &self.email {
            rental.email = email.clone();
        }
        if let Some(phonenumber) = &self.phonenumber {
            rental.phonenumber = phonenumber.clone();
        }
        if let Some(rental_date) = &self.rental_date {
            rental.rental_date = rental_date.clone();
        }
        if let Some(ic_number) = &self.ic_number {
            rental.ic_number = ic_number.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CarDetails {
    pub id: Uuid,
    /// Admin principal that created the car.
    pub username: String,
    pub brand: String,
    pub model: String,
    pub year: String,
    pub colour: String,
    pub noplate: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCar {
    pub username: String,
    pub brand: String,
    pub model: String,
    pub year: String,
    pub colour: String,
    pub noplate: String,
}

impl NewCar {
    pub fn into_car(self) -> CarDetails {
        CarDetails {
            id: Uuid::new_v4(),
            username: self.username,
            brand: self.brand,
            model: self.model,
            year: self.year,
            colour: self.colour,
            noplate: self.noplate,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CarPatch {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub colour: Option<String>,
    pub noplate: Option<String>,
}

impl CarPatch {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.colour.is_none()
            && self.noplate.is_none()
    }

    pub fn apply_to(&self, car: &mut CarDetails) {
        if let Some(brand) = &self.brand {
            car.brand = brand.clone();
        }
        if let Some(model) = &self.model {
            car.model = model.clone();
        }
        if let Some(year) = &self.year {
            car.year = year.clone();
        }
        if let Some(colour) = &self.colour {
            car.colour = colour.clone();
        }
        if let Some(noplate) = &self.noplate {
            car.noplate = noplate.clone();
        }
    }
}

/// Every record, for the admin overview.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub rentals: Vec<RentalDetails>,
    pub cars: Vec<CarDetails>,
}
