//! Value objects shared by baskets, orders and reservation payloads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a whole-dollar value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, or `None` if the result does not fit.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, or `None` if the result does not fit.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    /// Returns the amount as a decimal number of currency units.
    ///
    /// Only for wire formats that expect a decimal; arithmetic stays in cents.
    pub fn as_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

/// Serializer rendering [`Money`] as a decimal number (`25.5` for 2550 cents).
///
/// Use with `#[serde(serialize_with = "decimal::serialize")]`. Outbound only.
pub mod decimal {
    use serde::Serializer;

    use super::Money;

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(money.as_decimal())
    }
}

/// Errors raised when constructing an [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// A required address field was empty or whitespace.
    #[error("Address field '{0}' must not be blank")]
    BlankField(&'static str),

    /// A field is longer than the stored column allows.
    #[error("Address field '{field}' must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Shipping address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

impl Address {
    pub const MAX_STREET: usize = 180;
    pub const MAX_CITY: usize = 100;
    pub const MAX_STATE: usize = 60;
    pub const MAX_COUNTRY: usize = 90;
    pub const MAX_ZIP_CODE: usize = 18;

    /// Creates a validated address.
    ///
    /// `state` may be blank (not every country has one); the other fields may not.
    /// Lengths are counted in characters and match the `orders.ship_to_*` columns.
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Result<Self, AddressError> {
        let address = Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            country: country.into(),
            zip_code: zip_code.into(),
        };

        for (name, value) in [
            ("street", &address.street),
            ("city", &address.city),
            ("country", &address.country),
            ("zipCode", &address.zip_code),
        ] {
            if value.trim().is_empty() {
                return Err(AddressError::BlankField(name));
            }
        }

        for (field, value, max) in [
            ("street", &address.street, Self::MAX_STREET),
            ("city", &address.city, Self::MAX_CITY),
            ("state", &address.state, Self::MAX_STATE),
            ("country", &address.country, Self::MAX_COUNTRY),
            ("zipCode", &address.zip_code, Self::MAX_ZIP_CODE),
        ] {
            if value.chars().count() > max {
                return Err(AddressError::TooLong { field, max });
            }
        }

        Ok(address)
    }
}
