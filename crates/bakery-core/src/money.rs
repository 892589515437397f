//! # Money Types
//!
//! Decimal currency amounts. Prices are stored as `NUMERIC(10,2)` and
//! travel through JSON as plain decimal numbers.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{ShopError, ShopResult};

/// Largest value a `NUMERIC(10,2)` column holds
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Round half away from zero to kopecks
pub fn round_minor(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to kopecks and check the value fits a non-negative `NUMERIC(10,2)`
pub fn stored_amount(value: Decimal, field: &str) -> ShopResult<Decimal> {
    let rounded = round_minor(value);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        return Err(ShopError::Validation(format!("{} must not be negative", field)));
    }
    if rounded > max_amount() {
        return Err(ShopError::Validation(format!(
            "{} exceeds {}",
            field,
            max_amount()
        )));
    }
    Ok(rounded)
}

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    RUB,
    USD,
    EUR,
}

impl Currency {
    /// Returns the ISO 4217 currency code as the gateway expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::RUB => "RUB",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
        }
    }

    /// Symbol used in human-facing text (emails)
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::RUB => "₽",
            Currency::USD => "$",
            Currency::EUR => "€",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decimal amount in a given currency.
///
/// Serialized the way the payment gateway expects it:
/// `{"value": "7.00", "currency": "RUB"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub value: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    pub fn rub(value: Decimal) -> Self {
        Self::new(value, Currency::RUB)
    }

    /// Value rounded half-up to kopecks and formatted with two decimals
    pub fn minor_precision_string(&self) -> String {
        format!("{:.2}", round_minor(self.value))
    }

    /// Format for display (e.g., "7.00 ₽")
    pub fn display(&self) -> String {
        format!("{} {}", self.minor_precision_string(), self.currency.symbol())
    }

    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }
}

/// Line subtotal: `price × quantity`, bounded like any stored amount
pub fn line_subtotal(price: Decimal, quantity: u32) -> ShopResult<Decimal> {
    let subtotal = price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| ShopError::Validation("line subtotal overflows".to_string()))?;
    stored_amount(subtotal, "subtotal")
}
