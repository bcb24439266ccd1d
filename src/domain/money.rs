use crate::error::OrderError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of minor-unit digits sent to the payment gateway.
pub const MINOR_UNITS: u32 = 2;

/// Formats an amount with exactly two decimal places.
///
/// Extra precision is rounded half-to-even, so `19.999` becomes `"20.00"`
/// and `0.125` becomes `"0.12"`.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = round_minor(amount);
    rounded.rescale(MINOR_UNITS);
    rounded.to_string()
}

fn round_minor(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNITS, RoundingStrategy::MidpointNearestEven)
}

/// A non-negative monetary amount.
///
/// Wraps `rust_decimal::Decimal` so order totals never pass through binary
/// floating point. Currency is carried by the owning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, OrderError> {
        if value < Decimal::ZERO {
            Err(OrderError::ValidationError(format!(
                "Amount must not be negative: {}",
                value
            )))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The amount rounded to minor units.
    pub fn rounded(&self) -> Decimal {
        round_minor(self.0)
    }

    /// Sum of two amounts, `None` if it does not fit in a `Decimal`.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// The amount multiplied by a quantity, `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// The gateway wire representation, e.g. `"47.00"`.
    pub fn formatted(&self) -> String {
        format_amount(self.0)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = OrderError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Checks `total == subtotal + tax + shipping` at minor-unit precision.
///
/// Every component is rounded the same way the gateway will see it, so an
/// order that passes here also passes the gateway's own reconciliation.
/// A sum too large for a `Decimal` never reconciles.
pub fn totals_reconcile(subtotal: Money, tax: Money, shipping: Money, total: Money) -> bool {
    subtotal
        .rounded()
        .checked_add(tax.rounded())
        .and_then(|sum| sum.checked_add(shipping.rounded()))
        .is_some_and(|sum| sum == total.rounded())
}
