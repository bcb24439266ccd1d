use super::money::{Money, format_amount};
use super::order::Order;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a payment intent on the gateway side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayReference(String);

impl GatewayReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Itemized components of an intent amount, already formatted for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountBreakdown {
    pub item_total: String,
    pub shipping: String,
    pub tax_total: String,
    pub discount: String,
    pub handling: String,
    pub insurance: String,
    pub shipping_discount: String,
}

impl AmountBreakdown {
    /// Sums the components the way the gateway reconciles them.
    ///
    /// Returns `None` when a component is not a decimal number or the sum
    /// overflows.
    pub fn reconciled_total(&self) -> Option<Decimal> {
        let parse = |v: &str| v.parse::<Decimal>().ok();
        parse(&self.item_total)?
            .checked_add(parse(&self.shipping)?)?
            .checked_add(parse(&self.tax_total)?)?
            .checked_add(parse(&self.handling)?)?
            .checked_add(parse(&self.insurance)?)?
            .checked_sub(parse(&self.discount)?)?
            .checked_sub(parse(&self.shipping_discount)?)
    }
}

/// Request to authorize a payment for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub amount: String,
    pub currency: String,
    pub breakdown: AmountBreakdown,
    pub brand_name: String,
}

impl IntentRequest {
    pub fn for_order(order: &Order, brand_name: &str) -> Self {
        let zero = format_amount(Decimal::ZERO);
        let wire = |m: Money| m.formatted();
        Self {
            amount: wire(order.total),
            currency: order.currency.clone(),
            breakdown: AmountBreakdown {
                item_total: wire(order.subtotal),
                shipping: wire(order.shipping),
                tax_total: wire(order.tax),
                discount: zero.clone(),
                handling: zero.clone(),
                insurance: zero.clone(),
                shipping_discount: zero,
            },
            brand_name: brand_name.to_string(),
        }
    }
}

/// A successfully created intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIntent {
    pub reference: GatewayReference,
    pub approval_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaptureStatus {
    Completed,
    Declined,
    Pending,
}

/// Terminal report of a capture attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    pub status: CaptureStatus,
    /// Gateway response body, kept for audit logging.
    pub raw: serde_json::Value,
}

impl CaptureOutcome {
    pub fn new(status: CaptureStatus) -> Self {
        Self {
            status,
            raw: serde_json::Value::Null,
        }
    }
}
