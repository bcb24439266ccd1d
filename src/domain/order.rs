use super::money::{Money, totals_reconcile};
use super::payment::GatewayReference;
use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque order identifier assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OrderId {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| OrderError::NotFound(format!("malformed order id {:?}", s)))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Created,
    Paid,
    Failed,
    Refunded,
}

impl OrderStatus {
    /// Paid, failed and refunded orders are never moved by the orchestrator.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Created)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(alias = "price")]
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderItem {
    /// `unit_price * quantity`, `None` if the product overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Customer {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// An order request as it arrives at the boundary.
///
/// Every field is optional so that missing data surfaces as a
/// `ValidationError` instead of a deserialization failure.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
    #[serde(default)]
    pub subtotal: Option<Money>,
    #[serde(default)]
    pub tax: Option<Money>,
    #[serde(default)]
    pub shipping: Option<Money>,
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerPayload>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CustomerPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl OrderPayload {
    /// Turns the raw payload into a validated draft.
    ///
    /// `default_currency` is used when the payload names none.
    pub fn into_draft(self, default_currency: &str) -> Result<OrderDraft> {
        let items = match self.items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(invalid("order must contain at least one item")),
        };

        let customer = self
            .customer
            .ok_or_else(|| invalid("customer is required"))?;
        let name = non_blank(customer.name).ok_or_else(|| invalid("customer name is required"))?;
        let email =
            non_blank(customer.email).ok_or_else(|| invalid("customer email is required"))?;

        let subtotal = self
            .subtotal
            .ok_or_else(|| invalid("subtotal is required"))?;
        let total = self.total.ok_or_else(|| invalid("total is required"))?;

        let currency = match self.currency {
            Some(code) => code,
            None => default_currency.to_string(),
        };

        let draft = OrderDraft {
            items,
            subtotal,
            tax: self.tax.unwrap_or(Money::ZERO),
            shipping: self.shipping.unwrap_or(Money::ZERO),
            total,
            currency: normalize_currency(&currency)?,
            customer: Customer {
                name,
                email,
                address: non_blank(customer.address),
            },
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// A validated order that has not been persisted yet.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub currency: String,
    pub customer: Customer,
}

impl OrderDraft {
    /// Re-checks every invariant a persisted order must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(invalid("order must contain at least one item"));
        }
        if let Some(item) = self
            .items
            .iter()
            .find(|i| i.product_id.trim().is_empty() || i.name.trim().is_empty())
        {
            return Err(invalid(format!(
                "item {:?} is missing a product id or name",
                item.product_id
            )));
        }
        if let Some(item) = self.items.iter().find(|i| i.line_total().is_none()) {
            return Err(invalid(format!(
                "item {:?} line total is out of range",
                item.product_id
            )));
        }
        if self.customer.name.trim().is_empty() {
            return Err(invalid("customer name is required"));
        }
        if self.customer.email.trim().is_empty() {
            return Err(invalid("customer email is required"));
        }
        normalize_currency(&self.currency)?;
        if !totals_reconcile(self.subtotal, self.tax, self.shipping, self.total) {
            return Err(invalid(format!(
                "total {} does not equal subtotal {} + tax {} + shipping {}",
                self.total, self.subtotal, self.tax, self.shipping
            )));
        }
        Ok(())
    }
}

/// The persisted order record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub currency: String,
    pub customer: Customer,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<GatewayReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a compare-and-transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The update was written.
    Applied(Order),
    /// The order had already settled; nothing was written.
    Unchanged(Order),
}

impl Transition {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(order) | Self::Unchanged(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Applied(order) | Self::Unchanged(order) => order,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

impl Order {
    /// Builds a freshly created record from a draft.
    pub fn from_draft(id: OrderId, draft: OrderDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            items: draft.items,
            subtotal: draft.subtotal,
            tax: draft.tax,
            shipping: draft.shipping,
            total: draft.total,
            currency: draft.currency,
            customer: draft.customer,
            status: OrderStatus::Created,
            gateway_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the compare-and-transition rules to this record in place.
    ///
    /// Stores call this while holding whatever makes their read-modify-write
    /// atomic.
    pub fn transition(
        &mut self,
        expected_reference: &GatewayReference,
        new_status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        if new_status == OrderStatus::Refunded {
            return Err(OrderError::InvalidTransition(new_status));
        }

        if self.status.is_settled() {
            return Ok(Transition::Unchanged(self.clone()));
        }

        match &self.gateway_reference {
            Some(stored) if stored != expected_reference => {
                return Err(OrderError::Conflict {
                    current: Box::new(self.clone()),
                });
            }
            Some(_) => {}
            None => self.gateway_reference = Some(expected_reference.clone()),
        }

        self.status = new_status;
        // Never let a skewed clock move updatedAt backwards.
        self.updated_at = now.max(self.updated_at);
        Ok(Transition::Applied(self.clone()))
    }

    /// One line per item, e.g. `Shirt x 2 = 40.00`.
    pub fn item_summary(&self) -> String {
        self.items
            .iter()
            .map(|i| match i.line_total() {
                Some(line) => format!("{} x {} = {}", i.name, i.quantity, line),
                None => format!("{} x {} @ {}", i.name, i.quantity, i.unit_price),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn invalid(message: impl Into<String>) -> OrderError {
    OrderError::ValidationError(message.into())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_currency(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(invalid(format!("invalid currency code {:?}", code)))
    }
}
