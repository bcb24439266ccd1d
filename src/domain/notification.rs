use super::order::Order;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CASH_ON_DELIVERY: &str = "Cash on Delivery";
pub const ONLINE_PAYMENT: &str = "Online Payment";

/// Who a confirmation message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "lowercase")]
pub enum Recipient {
    Customer(String),
    Operations(String),
}

impl Recipient {
    pub fn address(&self) -> &str {
        match self {
            Self::Customer(address) | Self::Operations(address) => address,
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer(address) => write!(f, "customer <{}>", address),
            Self::Operations(address) => write!(f, "operations <{}>", address),
        }
    }
}

/// Template parameters of an order confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub customer_name: String,
    pub customer_email: String,
    pub order_id: String,
    pub total: String,
    pub currency: String,
    pub items: String,
    pub payment_method: String,
}

impl OrderConfirmation {
    pub fn for_order(order: &Order, payment_method: &str) -> Self {
        Self {
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.clone(),
            order_id: order.id.to_string(),
            total: order.total.formatted(),
            currency: order.currency.clone(),
            items: order.item_summary(),
            payment_method: payment_method.to_string(),
        }
    }

    /// The parameters for one recipient, with `to_email` filled in.
    pub fn addressed_to(&self, recipient: &Recipient) -> serde_json::Value {
        let mut params = serde_json::to_value(self).unwrap_or_default();
        if let serde_json::Value::Object(map) = &mut params {
            map.insert(
                "to_email".to_string(),
                serde_json::Value::String(recipient.address().to_string()),
            );
        }
        params
    }
}

/// Per-recipient result of a best-effort notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<Recipient>,
    pub failed: Vec<(Recipient, String)>,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempts(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}
