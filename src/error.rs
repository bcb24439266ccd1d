use crate::domain::order::{Order, OrderId, OrderStatus};
use thiserror::Error;

/// Which side of the boundary an error should be blamed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Client,
    Server,
}

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order {} was concurrently moved to {}", current.id, current.status)]
    Conflict { current: Box<Order> },
    #[error("Payment gateway error: {cause}")]
    GatewayError { cause: String },
    #[error("Notification error: {0}")]
    NotificationError(String),
    #[error("Order {0} already has a payment intent or has settled")]
    AlreadyInitiated(OrderId),
    #[error("Cannot transition order to {0}")]
    InvalidTransition(OrderStatus),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl OrderError {
    pub fn gateway(cause: impl Into<String>) -> Self {
        Self::GatewayError {
            cause: cause.into(),
        }
    }

    pub fn fault(&self) -> Fault {
        match self {
            Self::ValidationError(_)
            | Self::NotFound(_)
            | Self::AlreadyInitiated(_)
            | Self::JsonError(_) => Fault::Client,
            _ => Fault::Server,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;
