//! Order entities, money handling and the ports the orchestrator talks to.

pub mod money;
pub mod notification;
pub mod order;
pub mod payment;
pub mod ports;
