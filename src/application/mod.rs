//! Application layer containing the order lifecycle orchestration.
//!
//! This module defines the `OrderOrchestrator`, the entry point for the
//! prepay, capture-confirmation and cash-on-delivery flows. Every flow is a
//! plain async call; consistency across concurrent calls comes from the
//! store's compare-and-transition, not from locks held here.

pub mod orchestrator;
