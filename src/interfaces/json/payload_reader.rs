use crate::domain::order::OrderPayload;
use crate::error::Result;
use std::io::Read;

/// Reads an order payload from a JSON source.
///
/// Structural problems (wrong types, negative amounts) fail here as
/// `JsonError`. Missing fields are left for `OrderPayload::into_draft`, so
/// they surface as validation errors.
pub struct OrderPayloadReader<R: Read> {
    source: R,
}

impl<R: Read> OrderPayloadReader<R> {
    /// Creates a new `OrderPayloadReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn payload(self) -> Result<OrderPayload> {
        Ok(serde_json::from_reader(self.source)?)
    }
}
