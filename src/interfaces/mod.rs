//! Edge adapters that turn raw input into core calls and results into output.

pub mod json;
