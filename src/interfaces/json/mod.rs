pub mod payload_reader;
pub mod response_writer;

pub use payload_reader::OrderPayloadReader;
pub use response_writer::ResponseWriter;
