use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Writes results as JSON, one document per line.
pub struct ResponseWriter<W: Write> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write<T: Serialize>(&mut self, response: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, response)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
