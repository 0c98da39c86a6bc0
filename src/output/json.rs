use crate::output::{OutputFormatter, Summary};
use std::io::Write;

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format<W: Write>(&self, summary: &Summary, writer: &mut W) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(summary).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

/// Pretty JSON of any serializable value, newline terminated.
pub fn write_json<W: Write, T: serde::Serialize + ?Sized>(value: &T, writer: &mut W) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}
