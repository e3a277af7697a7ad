//! CSV export of consumer attributes for drawings and documents.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sizing::types::{ATTRIBUTE_KEYS, Consumer};

/// Exports consumer attributes to a CSV file at the given path.
///
/// Writes a header row of [`ATTRIBUTE_KEYS`] followed by one row per
/// consumer in panel order. Produces deterministic output for identical
/// inputs.
///
/// # Arguments
///
/// * `consumers` - Consumers of a recomputed panel
/// * `path` - Output file path
///
/// # Errors
///
/// Returns a `csv::Error` if file creation or writing fails.
pub fn export_csv(consumers: &[Consumer], path: &Path) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(consumers, buf)
}

/// Writes consumer attributes as CSV to any writer.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_csv(consumers: &[Consumer], writer: impl Write) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(ATTRIBUTE_KEYS)?;
    for consumer in consumers {
        wtr.write_record(consumer.attributes().iter().map(|(_, value)| value))?;
    }

    wtr.flush()?;
    Ok(())
}
