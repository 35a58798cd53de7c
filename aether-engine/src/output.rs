//! Record output in JSON Lines, JSON or CSV.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::error::EngineError;
use crate::record::InteractionRecord;

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    JsonLines,
    /// One pretty-printed JSON array.
    Json,
    /// Flat CSV; history is a JSON string column.
    Csv,
}

impl OutputFormat {
    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::JsonLines => "jsonl",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{other}' (expected jsonl, json or csv)")),
        }
    }
}

/// Flattened CSV row.
#[derive(Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    sequence: usize,
    player_id: &'a str,
    player_message: &'a str,
    npc_id: &'a str,
    npc_name: &'a str,
    npc_role: &'a str,
    npc_mood: &'static str,
    npc_response: &'a str,
    conversation_history: String,
    generation_failure: &'static str,
}

impl<'a> CsvRow<'a> {
    fn from_record(record: &'a InteractionRecord) -> Result<Self, EngineError> {
        Ok(Self {
            timestamp: record.timestamp.to_rfc3339(),
            sequence: record.sequence,
            player_id: record.player_id.as_str(),
            player_message: &record.player_message,
            npc_id: record.npc_id.as_str(),
            npc_name: &record.npc_name,
            npc_role: &record.npc_role,
            npc_mood: record.npc_mood.as_str(),
            npc_response: &record.npc_response,
            conversation_history: serde_json::to_string(&record.conversation_history)?,
            generation_failure: record.generation_failure.map_or("", |k| k.as_str()),
        })
    }
}

/// Writes interaction records in one [`OutputFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordWriter {
    format: OutputFormat,
}

impl RecordWriter {
    /// A writer for `format`.
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// The format this writer emits.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write `records` to `out`.
    ///
    /// # Errors
    /// Any serialization or I/O failure.
    pub fn write<W: Write>(&self, records: &[InteractionRecord], mut out: W) -> Result<(), EngineError> {
        match self.format {
            OutputFormat::JsonLines => {
                for record in records {
                    serde_json::to_writer(&mut out, record)?;
                    out.write_all(b"\n")?;
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut out, records)?;
                out.write_all(b"\n")?;
            }
            OutputFormat::Csv => {
                let mut csv = csv::Writer::from_writer(&mut out);
                for record in records {
                    csv.serialize(CsvRow::from_record(record)?)?;
                }
                csv.flush()?;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Write `records` to a file, creating parent directories as needed.
    ///
    /// # Errors
    /// Any serialization or I/O failure.
    pub fn write_to_path(&self, records: &[InteractionRecord], path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        self.write(records, file)?;
        info!(path = %path.display(), records = records.len(), format = %self.format, "wrote records");
        Ok(())
    }
}
