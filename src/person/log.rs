use std::fmt;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BacError;

/// One line of a drink log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    time: DateTime<Utc>,
    drink: Option<String>,
    bac: f64,
}

impl LogEntry {
    pub fn new(time: DateTime<Utc>, drink: Option<String>, bac: f64) -> Self {
        LogEntry { time, drink, bac }
    }

    /// Time of the entry
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Name of the drink consumed, `None` for entries that only track decay
    pub fn drink(&self) -> Option<&str> {
        self.drink.as_deref()
    }

    /// BAC at the time of the entry
    pub fn bac(&self) -> f64 {
        self.bac
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<20} BAC {:.4}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.drink.as_deref().unwrap_or("-"),
            self.bac
        )
    }
}

/// Append-only, time-ordered record of drinks and BAC
///
/// The log always holds at least one entry, and entries never go back in time.
#[derive(Debug, Clone, Serialize)]
pub struct DrinkLog {
    entries: Vec<LogEntry>,
}

impl DrinkLog {
    /// Start a log with a sober entry at `time`
    pub fn new(time: DateTime<Utc>) -> Self {
        DrinkLog {
            entries: vec![LogEntry::new(time, None, 0.0)],
        }
    }

    /// Append an entry, rejecting it if it is earlier than the last one
    pub fn push(&mut self, entry: LogEntry) -> Result<(), BacError> {
        let last = self.last().time;
        if entry.time < last {
            return Err(BacError::OutOfOrder {
                last,
                time: entry.time,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// The most recent entry
    pub fn last(&self) -> &LogEntry {
        &self.entries[self.entries.len() - 1]
    }

    /// The first entry
    pub fn first(&self) -> &LogEntry {
        &self.entries[0]
    }

    /// The latest entry at or before `time`, if any
    pub fn entry_at(&self, time: DateTime<Utc>) -> Option<&LogEntry> {
        let index = self.entries.partition_point(|e| e.time <= time);
        index.checked_sub(1).map(|i| &self.entries[i])
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, a log starts with one entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the log as CSV with a `time,drink,bac` header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), BacError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(writer);
        for entry in &self.entries {
            writer
                .serialize(entry)
                .map_err(|e| BacError::CSVError(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| BacError::CSVError(e.to_string()))?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DrinkLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for DrinkLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}
