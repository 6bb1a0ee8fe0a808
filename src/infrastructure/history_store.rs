//! Append-only observation log
//!
//! Records are text lines `timestamp, product_id, "title", price`. The log is
//! never rewritten or reordered; read-back reports the first malformed record
//! instead of skipping it.

use std::mem::take;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::{HistoryTable, Observation};

/// Marker written in the price field when no price was found
pub const MISSING_PRICE: &str = "nan";

/// Naive timestamp layout of logs written before timestamps carried an offset
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const FIELD_COUNT: usize = 4;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History log I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History log corrupted at record {record}: {reason}")]
    Corrupted { record: usize, reason: String },
}

impl HistoryError {
    fn corrupted(record: usize, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            record,
            reason: reason.into(),
        }
    }
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Durable, append-only observation log
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Add one record at the end of the log; never reorders or deduplicates
    async fn append(&self, observation: &Observation) -> HistoryResult<()>;

    /// Every record in stored order, typed fields parsed
    async fn read_all(&self) -> HistoryResult<HistoryTable>;
}

/// Format one observation as a log line, newline included
pub fn format_record(observation: &Observation) -> String {
    let price = observation
        .price
        .map_or_else(|| MISSING_PRICE.to_string(), |price| price.to_string());
    format!(
        "{}, {}, {}, {}\n",
        observation.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        id_field(&observation.product_id),
        quote(&observation.title),
        price
    )
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Ids are written bare unless the reader would split or trim them
fn id_field(product_id: &str) -> String {
    let needs_quotes = product_id.contains([',', '"', '\n', '\r'])
        || product_id.starts_with([' ', '\t'])
        || product_id.ends_with([' ', '\t']);
    if needs_quotes {
        quote(product_id)
    } else {
        product_id.to_string()
    }
}

/// Parse the whole log text into observations
pub fn parse_records(text: &str) -> HistoryResult<Vec<Observation>> {
    split_records(text)?
        .into_iter()
        .enumerate()
        .map(|(index, fields)| parse_fields(index + 1, fields))
        .collect()
}

fn parse_fields(record: usize, fields: Vec<String>) -> HistoryResult<Observation> {
    let [timestamp, product_id, title, price]: [String; FIELD_COUNT] = fields
        .try_into()
        .map_err(|fields: Vec<String>| {
            HistoryError::corrupted(record, format!("expected {} fields, found {}", FIELD_COUNT, fields.len()))
        })?;

    let timestamp = parse_timestamp(&timestamp)
        .ok_or_else(|| HistoryError::corrupted(record, format!("unparsable timestamp '{timestamp}'")))?;
    let price = parse_price(&price)
        .ok_or_else(|| HistoryError::corrupted(record, format!("unparsable price '{price}'")))?;

    Ok(Observation {
        timestamp,
        product_id,
        title,
        price,
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, LEGACY_TIMESTAMP_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// `Some(None)` for the missing marker, `None` for garbage
fn parse_price(value: &str) -> Option<Option<f64>> {
    if value.eq_ignore_ascii_case(MISSING_PRICE) {
        return Some(None);
    }
    value.parse::<f64>().ok().filter(|p| p.is_finite()).map(Some)
}

/// Quote-aware record splitter.
///
/// Separators are commas; spaces around unquoted fields are dropped; quoted
/// fields keep their content verbatim and may contain commas, newlines and
/// doubled quotes. Blank lines are not records.
fn split_records(text: &str) -> HistoryResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        match ch {
            ' ' | '\t' if at_field_start || quoted => {}
            '"' if at_field_start => {
                in_quotes = true;
                quoted = true;
                at_field_start = false;
            }
            ',' => {
                finish_field(&mut field, &mut record, quoted);
                quoted = false;
                at_field_start = true;
            }
            '\n' | '\r' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if !(record.is_empty() && field.trim().is_empty() && !quoted) {
                    finish_field(&mut field, &mut record, quoted);
                    records.push(take(&mut record));
                }
                field.clear();
                quoted = false;
                at_field_start = true;
            }
            _ if quoted => {
                return Err(HistoryError::corrupted(
                    records.len() + 1,
                    format!("unexpected '{ch}' after closing quote"),
                ));
            }
            _ => {
                field.push(ch);
                at_field_start = false;
            }
        }
    }

    if in_quotes {
        return Err(HistoryError::corrupted(records.len() + 1, "unterminated quoted field"));
    }
    if !(record.is_empty() && field.trim().is_empty() && !quoted) {
        finish_field(&mut field, &mut record, quoted);
        records.push(record);
    }

    Ok(records)
}

fn finish_field(field: &mut String, record: &mut Vec<String>, quoted: bool) {
    let value = take(field);
    record.push(if quoted { value } else { value.trim_end().to_string() });
}

/// History log kept in a text file
pub struct FileHistoryStore {
    path: PathBuf,
    /// Serializes appends so concurrent writers cannot interleave partial lines
    writer_lock: tokio::sync::Mutex<()>,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn append(&self, observation: &Observation) -> HistoryResult<()> {
        let line = format_record(observation);
        let _guard = self.writer_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        // one write per record keeps each append whole
        file.write_all(line.as_bytes()).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        file.sync_data().await.map_err(|e| self.io_error(e))?;

        debug!("Appended observation for {} to {:?}", observation.product_id, self.path);
        Ok(())
    }

    async fn read_all(&self) -> HistoryResult<HistoryTable> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("History log {:?} does not exist yet", self.path);
                return Ok(HistoryTable::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let records = parse_records(&text)?;
        debug!("Read {} observations from {:?}", records.len(), self.path);
        Ok(HistoryTable::new(records))
    }
}

/// History log held in memory
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<Observation>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Observation>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, observation: &Observation) -> HistoryResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observation.clone());
        Ok(())
    }

    async fn read_all(&self) -> HistoryResult<HistoryTable> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(HistoryTable::new(records))
    }
}
