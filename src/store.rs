//! The revocation store: the read-only interface the request path and the
//! CRL builder consult, plus the index-file backend the admin commands
//! maintain.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use snafu::{OptionExt, ResultExt};

use crate::der::time;
use crate::error::{self, StoreError};

/// Record state codes as stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Valid,
    Revoked,
    Expired,
}

impl RecordStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "V" => Some(Self::Valid),
            "R" => Some(Self::Revoked),
            "E" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Valid => "V",
            Self::Revoked => "R",
            Self::Expired => "E",
        }
    }
}

/// One revocation record as the store hands it to the resolver. Timestamps
/// stay in their stored string form; the resolver owns their interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationRecord {
    pub status: RecordStatus,
    /// `YYMMDDHHMMSSZ` or `YYYYMMDDHHMMSSZ`.
    pub expiry: String,
    /// `YYMMDDHHMMSSZ[,reason]` when revoked, empty otherwise.
    pub revoked: String,
}

/// Read-only store interface. `fetch` is a pure function of the store's
/// current state; the CRL builder walks `records` through the same
/// interface while responders keep serving.
pub trait RevocationStore {
    fn fetch(&self, serial_hex: &str) -> Result<Option<RevocationRecord>, StoreError>;

    /// Every `(serial, record)` pair in the database.
    fn records(&self) -> Result<Vec<(String, RevocationRecord)>, StoreError>;
}

/// Interprets a database timestamp. Two-digit years are read in the 2000
/// century (`991231235959Z` is the conventional 2099 far-future sentinel);
/// four-digit years are taken literally.
pub fn parse_db_time(text: &str) -> Result<DateTime<Utc>, StoreError> {
    let invalid = || error::InvalidTimestampSnafu { text };

    let (year, tail) = match text.len() {
        13 if text.ends_with('Z') => {
            let yy: i32 = text[..2].parse().ok().with_context(invalid)?;
            (2000 + yy, &text[2..12])
        }
        15 if text.ends_with('Z') => {
            let year: i32 = text[..4].parse().ok().with_context(invalid)?;
            (year, &text[4..14])
        }
        _ => return Err(invalid().build()),
    };

    time::parse_fields(year, tail).with_context(invalid)
}

/// Formats an instant in the database's 13-character form.
pub fn format_db_time(at: DateTime<Utc>) -> String {
    at.format("%y%m%d%H%M%SZ").to_string()
}

/// Flat-file store in the OpenSSL `ca` index format: one record per line,
/// tab-separated `status expiry revoked serial filename subject`.
#[derive(Debug, Clone)]
pub struct IndexFileStore {
    path: PathBuf,
}

#[derive(Debug, Clone)]
struct IndexRecord {
    status: String,
    expiry: String,
    revoked: String,
    serial: String,
    filename: String,
    subject: String,
}

impl IndexRecord {
    fn to_line(&self) -> String {
        [
            self.status.as_str(),
            self.expiry.as_str(),
            self.revoked.as_str(),
            self.serial.as_str(),
            self.filename.as_str(),
            self.subject.as_str(),
        ]
        .join("\t")
    }
}

impl IndexFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<IndexRecord>, StoreError> {
        let text = std::fs::read_to_string(&self.path).context(error::DatabaseSnafu {
            path: self.path.clone(),
        })?;

        let mut records = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 6 || RecordStatus::from_code(fields[0]).is_none() {
                return error::MalformedRecordSnafu {
                    path: self.path.clone(),
                    line: index + 1,
                }
                .fail();
            }
            records.push(IndexRecord {
                status: fields[0].to_string(),
                expiry: fields[1].to_string(),
                revoked: fields[2].to_string(),
                serial: fields[3].to_ascii_uppercase(),
                filename: fields[4].to_string(),
                subject: fields[5].to_string(),
            });
        }
        Ok(records)
    }

    /// Replaces the database atomically: in-flight readers keep the old
    /// snapshot, the rename publishes the new one.
    fn save(&self, records: &[IndexRecord]) -> Result<(), StoreError> {
        let mut text = String::new();
        for record in records {
            text.push_str(&record.to_line());
            text.push('\n');
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, text).context(error::DatabaseSnafu { path: temp.clone() })?;
        std::fs::rename(&temp, &self.path).context(error::DatabaseSnafu {
            path: self.path.clone(),
        })
    }

    /// Appends a `V` record for a newly issued certificate.
    pub fn record(
        &self,
        serial_hex: &str,
        expiry: DateTime<Utc>,
        subject: &str,
    ) -> Result<(), StoreError> {
        let serial = serial_hex.to_ascii_uppercase();
        let mut records = if self.path.exists() {
            self.load()?
        } else {
            Vec::new()
        };
        if records.iter().any(|r| r.serial == serial) {
            return error::SerialExistsSnafu { serial }.fail();
        }
        records.push(IndexRecord {
            status: RecordStatus::Valid.code().to_string(),
            expiry: format_db_time(expiry),
            revoked: String::new(),
            serial,
            filename: "unknown".to_string(),
            subject: subject.to_string(),
        });
        self.save(&records)
    }

    /// Marks a record revoked at `at`, with an optional reason name.
    pub fn revoke(
        &self,
        serial_hex: &str,
        at: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<(), StoreError> {
        self.update(serial_hex, |record| {
            record.status = RecordStatus::Revoked.code().to_string();
            record.revoked = match reason {
                Some(reason) => format!("{},{}", format_db_time(at), reason),
                None => format_db_time(at),
            };
        })
    }

    /// Returns a revoked record to `V`, clearing the revocation data.
    pub fn restore(&self, serial_hex: &str) -> Result<(), StoreError> {
        self.update(serial_hex, |record| {
            record.status = RecordStatus::Valid.code().to_string();
            record.revoked = String::new();
        })
    }

    fn update(
        &self,
        serial_hex: &str,
        apply: impl FnOnce(&mut IndexRecord),
    ) -> Result<(), StoreError> {
        let serial = serial_hex.to_ascii_uppercase();
        let mut records = self.load()?;
        let record = records
            .iter_mut()
            .find(|r| r.serial == serial)
            .context(error::SerialNotFoundSnafu { serial })?;
        apply(record);
        self.save(&records)
    }
}

impl RevocationStore for IndexFileStore {
    fn fetch(&self, serial_hex: &str) -> Result<Option<RevocationRecord>, StoreError> {
        let serial = serial_hex.to_ascii_uppercase();
        Ok(self
            .load()?
            .into_iter()
            .find(|record| record.serial == serial)
            .map(|record| RevocationRecord {
                // from_code validated on load
                status: RecordStatus::from_code(&record.status).unwrap_or(RecordStatus::Expired),
                expiry: record.expiry,
                revoked: record.revoked,
            }))
    }

    fn records(&self) -> Result<Vec<(String, RevocationRecord)>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .map(|record| {
                (
                    record.serial.clone(),
                    RevocationRecord {
                        status: RecordStatus::from_code(&record.status)
                            .unwrap_or(RecordStatus::Expired),
                        expiry: record.expiry,
                        revoked: record.revoked,
                    },
                )
            })
            .collect())
    }
}

/// In-memory store for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, RevocationRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, serial_hex: &str, record: RevocationRecord) {
        self.records
            .insert(serial_hex.to_ascii_uppercase(), record);
    }
}

impl RevocationStore for MemoryStore {
    fn fetch(&self, serial_hex: &str) -> Result<Option<RevocationRecord>, StoreError> {
        Ok(self.records.get(&serial_hex.to_ascii_uppercase()).cloned())
    }

    fn records(&self) -> Result<Vec<(String, RevocationRecord)>, StoreError> {
        Ok(self
            .records
            .iter()
            .map(|(serial, record)| (serial.clone(), record.clone()))
            .collect())
    }
}
