//! Audit trail for reference-data fetches
//!
//! The raw endpoint response and the normalised row are handed to an audit
//! sink before a snapshot is returned. Sinks swallow their own failures: an
//! audit problem never fails a computation.

use super::units::UnitInference;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEntry {
    RawResponse {
        trace_id: Uuid,
        url: String,
        received_at: DateTime<Utc>,
        body: String,
    },
    Normalized {
        trace_id: Uuid,
        key_path: String,
        raw_value: f64,
        unit: UnitInference,
        monthly_cap: f64,
        annual_cap: f64,
    },
    Fallback {
        trace_id: Uuid,
        url: String,
        reason: String,
    },
}

impl AuditEntry {
    pub fn trace_id(&self) -> Uuid {
        match self {
            AuditEntry::RawResponse { trace_id, .. }
            | AuditEntry::Normalized { trace_id, .. }
            | AuditEntry::Fallback { trace_id, .. } => *trace_id,
        }
    }
}

/// Destination for audit records
pub trait ReferenceAudit {
    fn record(&self, entry: &AuditEntry);
}

/// Writes audit records to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAudit;

impl ReferenceAudit for LogAudit {
    fn record(&self, entry: &AuditEntry) {
        match entry {
            AuditEntry::RawResponse { trace_id, url, body, .. } => {
                log::debug!(
                    "[{}] raw reference response from {} ({} bytes)",
                    trace_id,
                    url,
                    body.len()
                );
            }
            AuditEntry::Normalized {
                trace_id,
                key_path,
                raw_value,
                unit,
                monthly_cap,
                annual_cap,
            } => {
                log::info!(
                    "[{}] reference cap {} = {} ({:?}) -> monthly {:.2}, annual {:.2}",
                    trace_id, key_path, raw_value, unit, monthly_cap, annual_cap
                );
            }
            AuditEntry::Fallback { trace_id, url, reason } => {
                log::warn!("[{}] reference fetch from {} fell back: {}", trace_id, url, reason);
            }
        }
    }
}

/// Appends audit records as JSON lines to a file
#[derive(Debug, Clone)]
pub struct JsonLinesAudit {
    path: PathBuf,
}

impl JsonLinesAudit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

impl ReferenceAudit for JsonLinesAudit {
    fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.append(entry) {
            log::error!("failed to write audit record to {}: {}", self.path.display(), e);
        }
    }
}

impl<A: ReferenceAudit + ?Sized> ReferenceAudit for &A {
    fn record(&self, entry: &AuditEntry) {
        (**self).record(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_lines_audit_appends() {
        let path = std::env::temp_dir()
            .join(format!("rights_fixation_audit_{}.jsonl", Uuid::new_v4()));
        let audit = JsonLinesAudit::new(&path);
        let trace_id = Uuid::new_v4();

        audit.record(&AuditEntry::Fallback {
            trace_id,
            url: "http://example.invalid".to_string(),
            reason: "timeout".to_string(),
        });
        audit.record(&AuditEntry::Normalized {
            trace_id,
            key_path: "$.cap".to_string(),
            raw_value: 13_750.0,
            unit: UnitInference::Monthly,
            monthly_cap: 13_750.0,
            annual_cap: 165_000.0,
        });

        let contents = std::fs::read_to_string(&path).expect("audit file should exist");
        let entries: Vec<AuditEntry> = contents
            .lines()
            .map(|l| serde_json::from_str(l).expect("valid JSON line"))
            .collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.trace_id() == trace_id));
        assert!(contents.contains("\"kind\":\"fallback\""));
    }

    #[test]
    fn test_unwritable_path_is_swallowed() {
        let audit = JsonLinesAudit::new("/nonexistent-dir/for/audit.jsonl");
        audit.record(&AuditEntry::Fallback {
            trace_id: Uuid::nil(),
            url: String::new(),
            reason: String::new(),
        });
    }
}
