//! Best-effort fetch of the severance-cap figure
//!
//! One GET, no retries. Any failure along the way (transport, status,
//! JSON, no usable number) lands on the fallback constants.

use super::audit::{AuditEntry, LogAudit, ReferenceAudit};
use super::units::{normalize_caps, UnitThresholds};
use super::{ReferenceSnapshot, SnapshotSource};
use chrono::Utc;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Reasons a fetch could not produce a snapshot
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no numeric cap figure found in response")]
    NoCandidate,
}

/// Fetch settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Keys searched first, in order, anywhere in the body (case-insensitive)
    pub preferred_keys: Vec<String>,
    pub timeout: Duration,
    pub thresholds: UnitThresholds,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            preferred_keys: [
                "severance_cap",
                "severanceCap",
                "exempt_severance_ceiling",
                "monthly_cap",
                "annual_cap",
                "ceiling",
                "cap",
                "amount",
                "value",
                "תקרה",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            timeout: Duration::from_secs(10),
            thresholds: UnitThresholds::default(),
        }
    }
}

/// Source of raw response bodies
pub trait ReferenceSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP source
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ReferenceSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(body)
    }
}

/// Strip currency marks and thousands separators, then parse
pub fn clean_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .replace("NIS", "")
        .replace("ש\"ח", "")
        .chars()
        .filter(|c| !matches!(c, ',' | '₪' | '_') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Numeric value of a JSON leaf, if it looks like a number
fn numeric_leaf(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => clean_number(s),
        _ => None,
    }
}

fn plausible(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Depth-first search for `key` anywhere in `value`
fn find_key(value: &Value, key: &str, path: &str) -> Option<(String, f64)> {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let child = format!("{}.{}", path, k);
                if k.eq_ignore_ascii_case(key) {
                    if let Some(n) = numeric_leaf(v).filter(|n| plausible(*n)) {
                        return Some((child, n));
                    }
                }
                if let Some(found) = find_key(v, key, &child) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, v)| find_key(v, key, &format!("{}[{}]", path, i))),
        _ => None,
    }
}

/// Depth-first search for the first plausible numeric leaf
fn find_any_numeric(value: &Value, path: &str) -> Option<(String, f64)> {
    match value {
        Value::Object(map) => map
            .iter()
            .find_map(|(k, v)| find_any_numeric(v, &format!("{}.{}", path, k))),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, v)| find_any_numeric(v, &format!("{}[{}]", path, i))),
        leaf => numeric_leaf(leaf)
            .filter(|n| plausible(*n))
            .map(|n| (path.to_string(), n)),
    }
}

/// Locate the cap figure in a response body
///
/// Preferred keys win in list order; otherwise the first numeric-looking
/// leaf in document order. Returns the JSON path and the parsed value.
pub fn find_candidate(body: &Value, preferred_keys: &[String]) -> Option<(String, f64)> {
    preferred_keys
        .iter()
        .find_map(|key| find_key(body, key, "$"))
        .or_else(|| find_any_numeric(body, "$"))
}

/// Turns endpoint responses into reference snapshots
pub struct ReferenceNormalizer<S, A> {
    source: S,
    audit: A,
    config: FetchConfig,
}

impl<S: ReferenceSource, A: ReferenceAudit> ReferenceNormalizer<S, A> {
    pub fn new(source: S, audit: A, config: FetchConfig) -> Self {
        Self { source, audit, config }
    }

    /// Fetch a snapshot, falling back to the constants on any failure
    pub fn snapshot(&self, url: &str) -> ReferenceSnapshot {
        let trace_id = Uuid::new_v4();
        match self.try_snapshot(url, trace_id) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.audit.record(&AuditEntry::Fallback {
                    trace_id,
                    url: url.to_string(),
                    reason: e.to_string(),
                });
                ReferenceSnapshot::fallback_traced(trace_id)
            }
        }
    }

    fn try_snapshot(&self, url: &str, trace_id: Uuid) -> Result<ReferenceSnapshot, FetchError> {
        let body = self.source.fetch(url)?;
        let fetched_at = Utc::now();
        self.audit.record(&AuditEntry::RawResponse {
            trace_id,
            url: url.to_string(),
            received_at: fetched_at,
            body: body.clone(),
        });

        let json: Value = serde_json::from_str(&body)?;
        let (key_path, raw_value) =
            find_candidate(&json, &self.config.preferred_keys).ok_or(FetchError::NoCandidate)?;

        let unit = self.config.thresholds.classify(raw_value);
        let (monthly_cap, annual_cap) = normalize_caps(raw_value, unit);
        if unit.is_low_confidence() {
            log::warn!(
                "[{}] reference cap {} at {} is below the monthly floor; kept as monthly",
                trace_id, raw_value, key_path
            );
        }

        self.audit.record(&AuditEntry::Normalized {
            trace_id,
            key_path,
            raw_value,
            unit,
            monthly_cap,
            annual_cap,
        });

        Ok(ReferenceSnapshot {
            monthly_cap,
            annual_cap,
            unit_inferred: unit,
            source: SnapshotSource::Fetched,
            fetched_at,
            trace_id,
            raw_value: Some(raw_value),
            ..ReferenceSnapshot::fallback_traced(trace_id)
        })
    }
}

/// Fetch a snapshot over HTTP with default settings, logging the audit trail
pub fn fetch_reference_snapshot(endpoint_url: &str) -> ReferenceSnapshot {
    let config = FetchConfig::default();
    match HttpSource::new(config.timeout) {
        Ok(source) => ReferenceNormalizer::new(source, LogAudit, config).snapshot(endpoint_url),
        Err(e) => {
            let trace_id = Uuid::new_v4();
            LogAudit.record(&AuditEntry::Fallback {
                trace_id,
                url: endpoint_url.to_string(),
                reason: e.to_string(),
            });
            ReferenceSnapshot::fallback_traced(trace_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{UnitInference, FALLBACK_ANNUAL_CAP, FALLBACK_MONTHLY_CAP};
    use serde_json::json;
    use std::cell::RefCell;

    struct StaticSource(&'static str);

    impl ReferenceSource for StaticSource {
        fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSource;

    impl ReferenceSource for FailingSource {
        fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Err(FetchError::NoCandidate)
        }
    }

    #[derive(Default)]
    struct MemoryAudit(RefCell<Vec<AuditEntry>>);

    impl ReferenceAudit for MemoryAudit {
        fn record(&self, entry: &AuditEntry) {
            self.0.borrow_mut().push(entry.clone());
        }
    }

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_clean_number() {
        assert_eq!(clean_number("13,750"), Some(13_750.0));
        assert_eq!(clean_number(" ₪ 165,000.50 "), Some(165_000.5));
        assert_eq!(clean_number("13750 NIS"), Some(13_750.0));
        assert_eq!(clean_number("2024-01-01"), None);
        assert_eq!(clean_number("n/a"), None);
        assert_eq!(clean_number(""), None);
    }

    #[test]
    fn test_preferred_key_wins_over_earlier_numbers() {
        let body = json!({
            "year": 2025,
            "data": { "rows": [ { "ceiling": "13,750" } ] }
        });
        let (path, value) = find_candidate(&body, &keys(&["ceiling"])).unwrap();
        assert_eq!(path, "$.data.rows[0].ceiling");
        assert_eq!(value, 13_750.0);
    }

    #[test]
    fn test_preferred_key_order() {
        let body = json!({ "amount": 500.0, "cap": 13_750.0 });
        let (_, value) = find_candidate(&body, &keys(&["cap", "amount"])).unwrap();
        assert_eq!(value, 13_750.0);
    }

    #[test]
    fn test_falls_back_to_any_numeric_leaf() {
        let body = json!({ "meta": { "label": "severance" }, "result": [ "x", "165000" ] });
        let (path, value) = find_candidate(&body, &keys(&["cap"])).unwrap();
        assert_eq!(path, "$.result[1]");
        assert_eq!(value, 165_000.0);
    }

    #[test]
    fn test_any_numeric_scan_follows_response_key_order() {
        let raw = r#"{"severance": {"figure": 165000}, "fiscal_year": 2025}"#;
        let body: Value = serde_json::from_str(raw).unwrap();
        let (path, value) = find_candidate(&body, &FetchConfig::default().preferred_keys).unwrap();
        assert_eq!(path, "$.severance.figure");
        assert_eq!(value, 165_000.0);
    }

    #[test]
    fn test_non_positive_values_are_skipped() {
        let body = json!({ "cap": 0, "other": -5, "value": 12_000 });
        let (_, value) = find_candidate(&body, &keys(&["cap"])).unwrap();
        assert_eq!(value, 12_000.0);
        assert!(find_candidate(&json!({ "a": "text", "b": null }), &keys(&["cap"])).is_none());
    }

    #[test]
    fn test_snapshot_from_annual_figure() {
        let audit = MemoryAudit::default();
        let normalizer = ReferenceNormalizer::new(
            StaticSource(r#"{"severance_cap": "165,000"}"#),
            &audit,
            FetchConfig::default(),
        );
        let snapshot = normalizer.snapshot("http://tax.example/caps");

        assert_eq!(snapshot.source, SnapshotSource::Fetched);
        assert_eq!(snapshot.unit_inferred, UnitInference::Annual);
        assert_eq!(snapshot.annual_cap, 165_000.0);
        assert_eq!(snapshot.monthly_cap, 13_750.0);
        assert_eq!(snapshot.raw_value, Some(165_000.0));

        let entries = audit.0.borrow();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], AuditEntry::RawResponse { .. }));
        assert!(matches!(entries[1], AuditEntry::Normalized { .. }));
        assert!(entries.iter().all(|e| e.trace_id() == snapshot.trace_id));
    }

    #[test]
    fn test_low_confidence_figure_is_kept() {
        let normalizer = ReferenceNormalizer::new(
            StaticSource(r#"{"cap": 750}"#),
            LogAudit,
            FetchConfig::default(),
        );
        let snapshot = normalizer.snapshot("http://tax.example/caps");
        assert_eq!(snapshot.source, SnapshotSource::Fetched);
        assert_eq!(snapshot.unit_inferred, UnitInference::MonthlyLowConfidence);
        assert_eq!(snapshot.monthly_cap, 750.0);
    }

    #[test]
    fn test_fetch_failure_falls_back() {
        let audit = MemoryAudit::default();
        let snapshot = ReferenceNormalizer::new(FailingSource, &audit, FetchConfig::default())
            .snapshot("http://tax.example/caps");

        assert_eq!(snapshot.source, SnapshotSource::Fallback);
        assert_eq!(snapshot.source.as_str(), "fallback");
        assert_eq!(snapshot.monthly_cap, FALLBACK_MONTHLY_CAP);
        assert_eq!(snapshot.annual_cap, FALLBACK_ANNUAL_CAP);
        assert_eq!(audit.0.borrow().len(), 1);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let snapshot = ReferenceNormalizer::new(
            StaticSource("<html>oops</html>"),
            LogAudit,
            FetchConfig::default(),
        )
        .snapshot("http://tax.example/caps");
        assert_eq!(snapshot.source, SnapshotSource::Fallback);
        assert_eq!(snapshot.raw_value, None);
    }

    #[test]
    fn test_unreachable_endpoint_falls_back() {
        let config = FetchConfig {
            timeout: Duration::from_millis(500),
            ..Default::default()
        };
        let source = HttpSource::new(config.timeout).expect("client should build");
        let snapshot =
            ReferenceNormalizer::new(source, LogAudit, config).snapshot("http://127.0.0.1:9/caps");
        assert_eq!(snapshot.source, SnapshotSource::Fallback);
    }
}
