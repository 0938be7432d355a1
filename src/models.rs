//! Core data models for the advisory cache.
//!
//! This module defines the feed-side types ([`AdvisoryFile`], [`RawAdvisory`])
//! deserialized from notus feed files, the canonical [`CanonicalRecord`] stored
//! for the scanning engine, and the [`Finding`] events flowing through the
//! result aggregator.

use serde::{Deserialize, Serialize};

/// One notus feed file: file-level metadata plus its advisory entries.
///
/// Deserialized from the JSON document of a `*.notus` file. Lives only for the
/// duration of one reload pass; advisories are normalized and stored, the rest
/// is dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisoryFile {
    /// Advisory entries contained in this file.
    #[serde(default)]
    pub advisories: Vec<RawAdvisory>,
    /// Product family the file covers (e.g., "Debian").
    pub family: Option<String>,
    /// Quality-of-detection type for every advisory in the file.
    pub qod_type: Option<String>,
}

/// One vulnerability entry inside a feed file, as published by the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAdvisory {
    /// Unique advisory object identifier (e.g., "1.3.6.1.4.1.25623.1.1.2.2021.1234").
    pub oid: String,
    /// Advisory title.
    pub title: Option<String>,
    /// Creation time as a Unix timestamp.
    pub creation_date: Option<i64>,
    /// Last modification time as a Unix timestamp.
    pub last_modification: Option<i64>,
    pub summary: Option<String>,
    pub impact: Option<String>,
    pub affected: Option<String>,
    pub insight: Option<String>,
    /// CVSS vectors, newest scheme preferred on normalization.
    pub severity: Option<Severity>,
    /// CVE identifiers referencing this vulnerability.
    #[serde(default)]
    pub cves: Vec<String>,
    /// Additional cross-reference URLs.
    #[serde(default)]
    pub xrefs: Vec<String>,
    /// Primary cross-reference URL of the vendor advisory.
    pub advisory_xref: Option<String>,
    /// Vendor advisory identifier (e.g., "DSA-1234-1").
    pub advisory_id: Option<String>,
}

/// CVSS severity vectors attached to a raw advisory.
#[derive(Debug, Clone, Deserialize)]
pub struct Severity {
    pub cvss_v2: Option<String>,
    pub cvss_v3: Option<String>,
}

/// Cross-references of a canonical record.
///
/// `url` is always present (seeded with the primary advisory cross-reference,
/// even when empty); `cve` and `advisory_id` appear only when the feed
/// supplied them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryRefs {
    pub url: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory_id: Option<Vec<String>>,
}

/// The normalized, store-ready representation of an advisory.
///
/// Every field the scanning engine depends on is always present, defaulting to
/// an empty or neutral value rather than being absent. Created by
/// [`normalize`](crate::normalize::normalize) and owned by the advisory store
/// keyed by oid thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Script parameters; always empty for package advisories.
    pub vt_params: Vec<serde_json::Value>,
    /// Stringified Unix timestamp, "0" when the feed omitted it.
    pub creation_date: String,
    /// Stringified Unix timestamp, "0" when the feed omitted it.
    pub last_modification: String,
    /// Mirrors `last_modification`; kept as a separate field for the engine.
    pub modification_time: String,
    pub summary: Option<String>,
    pub impact: Option<String>,
    pub affected: Option<String>,
    pub insight: Option<String>,
    pub solution: String,
    pub solution_type: String,
    pub vuldetect: String,
    pub qod_type: String,
    /// CVSS v3 vector when available, v2 otherwise, `None` without severity.
    pub severity_vector: Option<String>,
    /// Base name (with extension) of the feed file the advisory came from.
    pub filename: String,
    pub refs: AdvisoryRefs,
    /// Product family, defaulting to the feed file's stem.
    pub family: String,
    /// Advisory title, empty string when absent.
    pub name: String,
    /// Always the package-advisory category constant "3".
    pub category: String,
}

/// One finding event produced by a scan session.
///
/// The `scan_id` keys the aggregation buffer; the remaining fields form the
/// serialized record handed to the reporting sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub scan_id: String,
    pub host_ip: String,
    pub host_name: String,
    /// Advisory the finding was produced by.
    pub oid: String,
    pub port: String,
    pub result_type: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}
