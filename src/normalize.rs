//! Normalization of raw feed advisories into canonical records.
//!
//! This is a pure, deterministic transformation: one [`RawAdvisory`] plus its
//! file's metadata in, one [`CanonicalRecord`] out. Every constant and default
//! here is part of the contract with the scanning engine, not an
//! implementation choice.

use std::path::Path;

use crate::models::{AdvisoryFile, AdvisoryRefs, CanonicalRecord, RawAdvisory};

/// Fixed remediation text; this subsystem only represents vendor-fix package
/// advisories.
pub const SOLUTION: &str = "Please install the updated package(s).";

/// Fixed solution classification.
pub const SOLUTION_TYPE: &str = "VendorFix";

/// Fixed detection-method text for the package presence/version check.
pub const VULDETECT: &str =
    "Checks if a vulnerable package version is present on the target host.";

/// Quality-of-detection type used when the feed file does not declare one.
pub const DEFAULT_QOD_TYPE: &str = "package";

/// Script category constant identifying a package advisory.
pub const CATEGORY_PACKAGE_ADVISORY: &str = "3";

/// Build the canonical record for one advisory of a feed file.
///
/// Timestamps are stringified with `"0"` standing in for missing values. The
/// severity vector prefers CVSS v3 over v2. The `url` cross-reference list is
/// always present, seeded with the primary advisory cross-reference even when
/// that is the empty string.
pub fn normalize(path: &Path, advisory: &RawAdvisory, metadata: &AdvisoryFile) -> CanonicalRecord {
    let creation_date = advisory.creation_date.unwrap_or(0).to_string();
    let last_modification = advisory.last_modification.unwrap_or(0).to_string();

    let severity_vector = advisory
        .severity
        .as_ref()
        .and_then(|s| s.cvss_v3.clone().or_else(|| s.cvss_v2.clone()));

    let mut url = vec![advisory.advisory_xref.clone().unwrap_or_default()];
    url.extend(advisory.xrefs.iter().cloned());

    let refs = AdvisoryRefs {
        url,
        cve: (!advisory.cves.is_empty()).then(|| advisory.cves.clone()),
        advisory_id: advisory.advisory_id.clone().map(|id| vec![id]),
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    CanonicalRecord {
        vt_params: Vec::new(),
        creation_date,
        last_modification: last_modification.clone(),
        modification_time: last_modification,
        summary: advisory.summary.clone(),
        impact: advisory.impact.clone(),
        affected: advisory.affected.clone(),
        insight: advisory.insight.clone(),
        solution: SOLUTION.to_string(),
        solution_type: SOLUTION_TYPE.to_string(),
        vuldetect: VULDETECT.to_string(),
        qod_type: metadata
            .qod_type
            .clone()
            .unwrap_or_else(|| DEFAULT_QOD_TYPE.to_string()),
        severity_vector,
        filename,
        refs,
        family: metadata.family.clone().unwrap_or(stem),
        name: advisory.title.clone().unwrap_or_default(),
        category: CATEGORY_PACKAGE_ADVISORY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use std::path::PathBuf;

    fn minimal_advisory(oid: &str) -> RawAdvisory {
        RawAdvisory {
            oid: oid.to_string(),
            title: None,
            creation_date: None,
            last_modification: None,
            summary: None,
            impact: None,
            affected: None,
            insight: None,
            severity: None,
            cves: vec![],
            xrefs: vec![],
            advisory_xref: None,
            advisory_id: None,
        }
    }

    fn empty_metadata() -> AdvisoryFile {
        AdvisoryFile {
            advisories: vec![],
            family: None,
            qod_type: None,
        }
    }

    #[test]
    fn test_defaults_for_minimal_advisory() {
        let path = PathBuf::from("/feed/debian-2021.notus");
        let record = normalize(&path, &minimal_advisory("1.2.3"), &empty_metadata());

        assert_eq!(record.creation_date, "0");
        assert_eq!(record.last_modification, "0");
        assert_eq!(record.modification_time, "0");
        assert_eq!(record.severity_vector, None);
        assert_eq!(record.qod_type, "package");
        assert_eq!(record.family, "debian-2021");
        assert_eq!(record.filename, "debian-2021.notus");
        assert_eq!(record.name, "");
        assert_eq!(record.category, "3");
        assert!(record.vt_params.is_empty());
        // The url list is always present, even without any cross-reference.
        assert_eq!(record.refs.url, vec![String::new()]);
        assert_eq!(record.refs.cve, None);
        assert_eq!(record.refs.advisory_id, None);
    }

    #[test]
    fn test_fixed_constants() {
        let path = PathBuf::from("x.notus");
        let record = normalize(&path, &minimal_advisory("1"), &empty_metadata());

        assert_eq!(record.solution, "Please install the updated package(s).");
        assert_eq!(record.solution_type, "VendorFix");
        assert_eq!(
            record.vuldetect,
            "Checks if a vulnerable package version is present on the target host."
        );
    }

    #[test]
    fn test_cvss_v3_preferred_over_v2() {
        let mut advisory = minimal_advisory("1");
        advisory.severity = Some(Severity {
            cvss_v2: Some("AV:N/AC:L/Au:N/C:P/I:P/A:P".to_string()),
            cvss_v3: Some("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H".to_string()),
        });

        let record = normalize(&PathBuf::from("x.notus"), &advisory, &empty_metadata());
        assert_eq!(
            record.severity_vector.as_deref(),
            Some("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H")
        );
    }

    #[test]
    fn test_cvss_v2_fallback() {
        let mut advisory = minimal_advisory("1");
        advisory.severity = Some(Severity {
            cvss_v2: Some("AV:N/AC:L/Au:N/C:P/I:P/A:P".to_string()),
            cvss_v3: None,
        });

        let record = normalize(&PathBuf::from("x.notus"), &advisory, &empty_metadata());
        assert_eq!(
            record.severity_vector.as_deref(),
            Some("AV:N/AC:L/Au:N/C:P/I:P/A:P")
        );
    }

    #[test]
    fn test_refs_assembly() {
        let mut advisory = minimal_advisory("1");
        advisory.advisory_xref = Some("https://vendor.example/dsa-1".to_string());
        advisory.xrefs = vec![
            "https://bugs.example/1".to_string(),
            "https://bugs.example/2".to_string(),
        ];
        advisory.cves = vec!["CVE-2021-0001".to_string(), "CVE-2021-0002".to_string()];
        advisory.advisory_id = Some("DSA-1".to_string());

        let record = normalize(&PathBuf::from("x.notus"), &advisory, &empty_metadata());
        assert_eq!(
            record.refs.url,
            vec![
                "https://vendor.example/dsa-1".to_string(),
                "https://bugs.example/1".to_string(),
                "https://bugs.example/2".to_string(),
            ]
        );
        assert_eq!(
            record.refs.cve,
            Some(vec![
                "CVE-2021-0001".to_string(),
                "CVE-2021-0002".to_string()
            ])
        );
        assert_eq!(record.refs.advisory_id, Some(vec!["DSA-1".to_string()]));
    }

    #[test]
    fn test_metadata_overrides() {
        let metadata = AdvisoryFile {
            advisories: vec![],
            family: Some("Debian".to_string()),
            qod_type: Some("package_unreliable".to_string()),
        };
        let mut advisory = minimal_advisory("1");
        advisory.title = Some("DSA-1: openssl".to_string());
        advisory.creation_date = Some(1_609_459_200);
        advisory.last_modification = Some(1_612_137_600);

        let record = normalize(
            &PathBuf::from("/feed/pkg-advisory-1.notus"),
            &advisory,
            &metadata,
        );
        assert_eq!(record.family, "Debian");
        assert_eq!(record.qod_type, "package_unreliable");
        assert_eq!(record.name, "DSA-1: openssl");
        assert_eq!(record.creation_date, "1609459200");
        assert_eq!(record.last_modification, "1612137600");
        assert_eq!(record.modification_time, "1612137600");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let mut advisory = minimal_advisory("1.2.3.4");
        advisory.cves = vec!["CVE-2021-0001".to_string()];
        let path = PathBuf::from("pkg-advisory-1.notus");

        let a = normalize(&path, &advisory, &empty_metadata());
        let b = normalize(&path, &advisory, &empty_metadata());
        assert_eq!(a, b);
    }
}
