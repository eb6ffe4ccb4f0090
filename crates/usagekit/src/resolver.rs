//! The staged resolver.
//!
//! For a given [`Policy`] the resolver tries, in order:
//!
//! 1. each direct key, returning the first value greater than zero
//! 2. the sum of every parseable component key, if greater than zero
//! 3. the first key in record order whose name contains a marker and the
//!    policy domain, with a value greater than zero
//!
//! and otherwise reports [`Source::Missing`] with a value of zero.

use crate::policy::{Kind, Policy};
use crate::record::{MetricValue, UsageRecord};

/// Bytes in one megabyte (2^20).
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Storage values above this are assumed to be bytes whatever the key says.
pub const BYTES_THRESHOLD: f64 = 1_000_000.0;

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A direct key.
    Direct(String),
    /// Sum of component keys, with each parsed component.
    Components(Vec<(String, f64)>),
    /// A key found by the substring scan.
    Fallback(String),
    /// Computed from other resolved quantities.
    Derived,
    /// Nothing matched.
    Missing,
}

/// A resolved quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Resolved value; zero when missing.
    pub value: f64,
    /// Provenance of the value.
    pub source: Source,
}

impl Resolution {
    fn missing() -> Self {
        Self {
            value: 0.0,
            source: Source::Missing,
        }
    }

    /// Whether anything matched.
    pub fn is_found(&self) -> bool {
        !matches!(self.source, Source::Missing)
    }

    /// The value as a whole count.
    pub fn as_count(&self) -> u64 {
        if self.value > 0.0 { self.value as u64 } else { 0 }
    }
}

/// Convert a storage value to MB when the key or magnitude says it is bytes.
pub fn normalize_storage(key: &str, value: f64) -> f64 {
    if key.to_lowercase().contains("bytes") || value > BYTES_THRESHOLD {
        value / BYTES_PER_MB
    } else {
        value
    }
}

fn parse(policy: &Policy, key: &str, value: &MetricValue) -> Option<f64> {
    match policy.kind {
        Kind::Count => value.as_int().map(|i| i as f64),
        Kind::Storage => value.as_float().map(|v| {
            if policy.megabyte_keys.contains(&key) {
                v
            } else {
                normalize_storage(key, v)
            }
        }),
    }
}

fn is_scan_candidate(policy: &Policy, domain: &str, name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains(domain) && policy.markers.iter().any(|m| lower.contains(m))
}

/// Resolve one quantity from a record.
pub fn resolve(record: &UsageRecord, policy: &Policy) -> Resolution {
    for key in policy.direct {
        if let Some(value) = record.get(key).and_then(|v| parse(policy, key, v)) {
            if value > 0.0 {
                return Resolution {
                    value,
                    source: Source::Direct((*key).to_string()),
                };
            }
        }
    }

    let mut parts = Vec::new();
    let mut total = 0.0;
    for key in policy.components {
        if let Some(value) = record.get(key).and_then(|v| parse(policy, key, v)) {
            parts.push(((*key).to_string(), value));
            total += value;
        }
    }
    if total > 0.0 {
        return Resolution {
            value: total,
            source: Source::Components(parts),
        };
    }

    if let Some(domain) = policy.domain {
        for (name, value) in record.iter() {
            if !is_scan_candidate(policy, domain, name) {
                continue;
            }
            if let Some(value) = parse(policy, name, value) {
                if value > 0.0 {
                    return Resolution {
                        value,
                        source: Source::Fallback(name.to_string()),
                    };
                }
            }
        }
    }

    Resolution::missing()
}

/// Resolve a boolean flag from the first present, parseable key.
///
/// Returns the key that supplied the value, or `None` when the default was
/// used.
pub fn resolve_flag(record: &UsageRecord, keys: &[&str], default: bool) -> (bool, Option<String>) {
    keys.iter()
        .find_map(|key| {
            record
                .get(key)
                .and_then(MetricValue::as_bool)
                .map(|b| (b, Some((*key).to_string())))
        })
        .unwrap_or((default, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{DRIVE_ITEM_COUNT, DRIVE_STORAGE, EMAILS_SENT, GMAIL_ENABLED_KEYS, GMAIL_STORAGE};

    fn record(entries: &[(&str, MetricValue)]) -> UsageRecord {
        entries.iter().cloned().collect()
    }

    fn int(v: i64) -> MetricValue {
        MetricValue::Int(v)
    }

    fn s(v: &str) -> MetricValue {
        MetricValue::Str(v.to_string())
    }

    #[test]
    fn test_direct_key_wins_over_everything() {
        let rec = record(&[
            ("drive:num_owned_google_documents_created", int(40)),
            ("drive_other_items", int(99)),
            ("num_items", int(7)),
        ]);
        let res = resolve(&rec, &DRIVE_ITEM_COUNT);
        assert_eq!(res.value, 7.0);
        assert_eq!(res.source, Source::Direct("num_items".into()));
    }

    #[test]
    fn test_direct_keys_follow_list_order_not_magnitude() {
        let rec = record(&[("num_files", int(1000)), ("num_docs", int(3))]);
        let res = resolve(&rec, &DRIVE_ITEM_COUNT);
        assert_eq!(res.value, 3.0);
        assert_eq!(res.source, Source::Direct("num_docs".into()));
    }

    #[test]
    fn test_zero_direct_key_does_not_block_fallback() {
        let rec = record(&[
            ("num_items", int(0)),
            ("drive:num_owned_google_documents_created", int(4)),
            ("docs:num_owned_google_forms_created", s("6")),
        ]);
        let res = resolve(&rec, &DRIVE_ITEM_COUNT);
        assert_eq!(res.value, 10.0);
        match res.source {
            Source::Components(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[0], ("drive:num_owned_google_documents_created".into(), 4.0));
                assert_eq!(parts[1], ("docs:num_owned_google_forms_created".into(), 6.0));
            }
            other => panic!("Expected components, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_direct_key_is_skipped() {
        let rec = record(&[("num_items", s("many")), ("num_docs", int(2))]);
        let res = resolve(&rec, &DRIVE_ITEM_COUNT);
        assert_eq!(res.value, 2.0);
    }

    #[test]
    fn test_components_skip_unparseable_values() {
        let rec = record(&[
            ("drive:num_owned_google_documents_created", s("n/a")),
            ("drive:num_owned_google_spreadsheets_created", int(5)),
            ("drive:num_owned_other_types_created", MetricValue::Bool(true)),
        ]);
        let res = resolve(&rec, &DRIVE_ITEM_COUNT);
        assert_eq!(res.value, 5.0);
    }

    #[test]
    fn test_fallback_scan_requires_marker_and_domain() {
        let rec = record(&[
            ("gmail:items_count", int(50)),
            ("drive:owned_size", int(70)),
            ("drive:num_shared_items", int(0)),
            ("drive:num_shared_items_total", int(12)),
            ("drive:num_docs_viewed", int(30)),
        ]);
        let res = resolve(&rec, &DRIVE_ITEM_COUNT);
        assert_eq!(res.value, 12.0);
        assert_eq!(res.source, Source::Fallback("drive:num_shared_items_total".into()));
    }

    #[test]
    fn test_fallback_scan_is_case_insensitive() {
        let rec = record(&[("Drive:Total_Item_COUNT", int(9))]);
        let res = resolve(&rec, &DRIVE_ITEM_COUNT);
        assert_eq!(res.value, 9.0);
    }

    #[test]
    fn test_missing_resolves_to_zero() {
        let rec = record(&[("accounts:last_login_time", s("2024-01-01"))]);
        let res = resolve(&rec, &DRIVE_ITEM_COUNT);
        assert_eq!(res.value, 0.0);
        assert!(!res.is_found());
        assert_eq!(res.as_count(), 0);
    }

    #[test]
    fn test_megabyte_key_is_not_converted() {
        let rec = record(&[("accounts:drive_used_quota_in_mb", int(2_500_000))]);
        let res = resolve(&rec, &DRIVE_STORAGE);
        assert_eq!(res.value, 2_500_000.0);
    }

    #[test]
    fn test_bytes_key_is_converted() {
        let rec = record(&[("drive_storage_bytes_used", int(5 * 1_048_576))]);
        let res = resolve(&rec, &DRIVE_STORAGE);
        assert_eq!(res.value, 5.0);

        let rec = record(&[("gmail_storage_bytes_used", s("524288"))]);
        let res = resolve(&rec, &GMAIL_STORAGE);
        assert_eq!(res.value, 0.5);
    }

    #[test]
    fn test_large_value_is_converted_regardless_of_key() {
        let rec = record(&[("quota_used", int(3 * 1_048_576))]);
        let res = resolve(&rec, &DRIVE_STORAGE);
        assert_eq!(res.value, 3.0);
    }

    #[test]
    fn test_small_value_without_bytes_marker_is_kept() {
        let rec = record(&[("used_quota_in_mb", s("1024.5"))]);
        let res = resolve(&rec, &DRIVE_STORAGE);
        assert_eq!(res.value, 1024.5);
    }

    #[test]
    fn test_storage_fallback_converts_before_gate() {
        let rec = record(&[
            ("gmail:attachment_bytes", int(2 * 1_048_576)),
            ("drive:quota_total_bytes", int(1_048_576)),
        ]);
        let res = resolve(&rec, &DRIVE_STORAGE);
        assert_eq!(res.value, 1.0);
        assert_eq!(res.source, Source::Fallback("drive:quota_total_bytes".into()));
    }

    #[test]
    fn test_normalize_storage() {
        assert_eq!(normalize_storage("x_bytes", 1_048_576.0), 1.0);
        assert_eq!(normalize_storage("X_BYTES_USED", 2_097_152.0), 2.0);
        assert_eq!(normalize_storage("used_mb", 999_999.0), 999_999.0);
        assert_eq!(normalize_storage("used_mb", 2_097_152.0), 2.0);
    }

    #[test]
    fn test_count_policy_has_no_scan() {
        let rec = record(&[("gmail:sent_count_total", int(4))]);
        let res = resolve(&rec, &EMAILS_SENT);
        assert!(!res.is_found());
    }

    #[test]
    fn test_resolve_flag() {
        let rec = record(&[("gmail_enabled", s("maybe")), ("has_gmail", MetricValue::Bool(false))]);
        let (enabled, key) = resolve_flag(&rec, GMAIL_ENABLED_KEYS, true);
        assert!(!enabled);
        assert_eq!(key.as_deref(), Some("has_gmail"));

        let (enabled, key) = resolve_flag(&UsageRecord::new(), GMAIL_ENABLED_KEYS, true);
        assert!(enabled);
        assert!(key.is_none());
    }
}
