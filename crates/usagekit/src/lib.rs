//! # usagekit
//!
//! Pure Rust resolver for Google Workspace usage report parameters.
//!
//! The Reports API returns per-user usage as a flat list of named
//! parameters whose names drift between API revisions and report
//! variants. This crate turns such a list into a small set of logical
//! quantities without touching the network or the filesystem:
//!
//! - **Record**: an insertion-ordered [`UsageRecord`] built from report parameters
//! - **Policies**: ordered candidate key lists per quantity ([`policy`])
//! - **Resolver**: direct keys, then component sums, then a substring scan ([`resolve`])
//! - **Metrics**: the combined [`ResolvedMetrics`] for one user
//!
//! ## Example
//!
//! ```
//! use usagekit::{MetricValue, UsageRecord, resolve_metrics};
//!
//! let mut record = UsageRecord::new();
//! record.insert("accounts:gmail_used_quota_in_mb", MetricValue::Int(512));
//! record.insert("gmail:num_emails_sent", MetricValue::Int(5));
//! record.insert("gmail:num_emails_received", MetricValue::Str("7".into()));
//!
//! let resolved = resolve_metrics(&record);
//! assert_eq!(resolved.metrics.gmail_storage_mb, 512.0);
//! assert_eq!(resolved.metrics.gmail_emails_exchanged, 12);
//! assert_eq!(resolved.metrics.total_storage_mb, 512.0);
//! ```
//!
//! ## Zero versus absent
//!
//! Every stage only accepts values strictly greater than zero, so a key
//! that reports zero usage is indistinguishable from a missing key and the
//! resolver keeps looking. Callers that need to tell the two apart should
//! inspect the [`UsageRecord`] directly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod metrics;
pub mod policy;
pub mod record;
pub mod resolver;

pub use metrics::{Resolved, ResolvedMetrics, resolve_metrics};
pub use policy::{Kind, Policy};
pub use record::{MetricValue, UsageRecord};
pub use resolver::{BYTES_PER_MB, Resolution, Source, normalize_storage, resolve, resolve_flag};
