//! Per-user resolved usage metrics.

use serde::Serialize;

use crate::policy::{
    DRIVE_ITEM_COUNT, DRIVE_STORAGE, EMAILS_EXCHANGED, EMAILS_RECEIVED, EMAILS_SENT,
    GMAIL_ENABLED_KEYS, GMAIL_STORAGE,
};
use crate::record::UsageRecord;
use crate::resolver::{Resolution, Source, resolve, resolve_flag};

/// The logical quantities resolved for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMetrics {
    /// Gmail storage used, in MB.
    pub gmail_storage_mb: f64,
    /// Emails received over the report period.
    pub gmail_emails_received: u64,
    /// Emails sent over the report period.
    pub gmail_emails_sent: u64,
    /// Emails exchanged; synthesized from sent and received when absent.
    pub gmail_emails_exchanged: u64,
    /// Whether Gmail is enabled for the user.
    pub gmail_enabled: bool,
    /// Whether any Gmail quantity resolved positive.
    pub has_gmail_data: bool,
    /// Drive storage used, in MB.
    pub drive_storage_mb: f64,
    /// Number of items owned in Drive.
    pub drive_item_count: u64,
    /// Whether Drive storage or item count resolved positive.
    pub has_drive_data: bool,
    /// Gmail plus Drive storage, in MB.
    pub total_storage_mb: f64,
}

impl Default for ResolvedMetrics {
    fn default() -> Self {
        Self {
            gmail_storage_mb: 0.0,
            gmail_emails_received: 0,
            gmail_emails_sent: 0,
            gmail_emails_exchanged: 0,
            gmail_enabled: true,
            has_gmail_data: false,
            drive_storage_mb: 0.0,
            drive_item_count: 0,
            has_drive_data: false,
            total_storage_mb: 0.0,
        }
    }
}

/// Resolved metrics plus the provenance of every quantity.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The metrics.
    pub metrics: ResolvedMetrics,
    /// Quantity name and resolution, in resolution order.
    pub trace: Vec<(&'static str, Resolution)>,
}

impl Resolved {
    /// Look up the resolution of one quantity by policy name.
    pub fn source_of(&self, name: &str) -> Option<&Resolution> {
        self.trace.iter().find(|(n, _)| *n == name).map(|(_, r)| r)
    }
}

/// Resolve every logical quantity for one usage record.
pub fn resolve_metrics(record: &UsageRecord) -> Resolved {
    let gmail_storage = resolve(record, &GMAIL_STORAGE);
    let sent = resolve(record, &EMAILS_SENT);
    let received = resolve(record, &EMAILS_RECEIVED);
    let mut exchanged = resolve(record, &EMAILS_EXCHANGED);
    let drive_storage = resolve(record, &DRIVE_STORAGE);
    let items = resolve(record, &DRIVE_ITEM_COUNT);
    let (gmail_enabled, _) = resolve_flag(record, GMAIL_ENABLED_KEYS, true);

    if exchanged.value <= 0.0 && (sent.value > 0.0 || received.value > 0.0) {
        exchanged = Resolution {
            value: sent.value + received.value,
            source: Source::Derived,
        };
    }

    let metrics = ResolvedMetrics {
        gmail_storage_mb: gmail_storage.value,
        gmail_emails_received: received.as_count(),
        gmail_emails_sent: sent.as_count(),
        gmail_emails_exchanged: exchanged.as_count(),
        gmail_enabled,
        has_gmail_data: [&gmail_storage, &sent, &received, &exchanged]
            .iter()
            .any(|r| r.value > 0.0),
        drive_storage_mb: drive_storage.value,
        drive_item_count: items.as_count(),
        has_drive_data: drive_storage.value > 0.0 || items.value > 0.0,
        total_storage_mb: gmail_storage.value + drive_storage.value,
    };

    Resolved {
        metrics,
        trace: vec![
            (GMAIL_STORAGE.name, gmail_storage),
            (EMAILS_SENT.name, sent),
            (EMAILS_RECEIVED.name, received),
            (EMAILS_EXCHANGED.name, exchanged),
            (DRIVE_STORAGE.name, drive_storage),
            (DRIVE_ITEM_COUNT.name, items),
        ],
    }
}
