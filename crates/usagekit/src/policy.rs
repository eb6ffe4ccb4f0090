//! Candidate key lists for each logical quantity.
//!
//! The lists are data, not code: adding a newly observed key spelling means
//! editing a constant here and nothing else.

/// How a quantity's values are parsed and normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Integer counts (items, messages). No unit conversion.
    Count,
    /// Storage in megabytes. Byte-valued keys are converted.
    Storage,
}

/// Resolution policy for one logical quantity.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    /// Short name used in diagnostics.
    pub name: &'static str,
    /// Value kind.
    pub kind: Kind,
    /// Keys that carry the quantity directly, in preference order.
    pub direct: &'static [&'static str],
    /// Keys already reported in megabytes; exempt from unit conversion.
    pub megabyte_keys: &'static [&'static str],
    /// Sub-category keys summed when no direct key matches.
    pub components: &'static [&'static str],
    /// Substrings that mark a key as a candidate in the last-resort scan.
    pub markers: &'static [&'static str],
    /// Substring every last-resort candidate must also contain.
    /// `None` disables the scan.
    pub domain: Option<&'static str>,
}

/// Total number of items a user owns in Drive.
pub const DRIVE_ITEM_COUNT: Policy = Policy {
    name: "drive_item_count",
    kind: Kind::Count,
    direct: &[
        "num_items",
        "num_docs",
        "num_sheets",
        "num_slides",
        "num_drawings",
        "num_forms",
        "num_files",
        "num_folders",
        "drive_num_items",
        "doc_count",
        "drive_file_count",
        "total_doc_count",
    ],
    megabyte_keys: &[],
    components: &[
        "drive:num_owned_google_documents_created",
        "drive:num_owned_google_spreadsheets_created",
        "drive:num_owned_google_presentations_created",
        "drive:num_owned_google_drawings_created",
        "drive:num_owned_google_forms_created",
        "drive:num_owned_other_types_created",
        "docs:num_owned_google_documents_created",
        "docs:num_owned_google_spreadsheets_created",
        "docs:num_owned_google_presentations_created",
        "docs:num_owned_google_drawings_created",
        "docs:num_owned_google_forms_created",
        "docs:num_owned_other_types_created",
    ],
    markers: &["count", "items", "docs"],
    domain: Some("drive"),
};

/// Drive storage used, in MB.
pub const DRIVE_STORAGE: Policy = Policy {
    name: "drive_storage_mb",
    kind: Kind::Storage,
    direct: &[
        "accounts:drive_used_quota_in_mb",
        "drive_storage_bytes_used",
        "storage_quota_bytes",
        "used_quota_in_mb",
        "quota_used",
        "storage_quota_mb",
        "drive_storage_used",
        "total_storage_used",
    ],
    megabyte_keys: &["accounts:drive_used_quota_in_mb"],
    components: &[],
    markers: &["storage", "quota", "byte"],
    domain: Some("drive"),
};

/// Gmail storage used, in MB.
pub const GMAIL_STORAGE: Policy = Policy {
    name: "gmail_storage_mb",
    kind: Kind::Storage,
    direct: &[
        "accounts:gmail_used_quota_in_mb",
        "gmail_used_quota_in_mb",
        "gmail_storage_used",
        "gmail_quota_used",
        "gmail_storage_bytes_used",
    ],
    megabyte_keys: &["accounts:gmail_used_quota_in_mb"],
    components: &[],
    markers: &["storage", "quota", "byte"],
    domain: Some("gmail"),
};

/// Emails sent.
pub const EMAILS_SENT: Policy = Policy {
    name: "gmail_emails_sent",
    kind: Kind::Count,
    direct: &[
        "gmail:num_emails_sent",
        "num_emails_sent",
        "emails_sent",
        "sent_mail_count",
    ],
    megabyte_keys: &[],
    components: &[],
    markers: &[],
    domain: None,
};

/// Emails received.
pub const EMAILS_RECEIVED: Policy = Policy {
    name: "gmail_emails_received",
    kind: Kind::Count,
    direct: &[
        "gmail:num_emails_received",
        "num_emails_received",
        "emails_received",
        "received_mail_count",
    ],
    megabyte_keys: &[],
    components: &[],
    markers: &[],
    domain: None,
};

/// Emails exchanged (sent plus received, when reported).
pub const EMAILS_EXCHANGED: Policy = Policy {
    name: "gmail_emails_exchanged",
    kind: Kind::Count,
    direct: &[
        "gmail:num_emails_exchanged",
        "num_emails_exchanged",
        "emails_exchanged",
        "total_mail_count",
    ],
    megabyte_keys: &[],
    components: &[],
    markers: &[],
    domain: None,
};

/// Keys that report whether Gmail is enabled, in preference order.
pub const GMAIL_ENABLED_KEYS: &[&str] = &[
    "gmail:is_gmail_enabled",
    "is_gmail_enabled",
    "gmail_enabled",
    "has_gmail",
];
