//! OAuth scopes and the scope set each operation declares.

/// Read users in the directory.
pub const DIRECTORY_USER_READONLY: &str =
    "https://www.googleapis.com/auth/admin.directory.user.readonly";
/// Read groups in the directory.
pub const DIRECTORY_GROUP_READONLY: &str =
    "https://www.googleapis.com/auth/admin.directory.group.readonly";
/// Read group memberships.
pub const DIRECTORY_GROUP_MEMBER_READONLY: &str =
    "https://www.googleapis.com/auth/admin.directory.group.member.readonly";
/// Read buildings and calendar resources.
pub const DIRECTORY_RESOURCE_CALENDAR_READONLY: &str =
    "https://www.googleapis.com/auth/admin.directory.resource.calendar.readonly";
/// Read usage reports.
pub const REPORTS_USAGE_READONLY: &str =
    "https://www.googleapis.com/auth/admin.reports.usage.readonly";
/// Read audit activity reports.
pub const REPORTS_AUDIT_READONLY: &str =
    "https://www.googleapis.com/auth/admin.reports.audit.readonly";
/// Full Drive access, needed for shared-drive administration.
pub const DRIVE: &str = "https://www.googleapis.com/auth/drive";
/// Read-only Drive access.
pub const DRIVE_READONLY: &str = "https://www.googleapis.com/auth/drive.readonly";
/// Read-only Drive metadata.
pub const DRIVE_METADATA_READONLY: &str =
    "https://www.googleapis.com/auth/drive.metadata.readonly";
/// Basic Gmail settings (IMAP, POP, auto-forwarding).
pub const GMAIL_SETTINGS_BASIC: &str = "https://www.googleapis.com/auth/gmail.settings.basic";
/// Sensitive Gmail settings (delegates, forwarding addresses).
pub const GMAIL_SETTINGS_SHARING: &str = "https://www.googleapis.com/auth/gmail.settings.sharing";

/// Usage statistics.
pub const USAGE: &[&str] = &[DIRECTORY_USER_READONLY, REPORTS_USAGE_READONLY];

/// Directory export.
pub const DIRECTORY: &[&str] = &[
    DIRECTORY_USER_READONLY,
    DIRECTORY_GROUP_READONLY,
    DIRECTORY_GROUP_MEMBER_READONLY,
    DIRECTORY_RESOURCE_CALENDAR_READONLY,
];

/// Shared-drive export, drive lookup and grants.
pub const SHARED_DRIVES: &[&str] = &[DRIVE, DRIVE_READONLY];

/// Mailbox permissions export.
pub const MAILBOX: &[&str] = &[
    DIRECTORY_USER_READONLY,
    GMAIL_SETTINGS_BASIC,
    GMAIL_SETTINGS_SHARING,
];

/// Shared-drive discovery.
pub const FIND_DRIVES: &[&str] = &[
    DRIVE,
    DRIVE_READONLY,
    REPORTS_AUDIT_READONLY,
    REPORTS_USAGE_READONLY,
];

/// Every scope any operation asks for, deduplicated, in a stable order.
pub fn all() -> Vec<&'static str> {
    let mut scopes: Vec<&'static str> = Vec::new();
    for set in [USAGE, DIRECTORY, SHARED_DRIVES, MAILBOX, FIND_DRIVES] {
        for scope in set {
            if !scopes.contains(scope) {
                scopes.push(scope);
            }
        }
    }
    if !scopes.contains(&DRIVE_METADATA_READONLY) {
        scopes.push(DRIVE_METADATA_READONLY);
    }
    scopes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_deduplicated() {
        let scopes = all();
        let mut sorted = scopes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), scopes.len());
        assert!(scopes.contains(&GMAIL_SETTINGS_SHARING));
        assert!(scopes.contains(&DRIVE_METADATA_READONLY));
    }

    #[test]
    fn test_scopes_are_urls() {
        for scope in all() {
            assert!(scope.starts_with("https://www.googleapis.com/auth/"));
        }
    }
}
