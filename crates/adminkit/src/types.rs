//! Typed views of API resources.
//!
//! Every field is optional on the wire: absent fields take their default
//! instead of failing the whole page, and int64 fields are accepted either
//! as JSON strings (the Google convention) or as numbers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// MIME type of Drive folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Accept an int64 as a string, a number, or null.
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// =============================================================================
// Paging
// =============================================================================

/// Page size and continuation token for one list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum items per page.
    pub page_size: u32,
    /// Token from the previous page, if any.
    pub page_token: Option<String>,
}

impl PageRequest {
    /// First page with the given size.
    #[must_use]
    pub fn first(page_size: u32) -> Self {
        Self {
            page_size,
            page_token: None,
        }
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }
}

// =============================================================================
// Directory
// =============================================================================

/// A user's name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserName {
    /// Full name.
    pub full_name: String,
    /// Given name.
    pub given_name: String,
    /// Family name.
    pub family_name: String,
}

/// A directory user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    /// Unique id.
    pub id: String,
    /// Primary email address.
    pub primary_email: String,
    /// Name parts.
    pub name: UserName,
    /// Whether the account is suspended.
    pub suspended: bool,
    /// Super administrator.
    pub is_admin: bool,
    /// Delegated administrator.
    pub is_delegated_admin: bool,
    /// Enrolled in 2-step verification.
    #[serde(rename = "isEnrolledIn2Sv")]
    pub is_enrolled_in_2sv: bool,
    /// 2-step verification enforced.
    #[serde(rename = "isEnforcedIn2Sv")]
    pub is_enforced_in_2sv: bool,
    /// Organizational unit path.
    pub org_unit_path: String,
}

/// A directory group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Group {
    /// Unique id.
    pub id: String,
    /// Group email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Created by an administrator rather than a user.
    pub admin_created: bool,
    /// Number of direct members, when reported.
    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub direct_members_count: Option<i64>,
}

/// A group member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Member {
    /// Unique id.
    pub id: String,
    /// Member email address.
    pub email: String,
    /// OWNER, MANAGER or MEMBER.
    pub role: String,
    /// USER, GROUP, CUSTOMER or EXTERNAL.
    #[serde(rename = "type")]
    pub member_type: String,
    /// Membership status.
    pub status: String,
}

/// A building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Building {
    /// Resource kind.
    pub kind: String,
    /// ETag.
    pub etags: String,
    /// Building id.
    pub building_id: String,
    /// Building name.
    pub building_name: String,
    /// Description.
    pub description: String,
    /// Floor names, bottom to top.
    pub floor_names: Vec<String>,
}

/// A calendar resource feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    /// Feature name.
    pub name: String,
}

/// A feature attached to a calendar resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureInstance {
    /// The feature.
    pub feature: Feature,
}

/// A calendar resource (room or equipment).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarResource {
    /// Resource id.
    pub resource_id: String,
    /// Resource name.
    pub resource_name: String,
    /// Calendar email of the resource.
    pub resource_email: String,
    /// Free-form type such as `Conference Room`.
    pub resource_type: String,
    /// Building id.
    pub building_id: String,
    /// Floor name.
    pub floor_name: String,
    /// Capacity, when set.
    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    /// Attached features.
    pub feature_instances: Vec<FeatureInstance>,
}

impl CalendarResource {
    /// Resource types that count as rooms.
    pub const ROOM_TYPES: [&'static str; 3] = ["Conference Room", "Meeting Space", "Room"];

    /// Whether this resource is a room rather than equipment.
    #[must_use]
    pub fn is_room(&self) -> bool {
        Self::ROOM_TYPES.contains(&self.resource_type.as_str())
    }

    /// Feature names, in order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.feature_instances
            .iter()
            .map(|f| f.feature.name.as_str())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

// =============================================================================
// Reports
// =============================================================================

/// One entry of a user usage report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageReportEntry {
    /// Report date.
    pub date: String,
    /// Entity the report is about.
    pub entity: Value,
    /// Raw parameter objects (`name` plus a typed value).
    pub parameters: Vec<Value>,
}

/// A user usage report response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UsageReport {
    /// Report entries; normally one per user and date.
    pub usage_reports: Vec<UsageReportEntry>,
    /// Warnings, such as data not yet available for the date.
    pub warnings: Vec<Value>,
}

impl UsageReport {
    /// Every parameter across all entries, in report order.
    pub fn parameters(&self) -> impl Iterator<Item = &Value> {
        self.usage_reports.iter().flat_map(|r| r.parameters.iter())
    }
}

/// A parameter of an audit activity event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityParameter {
    /// Parameter name.
    pub name: String,
    /// String value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// An audit activity event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityEvent {
    /// Event name.
    pub name: String,
    /// Event parameters.
    pub parameters: Vec<ActivityParameter>,
}

/// An audit activity record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    /// Events in this activity.
    pub events: Vec<ActivityEvent>,
}

impl Activity {
    /// Shared-drive ids mentioned by `driveId` or `teamDriveId` parameters.
    pub fn drive_ids(&self) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .flat_map(|e| e.parameters.iter())
            .filter(|p| p.name == "driveId" || p.name == "teamDriveId")
            .filter_map(|p| p.value.as_deref())
            .filter(|v| !v.is_empty() && *v != "null")
    }
}

// =============================================================================
// Drive
// =============================================================================

/// The authenticated Drive user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriveUser {
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email_address: String,
}

/// Drive storage quota.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageQuota {
    /// Limit in bytes; absent for unlimited.
    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Usage in bytes.
    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub usage: Option<i64>,
}

/// Result of `about.get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct About {
    /// Authenticated user.
    pub user: DriveUser,
    /// Storage quota.
    pub storage_quota: StorageQuota,
}

/// A shared drive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SharedDrive {
    /// Drive id.
    pub id: String,
    /// Drive name.
    pub name: String,
    /// RFC 3339 creation time.
    pub created_time: String,
    /// Hidden from the default view.
    pub hidden: bool,
    /// Restriction flags by name.
    pub restrictions: Map<String, Value>,
}

impl SharedDrive {
    /// Restrictions as `name: value` pairs joined with `"; "`.
    #[must_use]
    pub fn restrictions_summary(&self) -> String {
        self.restrictions
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}: {}", k, s),
                other => format!("{}: {}", k, other),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A permission on a file or shared drive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Permission {
    /// Permission id.
    pub id: String,
    /// user, group, domain or anyone.
    #[serde(rename = "type")]
    pub permission_type: String,
    /// Grantee email address.
    pub email_address: String,
    /// Role granted.
    pub role: String,
    /// Grantee display name.
    pub display_name: String,
    /// Domain, for domain permissions.
    pub domain: String,
    /// Expiration time, if any.
    pub expiration_time: String,
    /// Whether the grantee account was deleted.
    pub deleted: bool,
    /// Pending ownership transfer.
    pub pending_owner: bool,
}

/// Body of a permission create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPermission {
    /// Grantee type.
    #[serde(rename = "type")]
    pub permission_type: String,
    /// Role to grant.
    pub role: String,
    /// Grantee email address.
    pub email_address: String,
}

impl NewPermission {
    /// A user permission.
    pub fn user(email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            permission_type: "user".to_string(),
            role: role.into(),
            email_address: email.into(),
        }
    }
}

/// A file owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Owner {
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email_address: String,
}

/// A Drive file or folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct File {
    /// File id.
    pub id: String,
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Shared drive the file lives in, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    /// Parent folder ids.
    pub parents: Vec<String>,
    /// Owners (empty for shared-drive files).
    pub owners: Vec<Owner>,
    /// Bytes counted against quota.
    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub quota_bytes_used: Option<i64>,
}

impl File {
    /// Whether this is a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Parameters of a `files.list` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    /// Search query (`q`).
    pub q: Option<String>,
    /// Restrict to one shared drive (`corpora=drive`).
    pub drive_id: Option<String>,
    /// Include items from every drive the caller can see.
    pub all_drives: bool,
}

impl FileQuery {
    /// A search across all drives.
    pub fn search(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            drive_id: None,
            all_drives: true,
        }
    }

    /// Non-trashed items of one shared drive.
    pub fn in_drive(drive_id: impl Into<String>) -> Self {
        Self {
            q: Some("trashed=false".to_string()),
            drive_id: Some(drive_id.into()),
            all_drives: true,
        }
    }
}

// =============================================================================
// Gmail settings
// =============================================================================

/// A mailbox delegate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Delegate {
    /// Delegate email address.
    pub delegate_email: String,
    /// Verification status.
    pub verification_status: String,
}

/// A registered forwarding address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForwardingAddress {
    /// Forwarding destination.
    pub forwarding_email: String,
    /// Verification status.
    pub verification_status: String,
}

/// Auto-forwarding setting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoForwarding {
    /// Whether all incoming mail is forwarded.
    pub enabled: bool,
    /// Destination address.
    pub email_address: String,
    /// What happens to the original message.
    pub disposition: String,
}

/// IMAP setting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImapSettings {
    /// Whether IMAP is enabled.
    pub enabled: bool,
}

/// POP setting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PopSettings {
    /// `disabled`, `allMail` or `fromNowOn`.
    pub access_window: String,
    /// What happens to retrieved messages.
    pub disposition: String,
}

impl PopSettings {
    /// Whether any POP access window is open.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.access_window.is_empty() && !self.access_window.eq_ignore_ascii_case("disabled")
    }
}
