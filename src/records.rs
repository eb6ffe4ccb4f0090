//! Export rows, one struct per CSV file.
//!
//! Column names and order come from the serde field names and order.

use adminkit::types::{Building, CalendarResource, Group, Member, Permission, SharedDrive, User};
use serde::Serialize;
use usagekit::{BYTES_PER_MB, ResolvedMetrics};

/// Where the usage figures came from.
pub const REPORTS_API_SOURCE: &str = "reports_api";

// ============================================================================
// Usage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Gmail_Storage_MB")]
    pub gmail_storage_mb: f64,
    #[serde(rename = "Gmail_Emails_Received")]
    pub gmail_emails_received: u64,
    #[serde(rename = "Gmail_Emails_Sent")]
    pub gmail_emails_sent: u64,
    #[serde(rename = "Gmail_Emails_Exchanged")]
    pub gmail_emails_exchanged: u64,
    #[serde(rename = "Is_Gmail_Enabled")]
    pub is_gmail_enabled: bool,
    #[serde(rename = "Has_Gmail_Data")]
    pub has_gmail_data: bool,
    #[serde(rename = "Drive_Storage_MB")]
    pub drive_storage_mb: f64,
    #[serde(rename = "Drive_Item_Count")]
    pub drive_item_count: u64,
    #[serde(rename = "Has_Drive_Data")]
    pub has_drive_data: bool,
    #[serde(rename = "Total_Storage_MB")]
    pub total_storage_mb: f64,
    #[serde(rename = "Parameter_Source")]
    pub parameter_source: String,
}

impl UsageRow {
    pub fn new(email: &str, metrics: &ResolvedMetrics) -> Self {
        Self {
            email: email.to_string(),
            gmail_storage_mb: metrics.gmail_storage_mb,
            gmail_emails_received: metrics.gmail_emails_received,
            gmail_emails_sent: metrics.gmail_emails_sent,
            gmail_emails_exchanged: metrics.gmail_emails_exchanged,
            is_gmail_enabled: metrics.gmail_enabled,
            has_gmail_data: metrics.has_gmail_data,
            drive_storage_mb: metrics.drive_storage_mb,
            drive_item_count: metrics.drive_item_count,
            has_drive_data: metrics.has_drive_data,
            total_storage_mb: metrics.total_storage_mb,
            parameter_source: REPORTS_API_SOURCE.to_string(),
        }
    }
}

// ============================================================================
// Directory
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRow {
    #[serde(rename = "Group ID")]
    pub id: String,
    #[serde(rename = "Group Email")]
    pub email: String,
    #[serde(rename = "Group Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Admin Created")]
    pub admin_created: bool,
    #[serde(rename = "Direct Members Count")]
    pub direct_members_count: i64,
    #[serde(rename = "Member Count")]
    pub member_count: i64,
}

impl From<&Group> for GroupRow {
    fn from(group: &Group) -> Self {
        let count = group.direct_members_count.unwrap_or(0);
        Self {
            id: group.id.clone(),
            email: group.email.clone(),
            name: group.name.clone(),
            description: group.description.clone(),
            admin_created: group.admin_created,
            direct_members_count: count,
            member_count: count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipRow {
    #[serde(rename = "Group ID")]
    pub group_id: String,
    #[serde(rename = "Group Email")]
    pub group_email: String,
    #[serde(rename = "Group Name")]
    pub group_name: String,
    #[serde(rename = "Member ID")]
    pub member_id: String,
    #[serde(rename = "Member Email")]
    pub member_email: String,
    #[serde(rename = "Member Role")]
    pub member_role: String,
    #[serde(rename = "Member Type")]
    pub member_type: String,
    #[serde(rename = "Member Status")]
    pub member_status: String,
}

impl MembershipRow {
    pub fn new(group: &Group, member: &Member) -> Self {
        Self {
            group_id: group.id.clone(),
            group_email: group.email.clone(),
            group_name: group.name.clone(),
            member_id: member.id.clone(),
            member_email: member.email.clone(),
            member_role: member.role.clone(),
            member_type: member.member_type.clone(),
            member_status: member.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingRow {
    pub kind: String,
    pub etags: String,
    #[serde(rename = "buildingId")]
    pub building_id: String,
    #[serde(rename = "buildingName")]
    pub building_name: String,
    pub description: String,
    #[serde(rename = "floorNames")]
    pub floor_names: String,
}

impl From<&Building> for BuildingRow {
    fn from(b: &Building) -> Self {
        Self {
            kind: b.kind.clone(),
            etags: b.etags.clone(),
            building_id: b.building_id.clone(),
            building_name: b.building_name.clone(),
            description: b.description.clone(),
            floor_names: b.floor_names.join(","),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomRow {
    #[serde(rename = "Resource ID")]
    pub resource_id: String,
    #[serde(rename = "Resource Name")]
    pub resource_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Building ID")]
    pub building_id: String,
    #[serde(rename = "Floor Name")]
    pub floor_name: String,
    #[serde(rename = "Capacity")]
    pub capacity: Option<i64>,
    #[serde(rename = "Resource Type")]
    pub resource_type: String,
    #[serde(rename = "Features")]
    pub features: String,
}

impl From<&CalendarResource> for RoomRow {
    fn from(r: &CalendarResource) -> Self {
        Self {
            resource_id: r.resource_id.clone(),
            resource_name: r.resource_name.clone(),
            email: r.resource_email.clone(),
            building_id: r.building_id.clone(),
            floor_name: r.floor_name.clone(),
            capacity: r.capacity,
            resource_type: r.resource_type.clone(),
            features: r.feature_names().join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipmentRow {
    #[serde(rename = "Resource ID")]
    pub resource_id: String,
    #[serde(rename = "Resource Name")]
    pub resource_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Resource Type")]
    pub resource_type: String,
    #[serde(rename = "Features")]
    pub features: String,
}

impl From<&CalendarResource> for EquipmentRow {
    fn from(r: &CalendarResource) -> Self {
        Self {
            resource_id: r.resource_id.clone(),
            resource_name: r.resource_name.clone(),
            email: r.resource_email.clone(),
            resource_type: r.resource_type.clone(),
            features: r.feature_names().join(", "),
        }
    }
}

// ============================================================================
// Shared drives
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveRow {
    #[serde(rename = "Drive ID")]
    pub id: String,
    #[serde(rename = "Drive Name")]
    pub name: String,
    #[serde(rename = "Created Time")]
    pub created_time: String,
    #[serde(rename = "Hidden")]
    pub hidden: bool,
    #[serde(rename = "Restrictions")]
    pub restrictions: String,
}

impl From<&SharedDrive> for DriveRow {
    fn from(d: &SharedDrive) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            created_time: d.created_time.clone(),
            hidden: d.hidden,
            restrictions: d.restrictions_summary(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRow {
    #[serde(rename = "Drive ID")]
    pub drive_id: String,
    #[serde(rename = "Drive Name")]
    pub drive_name: String,
    #[serde(rename = "Permission ID")]
    pub permission_id: String,
    #[serde(rename = "Type")]
    pub permission_type: String,
    #[serde(rename = "Email Address")]
    pub email_address: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Display Name")]
    pub display_name: String,
    #[serde(rename = "Domain")]
    pub domain: String,
    #[serde(rename = "Expiration Time")]
    pub expiration_time: String,
    #[serde(rename = "Deleted")]
    pub deleted: bool,
    #[serde(rename = "Pending Owner")]
    pub pending_owner: bool,
}

impl PermissionRow {
    pub fn new(drive: &SharedDrive, p: &Permission) -> Self {
        Self {
            drive_id: drive.id.clone(),
            drive_name: drive.name.clone(),
            permission_id: p.id.clone(),
            permission_type: p.permission_type.clone(),
            email_address: p.email_address.clone(),
            role: p.role.clone(),
            display_name: p.display_name.clone(),
            domain: p.domain.clone(),
            expiration_time: p.expiration_time.clone(),
            deleted: p.deleted,
            pending_owner: p.pending_owner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveStorageRow {
    #[serde(rename = "Drive ID")]
    pub drive_id: String,
    #[serde(rename = "Drive Name")]
    pub drive_name: String,
    #[serde(rename = "Storage Used (bytes)")]
    pub bytes: u64,
    #[serde(rename = "Storage Used (MB)")]
    pub megabytes: f64,
    #[serde(rename = "Total Files")]
    pub total_files: u64,
    #[serde(rename = "Folder Count")]
    pub folder_count: u64,
    #[serde(rename = "Document Count")]
    pub document_count: u64,
    #[serde(rename = "Error")]
    pub error: String,
}

impl DriveStorageRow {
    pub fn new(drive: &SharedDrive, bytes: u64, total_files: u64, folder_count: u64) -> Self {
        Self {
            drive_id: drive.id.clone(),
            drive_name: drive.name.clone(),
            bytes,
            megabytes: bytes as f64 / BYTES_PER_MB,
            total_files,
            folder_count,
            document_count: total_files.saturating_sub(folder_count),
            error: String::new(),
        }
    }

    /// Zeroed row carrying the failure.
    pub fn failed(drive: &SharedDrive, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::new(drive, 0, 0, 0)
        }
    }
}

// ============================================================================
// Mailbox
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailboxRow {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "HasDelegates")]
    pub has_delegates: bool,
    #[serde(rename = "DelegateCount")]
    pub delegate_count: usize,
    #[serde(rename = "Delegates")]
    pub delegates: String,
    #[serde(rename = "HasForwarding")]
    pub has_forwarding: bool,
    #[serde(rename = "ForwardingEnabled")]
    pub forwarding_enabled: bool,
    #[serde(rename = "ForwardingAddresses")]
    pub forwarding_addresses: String,
    #[serde(rename = "HasIMAPAccess")]
    pub has_imap_access: bool,
    #[serde(rename = "HasPOPAccess")]
    pub has_pop_access: bool,
    #[serde(rename = "UserIsActive")]
    pub user_is_active: bool,
    #[serde(rename = "UserIsSuspended")]
    pub user_is_suspended: bool,
    #[serde(rename = "IsAdmin")]
    pub is_admin: bool,
    #[serde(rename = "IsDelegatedAdmin")]
    pub is_delegated_admin: bool,
    #[serde(rename = "Has2FA")]
    pub has_2fa: bool,
    #[serde(rename = "OrgUnitPath")]
    pub org_unit_path: String,
    #[serde(rename = "ForwardingDestination")]
    pub forwarding_destination: String,
}

/// Mailbox facts gathered from the Gmail settings calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxFacts {
    pub delegates: Vec<String>,
    pub forwarding_addresses: Vec<String>,
    pub forwarding_enabled: bool,
    pub forwarding_destination: String,
    pub imap_enabled: bool,
    pub pop_enabled: bool,
}

impl MailboxRow {
    pub fn new(email: &str, user: Option<&User>, facts: &MailboxFacts) -> Self {
        let mut row = Self {
            email: email.to_string(),
            has_delegates: !facts.delegates.is_empty(),
            delegate_count: facts.delegates.len(),
            delegates: facts.delegates.join(","),
            has_forwarding: !facts.forwarding_addresses.is_empty(),
            forwarding_enabled: facts.forwarding_enabled,
            forwarding_addresses: facts.forwarding_addresses.join(","),
            has_imap_access: facts.imap_enabled,
            has_pop_access: facts.pop_enabled,
            user_is_active: true,
            forwarding_destination: facts.forwarding_destination.clone(),
            ..Default::default()
        };
        if let Some(user) = user {
            row.user_is_active = !user.suspended;
            row.user_is_suspended = user.suspended;
            row.is_admin = user.is_admin;
            row.is_delegated_admin = user.is_delegated_admin;
            row.has_2fa = user.is_enrolled_in_2sv;
            row.org_unit_path = user.org_unit_path.clone();
        }
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegateRow {
    #[serde(rename = "Mailbox")]
    pub mailbox: String,
    #[serde(rename = "Delegate")]
    pub delegate: String,
}

impl DelegateRow {
    pub fn new(mailbox: &str, delegate: &str) -> Self {
        Self {
            mailbox: mailbox.to_string(),
            delegate: delegate.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardingRow {
    #[serde(rename = "Mailbox")]
    pub mailbox: String,
    #[serde(rename = "ForwardingAddress")]
    pub forwarding_address: String,
    #[serde(rename = "AutoForwardingEnabled")]
    pub auto_forwarding_enabled: bool,
}
