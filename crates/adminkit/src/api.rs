//! The [`Workspace`] trait: every remote call the audit commands make.
//!
//! [`crate::HttpWorkspace`] implements it over HTTPS; [`crate::MockWorkspace`]
//! implements it in memory for tests.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::types::{
    About, Activity, AutoForwarding, Building, CalendarResource, Delegate, File, FileQuery,
    ForwardingAddress, Group, ImapSettings, Member, NewPermission, Page, PageRequest, Permission,
    PopSettings, SharedDrive, UsageReport, User,
};

/// Typed facade over the Directory, Reports, Drive and Gmail settings APIs.
///
/// Directory, Reports and Drive calls act as the delegated admin. Gmail
/// settings calls impersonate the mailbox owner named by `user`.
pub trait Workspace: Send + Sync {
    // -------------------------------------------------------------------------
    // Directory
    // -------------------------------------------------------------------------

    /// List users of the customer, ordered by email.
    fn list_users(&self, page: &PageRequest) -> Result<Page<User>>;

    /// Get one user.
    fn get_user(&self, user_key: &str) -> Result<User>;

    /// List groups of a domain.
    fn list_groups(&self, domain: &str, page: &PageRequest) -> Result<Page<Group>>;

    /// List members of a group.
    fn list_members(&self, group_key: &str, page: &PageRequest) -> Result<Page<Member>>;

    /// List buildings.
    fn list_buildings(&self, page: &PageRequest) -> Result<Page<Building>>;

    /// List calendar resources (rooms and equipment).
    fn list_calendar_resources(&self, page: &PageRequest) -> Result<Page<CalendarResource>>;

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    /// Get a user's usage report for one date.
    fn user_usage_report(&self, user_key: &str, date: NaiveDate) -> Result<UsageReport>;

    /// List Drive audit activities for all users since `start_time`.
    fn list_drive_activities(
        &self,
        start_time: DateTime<Utc>,
        page: &PageRequest,
    ) -> Result<Page<Activity>>;

    // -------------------------------------------------------------------------
    // Drive
    // -------------------------------------------------------------------------

    /// Get the authenticated user and storage quota.
    fn about(&self) -> Result<About>;

    /// List shared drives, optionally as a domain administrator.
    fn list_drives(&self, page: &PageRequest, domain_admin_access: bool)
    -> Result<Page<SharedDrive>>;

    /// Get one shared drive.
    fn get_drive(&self, drive_id: &str) -> Result<SharedDrive>;

    /// List permissions of a file or shared drive.
    fn list_permissions(&self, file_id: &str, page: &PageRequest) -> Result<Page<Permission>>;

    /// Create a permission.
    fn create_permission(&self, file_id: &str, permission: &NewPermission) -> Result<Permission>;

    /// Change the role of an existing permission.
    fn update_permission(&self, file_id: &str, permission_id: &str, role: &str)
    -> Result<Permission>;

    /// Get file metadata, including quota bytes used.
    fn get_file(&self, file_id: &str) -> Result<File>;

    /// Search files.
    fn list_files(&self, query: &FileQuery, page: &PageRequest) -> Result<Page<File>>;

    // -------------------------------------------------------------------------
    // Gmail settings
    // -------------------------------------------------------------------------

    /// List a mailbox's delegates.
    fn list_delegates(&self, user: &str) -> Result<Vec<Delegate>>;

    /// List a mailbox's registered forwarding addresses.
    fn list_forwarding_addresses(&self, user: &str) -> Result<Vec<ForwardingAddress>>;

    /// Get a mailbox's auto-forwarding setting.
    fn auto_forwarding(&self, user: &str) -> Result<AutoForwarding>;

    /// Get a mailbox's IMAP setting.
    fn imap_settings(&self, user: &str) -> Result<ImapSettings>;

    /// Get a mailbox's POP setting.
    fn pop_settings(&self, user: &str) -> Result<PopSettings>;
}
