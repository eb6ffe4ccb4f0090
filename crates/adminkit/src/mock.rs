//! In-memory [`Workspace`] for tests.
//!
//! # Example
//!
//! ```
//! use adminkit::{MockWorkspace, PageRequest, Workspace};
//! use adminkit::types::User;
//!
//! let mut mock = MockWorkspace::new();
//! mock.add_user(User {
//!     primary_email: "ana@example.com".to_string(),
//!     ..Default::default()
//! });
//! mock.fail("get_user", 403);
//!
//! let page = mock.list_users(&PageRequest::first(100)).unwrap();
//! assert_eq!(page.items.len(), 1);
//! assert!(mock.get_user("ana@example.com").unwrap_err().is_forbidden());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};

use crate::api::Workspace;
use crate::error::{Error, Result};
use crate::types::{
    About, Activity, AutoForwarding, Building, CalendarResource, Delegate, FOLDER_MIME_TYPE, File,
    FileQuery, ForwardingAddress, Group, ImapSettings, Member, NewPermission, Page, PageRequest,
    Permission, PopSettings, SharedDrive, UsageReport, User,
};

/// A mutating call recorded by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `permissions.create`
    CreatePermission {
        /// Shared drive or file id.
        file_id: String,
        /// Grantee.
        email: String,
        /// Role granted.
        role: String,
    },
    /// `permissions.update`
    UpdatePermission {
        /// Shared drive or file id.
        file_id: String,
        /// Permission changed.
        permission_id: String,
        /// New role.
        role: String,
    },
}

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    groups: Vec<Group>,
    members: HashMap<String, Vec<Member>>,
    buildings: Vec<Building>,
    calendar_resources: Vec<CalendarResource>,
    usage_reports: HashMap<String, UsageReport>,
    activities: Vec<Activity>,
    about: About,
    drives: Vec<SharedDrive>,
    permissions: HashMap<String, Vec<Permission>>,
    files: Vec<File>,
    delegates: HashMap<String, Vec<Delegate>>,
    forwarding: HashMap<String, Vec<ForwardingAddress>>,
    auto_forwarding: HashMap<String, AutoForwarding>,
    imap: HashMap<String, ImapSettings>,
    pop: HashMap<String, PopSettings>,
    failures: HashMap<String, u16>,
    calls: Vec<String>,
    mutations: Vec<Mutation>,
    next_permission_id: u32,
}

/// Mock Workspace that serves canned data.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect [`calls`](Self::calls) and [`mutations`](Self::mutations)
/// through another.
#[derive(Debug, Clone, Default)]
pub struct MockWorkspace {
    state: Arc<Mutex<State>>,
}

fn paginate<T: Clone>(items: &[T], page: &PageRequest) -> Page<T> {
    let start: usize = page
        .page_token
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);
    let size = (page.page_size as usize).max(1);
    let end = (start + size).min(items.len());
    let slice = items.get(start..end).unwrap_or_default().to_vec();
    Page {
        items: slice,
        next_page_token: (end < items.len()).then(|| end.to_string()),
    }
}

impl MockWorkspace {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `op` fail with an HTTP status for every argument.
    ///
    /// `op` is the trait method name, e.g. `"list_members"`.
    pub fn fail(&mut self, op: &str, status: u16) {
        self.state().failures.insert(op.to_string(), status);
    }

    /// Make `op` fail with an HTTP status for one argument only.
    ///
    /// For `list_drives` the argument is `"admin"` or `"user"` depending on
    /// domain-admin access. For `list_users` it is the page token, so a
    /// later page can fail while the first succeeds.
    pub fn fail_for(&mut self, op: &str, arg: &str, status: u16) {
        self.state().failures.insert(format!("{}:{}", op, arg), status);
    }

    /// Every call made so far, as `op` or `op:arg`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Every mutating call made so far.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.state().mutations.clone()
    }

    /// Add a user.
    pub fn add_user(&mut self, user: User) {
        self.state().users.push(user);
    }

    /// Add a group.
    pub fn add_group(&mut self, group: Group) {
        self.state().groups.push(group);
    }

    /// Set the members of a group (by group email).
    pub fn set_members(&mut self, group_key: &str, members: Vec<Member>) {
        self.state().members.insert(group_key.to_string(), members);
    }

    /// Add a building.
    pub fn add_building(&mut self, building: Building) {
        self.state().buildings.push(building);
    }

    /// Add a calendar resource.
    pub fn add_calendar_resource(&mut self, resource: CalendarResource) {
        self.state().calendar_resources.push(resource);
    }

    /// Set the usage report returned for a user.
    pub fn set_usage_report(&mut self, user_key: &str, report: UsageReport) {
        self.state().usage_reports.insert(user_key.to_string(), report);
    }

    /// Add a Drive audit activity.
    pub fn add_activity(&mut self, activity: Activity) {
        self.state().activities.push(activity);
    }

    /// Set the `about.get` response.
    pub fn set_about(&mut self, about: About) {
        self.state().about = about;
    }

    /// Add a shared drive.
    pub fn add_drive(&mut self, drive: SharedDrive) {
        self.state().drives.push(drive);
    }

    /// Add a permission to a file or shared drive.
    pub fn add_permission(&mut self, file_id: &str, permission: Permission) {
        self.state()
            .permissions
            .entry(file_id.to_string())
            .or_default()
            .push(permission);
    }

    /// Add a file. A file whose id equals a drive id serves `files.get` for
    /// that drive's root.
    pub fn add_file(&mut self, file: File) {
        self.state().files.push(file);
    }

    /// Set a mailbox's delegates.
    pub fn set_delegates(&mut self, user: &str, delegates: Vec<Delegate>) {
        self.state().delegates.insert(user.to_string(), delegates);
    }

    /// Set a mailbox's forwarding addresses.
    pub fn set_forwarding_addresses(&mut self, user: &str, addresses: Vec<ForwardingAddress>) {
        self.state().forwarding.insert(user.to_string(), addresses);
    }

    /// Set a mailbox's auto-forwarding.
    pub fn set_auto_forwarding(&mut self, user: &str, setting: AutoForwarding) {
        self.state().auto_forwarding.insert(user.to_string(), setting);
    }

    /// Set a mailbox's IMAP setting.
    pub fn set_imap(&mut self, user: &str, setting: ImapSettings) {
        self.state().imap.insert(user.to_string(), setting);
    }

    /// Set a mailbox's POP setting.
    pub fn set_pop(&mut self, user: &str, setting: PopSettings) {
        self.state().pop.insert(user.to_string(), setting);
    }

    /// Record the call and apply any injected failure.
    fn enter(&self, op: &str, arg: Option<&str>) -> Result<MutexGuard<'_, State>> {
        let mut state = self.state();
        let key = arg.map_or_else(|| op.to_string(), |a| format!("{}:{}", op, a));
        state.calls.push(key.clone());
        let status = state
            .failures
            .get(&key)
            .or_else(|| state.failures.get(op))
            .copied();
        match status {
            Some(code) => Err(Error::status(code)),
            None => Ok(state),
        }
    }
}

fn file_matches(file: &File, query: &FileQuery) -> bool {
    if let Some(drive_id) = &query.drive_id {
        if file.drive_id.as_deref() != Some(drive_id.as_str()) {
            return false;
        }
    }
    match query.q.as_deref() {
        Some(q) if q.contains(FOLDER_MIME_TYPE) => file.is_folder(),
        Some(q) if q.contains("driveId!=null") => file.drive_id.is_some(),
        _ => true,
    }
}

impl Workspace for MockWorkspace {
    fn list_users(&self, page: &PageRequest) -> Result<Page<User>> {
        let state = self.enter("list_users", page.page_token.as_deref())?;
        Ok(paginate(&state.users, page))
    }

    fn get_user(&self, user_key: &str) -> Result<User> {
        let state = self.enter("get_user", Some(user_key))?;
        state
            .users
            .iter()
            .find(|u| u.primary_email.eq_ignore_ascii_case(user_key) || u.id == user_key)
            .cloned()
            .ok_or_else(|| Error::status(404))
    }

    fn list_groups(&self, domain: &str, page: &PageRequest) -> Result<Page<Group>> {
        let state = self.enter("list_groups", Some(domain))?;
        Ok(paginate(&state.groups, page))
    }

    fn list_members(&self, group_key: &str, page: &PageRequest) -> Result<Page<Member>> {
        let state = self.enter("list_members", Some(group_key))?;
        state
            .members
            .get(group_key)
            .map(|m| paginate(m, page))
            .ok_or_else(|| Error::status(404))
    }

    fn list_buildings(&self, page: &PageRequest) -> Result<Page<Building>> {
        let state = self.enter("list_buildings", None)?;
        Ok(paginate(&state.buildings, page))
    }

    fn list_calendar_resources(&self, page: &PageRequest) -> Result<Page<CalendarResource>> {
        let state = self.enter("list_calendar_resources", None)?;
        Ok(paginate(&state.calendar_resources, page))
    }

    fn user_usage_report(&self, user_key: &str, _date: NaiveDate) -> Result<UsageReport> {
        let state = self.enter("user_usage_report", Some(user_key))?;
        Ok(state.usage_reports.get(user_key).cloned().unwrap_or_default())
    }

    fn list_drive_activities(
        &self,
        _start_time: DateTime<Utc>,
        page: &PageRequest,
    ) -> Result<Page<Activity>> {
        let state = self.enter("list_drive_activities", None)?;
        Ok(paginate(&state.activities, page))
    }

    fn about(&self) -> Result<About> {
        let state = self.enter("about", None)?;
        Ok(state.about.clone())
    }

    fn list_drives(
        &self,
        page: &PageRequest,
        domain_admin_access: bool,
    ) -> Result<Page<SharedDrive>> {
        let arg = if domain_admin_access { "admin" } else { "user" };
        let state = self.enter("list_drives", Some(arg))?;
        Ok(paginate(&state.drives, page))
    }

    fn get_drive(&self, drive_id: &str) -> Result<SharedDrive> {
        let state = self.enter("get_drive", Some(drive_id))?;
        state
            .drives
            .iter()
            .find(|d| d.id == drive_id)
            .cloned()
            .ok_or_else(|| Error::status(404))
    }

    fn list_permissions(&self, file_id: &str, page: &PageRequest) -> Result<Page<Permission>> {
        let state = self.enter("list_permissions", Some(file_id))?;
        let permissions = state.permissions.get(file_id).cloned().unwrap_or_default();
        Ok(paginate(&permissions, page))
    }

    fn create_permission(&self, file_id: &str, permission: &NewPermission) -> Result<Permission> {
        let mut state = self.enter("create_permission", Some(file_id))?;
        state.next_permission_id += 1;
        let created = Permission {
            id: format!("perm-{}", state.next_permission_id),
            permission_type: permission.permission_type.clone(),
            email_address: permission.email_address.clone(),
            role: permission.role.clone(),
            ..Default::default()
        };
        state
            .permissions
            .entry(file_id.to_string())
            .or_default()
            .push(created.clone());
        state.mutations.push(Mutation::CreatePermission {
            file_id: file_id.to_string(),
            email: permission.email_address.clone(),
            role: permission.role.clone(),
        });
        Ok(created)
    }

    fn update_permission(
        &self,
        file_id: &str,
        permission_id: &str,
        role: &str,
    ) -> Result<Permission> {
        let mut state = self.enter("update_permission", Some(file_id))?;
        state.mutations.push(Mutation::UpdatePermission {
            file_id: file_id.to_string(),
            permission_id: permission_id.to_string(),
            role: role.to_string(),
        });
        let permission = state
            .permissions
            .get_mut(file_id)
            .and_then(|ps| ps.iter_mut().find(|p| p.id == permission_id))
            .ok_or_else(|| Error::status(404))?;
        permission.role = role.to_string();
        Ok(permission.clone())
    }

    fn get_file(&self, file_id: &str) -> Result<File> {
        let state = self.enter("get_file", Some(file_id))?;
        state
            .files
            .iter()
            .find(|f| f.id == file_id)
            .cloned()
            .ok_or_else(|| Error::status(404))
    }

    fn list_files(&self, query: &FileQuery, page: &PageRequest) -> Result<Page<File>> {
        let arg = query.drive_id.as_deref().or(query.q.as_deref());
        let state = self.enter("list_files", arg)?;
        let files: Vec<File> = state
            .files
            .iter()
            .filter(|f| file_matches(f, query))
            .cloned()
            .collect();
        Ok(paginate(&files, page))
    }

    fn list_delegates(&self, user: &str) -> Result<Vec<Delegate>> {
        let state = self.enter("list_delegates", Some(user))?;
        Ok(state.delegates.get(user).cloned().unwrap_or_default())
    }

    fn list_forwarding_addresses(&self, user: &str) -> Result<Vec<ForwardingAddress>> {
        let state = self.enter("list_forwarding_addresses", Some(user))?;
        Ok(state.forwarding.get(user).cloned().unwrap_or_default())
    }

    fn auto_forwarding(&self, user: &str) -> Result<AutoForwarding> {
        let state = self.enter("auto_forwarding", Some(user))?;
        Ok(state.auto_forwarding.get(user).cloned().unwrap_or_default())
    }

    fn imap_settings(&self, user: &str) -> Result<ImapSettings> {
        let state = self.enter("imap_settings", Some(user))?;
        Ok(state.imap.get(user).cloned().unwrap_or_default())
    }

    fn pop_settings(&self, user: &str) -> Result<PopSettings> {
        let state = self.enter("pop_settings", Some(user))?;
        Ok(state.pop.get(user).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User {
            primary_email: email.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_paginates_by_page_size() {
        let mut mock = MockWorkspace::new();
        for i in 0..5 {
            mock.add_user(user(&format!("u{}@example.com", i)));
        }

        let first = mock.list_users(&PageRequest::first(2)).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));

        let last = mock
            .list_users(&PageRequest {
                page_size: 2,
                page_token: Some("4".into()),
            })
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.next_page_token.is_none());
    }

    #[test]
    fn test_failure_injection() {
        let mut mock = MockWorkspace::new();
        mock.fail_for("list_drives", "admin", 400);

        assert_eq!(
            mock.list_drives(&PageRequest::first(10), true)
                .unwrap_err()
                .status_code(),
            Some(400)
        );
        assert!(mock.list_drives(&PageRequest::first(10), false).is_ok());
        assert_eq!(mock.calls(), vec!["list_drives:admin", "list_drives:user"]);
    }

    #[test]
    fn test_get_user_not_found() {
        let mock = MockWorkspace::new();
        assert!(mock.get_user("ghost@example.com").unwrap_err().is_not_found());
    }

    #[test]
    fn test_permission_mutations_are_recorded() {
        let mut mock = MockWorkspace::new();
        mock.add_permission(
            "drive1",
            Permission {
                id: "p1".into(),
                email_address: "a@example.com".into(),
                role: "reader".into(),
                ..Default::default()
            },
        );
        let observer = mock.clone();

        mock.update_permission("drive1", "p1", "organizer").unwrap();
        mock.create_permission("drive1", &NewPermission::user("b@example.com", "writer"))
            .unwrap();

        let perms = mock.list_permissions("drive1", &PageRequest::first(100)).unwrap();
        assert_eq!(perms.items.len(), 2);
        assert_eq!(perms.items[0].role, "organizer");
        assert_eq!(observer.mutations().len(), 2);
        assert_eq!(
            observer.mutations()[1],
            Mutation::CreatePermission {
                file_id: "drive1".into(),
                email: "b@example.com".into(),
                role: "writer".into(),
            }
        );
    }

    #[test]
    fn test_list_files_filters() {
        let mut mock = MockWorkspace::new();
        mock.add_file(File {
            id: "f1".into(),
            drive_id: Some("d1".into()),
            mime_type: FOLDER_MIME_TYPE.into(),
            ..Default::default()
        });
        mock.add_file(File {
            id: "f2".into(),
            drive_id: Some("d2".into()),
            ..Default::default()
        });
        mock.add_file(File {
            id: "f3".into(),
            ..Default::default()
        });

        let page = PageRequest::first(100);
        let in_d1 = mock.list_files(&FileQuery::in_drive("d1"), &page).unwrap();
        assert_eq!(in_d1.items.len(), 1);

        let folders = mock
            .list_files(&FileQuery::search(format!("mimeType='{}'", FOLDER_MIME_TYPE)), &page)
            .unwrap();
        assert_eq!(folders.items[0].id, "f1");

        let in_drives = mock.list_files(&FileQuery::search("driveId!=null"), &page).unwrap();
        assert_eq!(in_drives.items.len(), 2);
    }

    #[test]
    fn test_gmail_defaults() {
        let mock = MockWorkspace::new();
        assert!(mock.list_delegates("a@example.com").unwrap().is_empty());
        assert!(!mock.imap_settings("a@example.com").unwrap().enabled);
        assert!(!mock.pop_settings("a@example.com").unwrap().is_enabled());
    }
}
