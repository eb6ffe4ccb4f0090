//! HTTPS implementation of [`Workspace`].

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::Workspace;
use crate::auth::Authenticator;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::types::{
    About, Activity, AutoForwarding, Building, CalendarResource, Delegate, File, FileQuery,
    ForwardingAddress, Group, ImapSettings, Member, NewPermission, Page, PageRequest, Permission,
    PopSettings, SharedDrive, UsageReport, User,
};

const DRIVE_FIELDS: &str = "nextPageToken,drives(id,name,createdTime,hidden,restrictions)";
const PERMISSION_FIELDS: &str = "id,type,emailAddress,role,displayName,domain,expirationTime,deleted,pendingOwner";
const FILE_FIELDS: &str = "id,name,mimeType,driveId,parents,owners(displayName,emailAddress),quotaBytesUsed";

/// Base URLs of the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Admin SDK Directory API.
    pub directory: String,
    /// Admin SDK Reports API.
    pub reports: String,
    /// Drive v3 API.
    pub drive: String,
    /// Gmail v1 API.
    pub gmail: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            directory: "https://admin.googleapis.com/admin/directory/v1".to_string(),
            reports: "https://admin.googleapis.com/admin/reports/v1".to_string(),
            drive: "https://www.googleapis.com/drive/v3".to_string(),
            gmail: "https://gmail.googleapis.com/gmail/v1".to_string(),
        }
    }
}

/// Workspace client over HTTPS.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use adminkit::{Credentials, HttpWorkspace, PageRequest, Workspace, scopes};
///
/// let creds = Credentials::from_file(Path::new("key.json"), scopes::USAGE)
///     .unwrap()
///     .with_subject("admin@example.com");
/// let client = HttpWorkspace::new(creds);
/// let page = client.list_users(&PageRequest::first(100)).unwrap();
/// println!("{} users", page.items.len());
/// ```
pub struct HttpWorkspace {
    agent: ureq::Agent,
    auth: Authenticator,
    endpoints: Endpoints,
}

impl HttpWorkspace {
    /// Create a client with the default endpoints.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    /// Create a client with custom endpoints (for testing).
    #[must_use]
    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Self {
        let agent = ureq::Agent::new_with_defaults();
        Self {
            auth: Authenticator::with_agent(credentials, agent.clone()),
            agent,
            endpoints,
        }
    }

    /// The endpoints in use.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetch a token up front so authentication problems surface first.
    pub fn authenticate(&self) -> Result<()> {
        self.auth.access_token(None).map(|_| ())
    }

    fn bearer(&self, subject: Option<&str>) -> Result<String> {
        Ok(format!("Bearer {}", self.auth.access_token(subject)?))
    }

    fn get<T: DeserializeOwned>(
        &self,
        subject: Option<&str>,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        log::debug!("GET {}", url);
        log::trace!("Query: {:?}", query);
        let mut request = self.agent.get(url).header("Authorization", self.bearer(subject)?);
        for (key, value) in query {
            request = request.query(key, value);
        }
        Ok(request.call()?.body_mut().read_json()?)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T> {
        log::debug!("POST {}", url);
        let mut request = self.agent.post(url).header("Authorization", self.bearer(None)?);
        for (key, value) in query {
            request = request.query(key, value);
        }
        Ok(request.send_json(body)?.body_mut().read_json()?)
    }

    fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T> {
        log::debug!("PATCH {}", url);
        let mut request = self.agent.patch(url).header("Authorization", self.bearer(None)?);
        for (key, value) in query {
            request = request.query(key, value);
        }
        Ok(request.send_json(body)?.body_mut().read_json()?)
    }

    fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        field: &str,
        size_param: &'static str,
        page: &PageRequest,
        mut query: Vec<(&'static str, String)>,
    ) -> Result<Page<T>> {
        query.push((size_param, page.page_size.to_string()));
        if let Some(token) = &page.page_token {
            query.push(("pageToken", token.clone()));
        }
        let value: Value = self.get(None, url, &query)?;
        page_from(value, field)
    }

    fn gmail_settings_url(&self, path: &str) -> String {
        format!("{}/users/me/settings/{}", self.endpoints.gmail, path)
    }
}

/// Split a list response into its items and continuation token.
///
/// A missing items field is an empty page.
pub(crate) fn page_from<T: DeserializeOwned>(mut value: Value, field: &str) -> Result<Page<T>> {
    let items = match value.get_mut(field).map(Value::take) {
        Some(Value::Null) | None => Vec::new(),
        Some(items) => serde_json::from_value(items)?,
    };
    let next_page_token = value
        .get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    Ok(Page {
        items,
        next_page_token,
    })
}

fn items_of<T: DeserializeOwned>(value: Value, field: &str) -> Result<Vec<T>> {
    page_from(value, field).map(|p| p.items)
}

fn all_drives() -> (&'static str, String) {
    ("supportsAllDrives", "true".to_string())
}

impl Workspace for HttpWorkspace {
    fn list_users(&self, page: &PageRequest) -> Result<Page<User>> {
        let url = format!("{}/users", self.endpoints.directory);
        let query = vec![
            ("customer", "my_customer".to_string()),
            ("orderBy", "email".to_string()),
        ];
        self.get_page(&url, "users", "maxResults", page, query)
    }

    fn get_user(&self, user_key: &str) -> Result<User> {
        let url = format!("{}/users/{}", self.endpoints.directory, user_key);
        self.get(None, &url, &[])
    }

    fn list_groups(&self, domain: &str, page: &PageRequest) -> Result<Page<Group>> {
        let url = format!("{}/groups", self.endpoints.directory);
        let query = vec![("domain", domain.to_string())];
        self.get_page(&url, "groups", "maxResults", page, query)
    }

    fn list_members(&self, group_key: &str, page: &PageRequest) -> Result<Page<Member>> {
        let url = format!("{}/groups/{}/members", self.endpoints.directory, group_key);
        self.get_page(&url, "members", "maxResults", page, Vec::new())
    }

    fn list_buildings(&self, page: &PageRequest) -> Result<Page<Building>> {
        let url = format!(
            "{}/customer/my_customer/resources/buildings",
            self.endpoints.directory
        );
        self.get_page(&url, "buildings", "maxResults", page, Vec::new())
    }

    fn list_calendar_resources(&self, page: &PageRequest) -> Result<Page<CalendarResource>> {
        let url = format!(
            "{}/customer/my_customer/resources/calendars",
            self.endpoints.directory
        );
        self.get_page(&url, "items", "maxResults", page, Vec::new())
    }

    fn user_usage_report(&self, user_key: &str, date: NaiveDate) -> Result<UsageReport> {
        let url = format!(
            "{}/usage/users/{}/dates/{}",
            self.endpoints.reports,
            user_key,
            date.format("%Y-%m-%d")
        );
        self.get(None, &url, &[])
    }

    fn list_drive_activities(
        &self,
        start_time: DateTime<Utc>,
        page: &PageRequest,
    ) -> Result<Page<Activity>> {
        let url = format!(
            "{}/activity/users/all/applications/drive",
            self.endpoints.reports
        );
        let query = vec![(
            "startTime",
            start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        )];
        self.get_page(&url, "items", "maxResults", page, query)
    }

    fn about(&self) -> Result<About> {
        let url = format!("{}/about", self.endpoints.drive);
        self.get(None, &url, &[("fields", "user,storageQuota".to_string())])
    }

    fn list_drives(
        &self,
        page: &PageRequest,
        domain_admin_access: bool,
    ) -> Result<Page<SharedDrive>> {
        let url = format!("{}/drives", self.endpoints.drive);
        let mut query = vec![("fields", DRIVE_FIELDS.to_string())];
        if domain_admin_access {
            query.push(("useDomainAdminAccess", "true".to_string()));
        }
        self.get_page(&url, "drives", "pageSize", page, query)
    }

    fn get_drive(&self, drive_id: &str) -> Result<SharedDrive> {
        let url = format!("{}/drives/{}", self.endpoints.drive, drive_id);
        let fields = "id,name,createdTime,hidden,restrictions".to_string();
        self.get(None, &url, &[("fields", fields)])
    }

    fn list_permissions(&self, file_id: &str, page: &PageRequest) -> Result<Page<Permission>> {
        let url = format!("{}/files/{}/permissions", self.endpoints.drive, file_id);
        let query = vec![
            all_drives(),
            ("fields", format!("nextPageToken,permissions({})", PERMISSION_FIELDS)),
        ];
        self.get_page(&url, "permissions", "pageSize", page, query)
    }

    fn create_permission(&self, file_id: &str, permission: &NewPermission) -> Result<Permission> {
        let url = format!("{}/files/{}/permissions", self.endpoints.drive, file_id);
        let query = [
            all_drives(),
            ("sendNotificationEmail", "false".to_string()),
            ("fields", PERMISSION_FIELDS.to_string()),
        ];
        self.post(&url, &query, permission)
    }

    fn update_permission(
        &self,
        file_id: &str,
        permission_id: &str,
        role: &str,
    ) -> Result<Permission> {
        let url = format!(
            "{}/files/{}/permissions/{}",
            self.endpoints.drive, file_id, permission_id
        );
        let query = [all_drives(), ("fields", PERMISSION_FIELDS.to_string())];
        self.patch(&url, &query, &serde_json::json!({ "role": role }))
    }

    fn get_file(&self, file_id: &str) -> Result<File> {
        let url = format!("{}/files/{}", self.endpoints.drive, file_id);
        let query = [all_drives(), ("fields", FILE_FIELDS.to_string())];
        self.get(None, &url, &query)
    }

    fn list_files(&self, query: &FileQuery, page: &PageRequest) -> Result<Page<File>> {
        let url = format!("{}/files", self.endpoints.drive);
        let mut params = vec![("fields", format!("nextPageToken,files({})", FILE_FIELDS))];
        if let Some(q) = &query.q {
            params.push(("q", q.clone()));
        }
        if query.all_drives || query.drive_id.is_some() {
            params.push(all_drives());
            params.push(("includeItemsFromAllDrives", "true".to_string()));
        }
        match &query.drive_id {
            Some(drive_id) => {
                params.push(("corpora", "drive".to_string()));
                params.push(("driveId", drive_id.clone()));
            }
            None if query.all_drives => params.push(("corpora", "allDrives".to_string())),
            None => {}
        }
        self.get_page(&url, "files", "pageSize", page, params)
    }

    fn list_delegates(&self, user: &str) -> Result<Vec<Delegate>> {
        let value: Value = self.get(Some(user), &self.gmail_settings_url("delegates"), &[])?;
        items_of(value, "delegates")
    }

    fn list_forwarding_addresses(&self, user: &str) -> Result<Vec<ForwardingAddress>> {
        let url = self.gmail_settings_url("forwardingAddresses");
        let value: Value = self.get(Some(user), &url, &[])?;
        items_of(value, "forwardingAddresses")
    }

    fn auto_forwarding(&self, user: &str) -> Result<AutoForwarding> {
        self.get(Some(user), &self.gmail_settings_url("autoForwarding"), &[])
    }

    fn imap_settings(&self, user: &str) -> Result<ImapSettings> {
        self.get(Some(user), &self.gmail_settings_url("imap"), &[])
    }

    fn pop_settings(&self, user: &str) -> Result<PopSettings> {
        self.get(Some(user), &self.gmail_settings_url("pop"), &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ServiceAccountKey;
    use crate::credentials::tests::KEY_JSON;
    use crate::error::Error;
    use serde_json::json;

    fn client() -> HttpWorkspace {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        HttpWorkspace::new(Credentials::new(key, &["scope"]).with_subject("admin@example.com"))
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert!(endpoints.directory.starts_with("https://admin.googleapis.com"));
        assert!(endpoints.drive.ends_with("/drive/v3"));
        assert_eq!(client().endpoints(), &endpoints);
    }

    #[test]
    fn test_gmail_settings_url() {
        assert_eq!(
            client().gmail_settings_url("imap"),
            "https://gmail.googleapis.com/gmail/v1/users/me/settings/imap"
        );
    }

    #[test]
    fn test_page_from() {
        let page: Page<Member> = page_from(
            json!({"members": [{"email": "a@example.com"}], "nextPageToken": "t2"}),
            "members",
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("t2"));
    }

    #[test]
    fn test_page_from_missing_items() {
        let page: Page<Member> = page_from(json!({"kind": "admin#directory#members"}), "members").unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_page_from_empty_token_is_last() {
        let page: Page<Member> =
            page_from(json!({"members": [{}], "nextPageToken": ""}), "members").unwrap();
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_page_from_bad_items() {
        let result: Result<Page<Member>> = page_from(json!({"members": "oops"}), "members");
        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn test_requests_fail_before_network_on_bad_key() {
        let err = client().about().unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }
}
