// Export commands
pub mod directory;
pub mod mailbox;
pub mod shared_drives;
pub mod usage;

// Drive administration
pub mod drive_info;
pub mod find_drives;
pub mod grant;

// Troubleshooting
pub mod diagnose;

use adminkit::{Credentials, HttpWorkspace};
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use crate::cli::AuthArgs;
use crate::config::Settings;
use crate::ui;

/// Validated identity and settings for one run.
pub struct Session {
    pub settings: Settings,
    pub key_path: PathBuf,
    pub admin_email: String,
}

impl Session {
    /// Resolve settings from config and flags and check the identity.
    pub fn new(args: &AuthArgs) -> Result<Self> {
        Self::from_settings(Settings::resolve(args)?)
    }

    pub fn from_settings(settings: Settings) -> Result<Self> {
        let key_path = settings.service_account_path()?;
        let admin_email = settings.admin_email()?.to_string();
        Ok(Self {
            settings,
            key_path,
            admin_email,
        })
    }

    /// Credentials for `scopes`, impersonating the admin.
    pub fn credentials(&self, scopes: &[&str]) -> Result<Credentials> {
        let creds = Credentials::from_file(&self.key_path, scopes).with_context(|| {
            format!(
                "Failed to load service account key {}",
                self.key_path.display()
            )
        })?;
        Ok(creds.with_subject(self.admin_email.clone()))
    }

    /// An authenticated client for `scopes`.
    ///
    /// Authentication failures are fatal and abort the run.
    pub fn workspace(&self, scopes: &[&str]) -> Result<HttpWorkspace> {
        let workspace = HttpWorkspace::new(self.credentials(scopes)?);
        if let Err(e) = workspace.authenticate() {
            explain(&e);
            return Err(e).context(format!("Authentication failed for {}", self.admin_email));
        }
        log::info!("Authenticated as {}", self.admin_email);
        Ok(workspace)
    }

    pub fn print_identity(&self) {
        ui::kv("Admin", &self.admin_email);
        ui::kv("Key", &self.key_path.display().to_string());
    }
}

/// Print an API error with its category advice.
pub fn explain(err: &adminkit::Error) {
    let category = err.category();
    ui::error(&format!("{} ({})", err, category.description()));
    ui::dim(category.advice());
}

/// One-line description of a failed call, used in notes and CSV error cells.
pub fn describe(err: &adminkit::Error) -> String {
    match err.status_code() {
        Some(code) => format!("HTTP {}: {}", code, err.category().description()),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_session_requires_identity() {
        let err = Session::from_settings(Settings::default()).err().unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingServiceAccount)
        );

        let no_admin = Settings {
            service_account: Some("/tmp/sa.json".into()),
            ..Default::default()
        };
        let err = Session::from_settings(no_admin).err().unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingAdminEmail)
        );
    }

    #[test]
    fn test_missing_key_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let session = Session::from_settings(Settings {
            service_account: Some(dir.path().join("missing.json").display().to_string()),
            admin_email: Some("admin@example.com".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(session.credentials(adminkit::scopes::USAGE).is_err());
    }

    #[test]
    fn test_describe_status() {
        let err = adminkit::Error::status(403);
        assert!(describe(&err).starts_with("HTTP 403"));
    }
}
