//! Mailbox delegation, forwarding and access audit.

use adminkit::{Pager, Workspace, scopes};
use anyhow::Result;
use serde_json::json;
use std::thread;
use std::time::Duration;

use crate::Context;
use crate::cli::MailboxArgs;
use crate::commands::{Session, describe};
use crate::config::Settings;
use crate::export::Exporter;
use crate::paths::principal_stem;
use crate::records::{DelegateRow, ForwardingRow, MailboxFacts, MailboxRow};
use crate::stats::MailboxSummary;
use crate::ui;

/// File name prefix of the mailbox exports.
pub const PREFIX: &str = "mailbox_permissions";
pub const DELEGATES_FILE: &str = "detailed_delegates.csv";
pub const FORWARDING_FILE: &str = "detailed_forwarding.csv";

const DEFAULT_OUTPUT_DIR: &str = "mailbox_permissions";
const USERS_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct MailboxOptions {
    /// 0 means every user
    pub max_users: usize,
    pub page_delay: Duration,
    pub user_delay: Duration,
}

impl MailboxOptions {
    pub fn new(settings: &Settings, max_users: usize) -> Self {
        Self {
            max_users,
            page_delay: settings.page_delay(),
            user_delay: settings.user_delay(),
        }
    }
}

pub fn run(_ctx: &Context, args: MailboxArgs) -> Result<()> {
    let session = Session::new(&args.auth)?;
    let settings = &session.settings;
    let opts = MailboxOptions::new(settings, args.max_users);

    ui::header("Mailbox Permissions");
    session.print_identity();

    let workspace = session.workspace(scopes::MAILBOX)?;
    let exporter = Exporter::create(
        &settings.output_dir_or(DEFAULT_OUTPUT_DIR),
        settings.snapshot_interval,
    )?;

    let rows = collect(&workspace, &exporter, &opts)?;
    MailboxSummary::from_rows(&rows).print();
    Ok(())
}

/// Audit active mailboxes page by page.
///
/// Suspended users are skipped. A failed user page writes
/// `mailbox_permissions_error.csv` and skips the complete and detailed files.
pub fn collect(
    workspace: &dyn Workspace,
    exporter: &Exporter,
    opts: &MailboxOptions,
) -> Result<Vec<MailboxRow>> {
    let mut rows: Vec<MailboxRow> = Vec::new();
    let mut facts: Vec<MailboxFacts> = Vec::new();
    let mut failed = false;

    let pager = Pager::new(USERS_PAGE_SIZE, |page| workspace.list_users(page))
        .with_delay(opts.page_delay);

    'pages: for page in pager {
        let users = match page {
            Ok(users) => users,
            Err(e) => {
                ui::error(&format!("Error listing users: {}", describe(&e)));
                exporter.write_error_snapshot(PREFIX, &rows)?;
                failed = true;
                break;
            }
        };

        for user in users {
            if user.suspended {
                log::debug!("Skipping suspended user {}", user.primary_email);
                continue;
            }
            let email = user.primary_email;
            ui::info(&format!("Processing mailbox {}: {}", rows.len() + 1, email));

            let (row, found) = process_mailbox(workspace, exporter, &email);
            rows.push(row);
            facts.push(found);
            exporter.snapshot(PREFIX, &rows)?;

            if opts.max_users > 0 && rows.len() >= opts.max_users {
                ui::info(&format!("Reached maximum user limit of {}", opts.max_users));
                break 'pages;
            }

            if !opts.user_delay.is_zero() {
                thread::sleep(opts.user_delay);
            }
        }
    }

    if failed {
        return Ok(rows);
    }

    if let Some(path) = exporter.write_csv(&format!("{}_complete.csv", PREFIX), &rows)? {
        ui::success(&format!("Saved {} records to {}", rows.len(), path.display()));
    }

    let delegates: Vec<DelegateRow> = rows
        .iter()
        .zip(&facts)
        .flat_map(|(row, f)| f.delegates.iter().map(|d| DelegateRow::new(&row.email, d)))
        .collect();
    if let Some(path) = exporter.write_csv(DELEGATES_FILE, &delegates)? {
        ui::success(&format!("Saved delegate details to {}", path.display()));
    }

    let forwarding: Vec<ForwardingRow> = rows
        .iter()
        .zip(&facts)
        .flat_map(|(row, f)| {
            f.forwarding_addresses.iter().map(|address| ForwardingRow {
                mailbox: row.email.clone(),
                forwarding_address: address.clone(),
                auto_forwarding_enabled: f.forwarding_enabled,
            })
        })
        .collect();
    if let Some(path) = exporter.write_csv(FORWARDING_FILE, &forwarding)? {
        ui::success(&format!("Saved forwarding details to {}", path.display()));
    }

    Ok(rows)
}

/// Gather one mailbox's settings.
///
/// Each settings call fails on its own; a denied call leaves its columns
/// at their defaults and the rest are still filled.
pub fn process_mailbox(
    workspace: &dyn Workspace,
    exporter: &Exporter,
    email: &str,
) -> (MailboxRow, MailboxFacts) {
    let stem = principal_stem(email);
    let mut facts = MailboxFacts::default();

    let user = match workspace.get_user(email) {
        Ok(user) => {
            dump(exporter, &format!("{}_user_info", stem), &user);
            Some(user)
        }
        Err(e) => {
            note_failure(email, "user details", &e);
            None
        }
    };

    if user.as_ref().is_some_and(|u| u.suspended) {
        ui::dim(&format!("User {} is suspended", email));
        return (MailboxRow::new(email, user.as_ref(), &facts), facts);
    }

    match workspace.list_delegates(email) {
        Ok(delegates) => {
            dump(exporter, &format!("{}_delegates", stem), &delegates);
            facts.delegates = delegates
                .into_iter()
                .map(|d| d.delegate_email)
                .filter(|d| !d.is_empty())
                .collect();
        }
        Err(e) => note_failure(email, "delegates", &e),
    }

    let addresses = match workspace.list_forwarding_addresses(email) {
        Ok(addresses) => addresses,
        Err(e) => {
            note_failure(email, "forwarding addresses", &e);
            Vec::new()
        }
    };
    facts.forwarding_addresses = addresses
        .iter()
        .map(|a| a.forwarding_email.clone())
        .filter(|a| !a.is_empty())
        .collect();

    let auto = match workspace.auto_forwarding(email) {
        Ok(auto) => Some(auto),
        Err(e) => {
            note_failure(email, "forwarding settings", &e);
            None
        }
    };
    if let Some(auto) = &auto {
        facts.forwarding_enabled = auto.enabled;
        if auto.enabled && !auto.email_address.is_empty() {
            facts.forwarding_destination = auto.email_address.clone();
            if !facts.forwarding_addresses.contains(&auto.email_address) {
                facts.forwarding_addresses.push(auto.email_address.clone());
            }
        }
    }
    dump(
        exporter,
        &format!("{}_forwarding", stem),
        &json!({ "forwardingAddresses": addresses, "autoForwarding": auto }),
    );

    let imap = match workspace.imap_settings(email) {
        Ok(imap) => Some(imap),
        Err(e) => {
            note_failure(email, "IMAP settings", &e);
            None
        }
    };
    let pop = match workspace.pop_settings(email) {
        Ok(pop) => Some(pop),
        Err(e) => {
            note_failure(email, "POP settings", &e);
            None
        }
    };
    facts.imap_enabled = imap.as_ref().is_some_and(|s| s.enabled);
    facts.pop_enabled = pop.as_ref().is_some_and(|s| s.is_enabled());
    dump(
        exporter,
        &format!("{}_access_settings", stem),
        &json!({ "imap": imap, "pop": pop }),
    );

    (MailboxRow::new(email, user.as_ref(), &facts), facts)
}

fn note_failure(email: &str, what: &str, err: &adminkit::Error) {
    let msg = if err.is_forbidden() {
        format!(
            "Access denied for {}'s {}. This may require additional permissions.",
            email, what
        )
    } else if err.is_not_found() {
        format!(
            "{} endpoint not found for {}. The user may not exist.",
            capitalize(what),
            email
        )
    } else {
        format!("Error getting {} for {}: {}", what, email, describe(err))
    };
    ui::warn(&msg);
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn dump<T: serde::Serialize>(exporter: &Exporter, name: &str, value: &T) {
    if let Err(e) = exporter.write_raw(name, value) {
        log::warn!("Could not write raw dump {}: {:#}", name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adminkit::MockWorkspace;
    use adminkit::types::{AutoForwarding, Delegate, ForwardingAddress, ImapSettings, PopSettings, User};
    use std::fs;
    use tempfile::TempDir;

    const ANA: &str = "ana@example.com";

    fn opts(max_users: usize) -> MailboxOptions {
        MailboxOptions {
            max_users,
            page_delay: Duration::ZERO,
            user_delay: Duration::ZERO,
        }
    }

    fn mock() -> MockWorkspace {
        let mut mock = MockWorkspace::new();
        mock.add_user(User {
            primary_email: ANA.into(),
            is_admin: true,
            org_unit_path: "/Staff".into(),
            ..Default::default()
        });
        mock.add_user(User {
            primary_email: "bo@example.com".into(),
            suspended: true,
            ..Default::default()
        });
        mock.add_user(User {
            primary_email: "cy@example.com".into(),
            ..Default::default()
        });
        mock.set_delegates(
            ANA,
            vec![Delegate {
                delegate_email: "assistant@example.com".into(),
                verification_status: "accepted".into(),
            }],
        );
        mock.set_forwarding_addresses(
            ANA,
            vec![ForwardingAddress {
                forwarding_email: "archive@example.org".into(),
                verification_status: "accepted".into(),
            }],
        );
        mock.set_auto_forwarding(
            ANA,
            AutoForwarding {
                enabled: true,
                email_address: "backup@example.org".into(),
                disposition: "leaveInInbox".into(),
            },
        );
        mock.set_imap(ANA, ImapSettings { enabled: true });
        mock.set_pop(
            ANA,
            PopSettings {
                access_window: "disabled".into(),
                disposition: String::new(),
            },
        );
        mock
    }

    fn exporter(tmp: &TempDir) -> Exporter {
        Exporter::create(tmp.path(), 10).unwrap()
    }

    #[test]
    fn test_process_merges_auto_forwarding() {
        let tmp = TempDir::new().unwrap();
        let (row, facts) = process_mailbox(&mock(), &exporter(&tmp), ANA);

        assert!(row.has_delegates);
        assert_eq!(row.delegate_count, 1);
        assert_eq!(row.delegates, "assistant@example.com");
        assert!(row.has_forwarding);
        assert!(row.forwarding_enabled);
        assert_eq!(row.forwarding_addresses, "archive@example.org,backup@example.org");
        assert_eq!(row.forwarding_destination, "backup@example.org");
        assert!(row.has_imap_access);
        assert!(!row.has_pop_access);
        assert!(row.is_admin);
        assert_eq!(row.org_unit_path, "/Staff");
        assert_eq!(facts.forwarding_addresses.len(), 2);

        let raw = tmp.path().join("raw_data");
        assert!(raw.join("ana_example.com_user_info.json").exists());
        assert!(raw.join("ana_example.com_delegates.json").exists());
        assert!(raw.join("ana_example.com_forwarding.json").exists());
        assert!(raw.join("ana_example.com_access_settings.json").exists());
    }

    #[test]
    fn test_one_denied_call_does_not_block_others() {
        let mut ws = mock();
        ws.fail_for("list_delegates", ANA, 403);
        let tmp = TempDir::new().unwrap();

        let (row, _) = process_mailbox(&ws, &exporter(&tmp), ANA);
        assert!(!row.has_delegates);
        assert!(row.has_forwarding);
        assert!(row.has_imap_access);
        assert!(ws.calls().contains(&format!("pop_settings:{}", ANA)));
    }

    #[test]
    fn test_collect_skips_suspended_and_writes_details() {
        let ws = mock();
        let tmp = TempDir::new().unwrap();

        let rows = collect(&ws, &exporter(&tmp), &opts(0)).unwrap();
        let emails: Vec<&str> = rows.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, vec![ANA, "cy@example.com"]);
        assert!(!ws.calls().contains(&"list_delegates:bo@example.com".to_string()));

        assert!(tmp.path().join("mailbox_permissions_complete.csv").exists());
        let delegates = fs::read_to_string(tmp.path().join(DELEGATES_FILE)).unwrap();
        assert_eq!(
            delegates,
            "Mailbox,Delegate\nana@example.com,assistant@example.com\n"
        );
        let forwarding = fs::read_to_string(tmp.path().join(FORWARDING_FILE)).unwrap();
        assert!(forwarding.starts_with("Mailbox,ForwardingAddress,AutoForwardingEnabled\n"));
        assert!(forwarding.contains("ana@example.com,backup@example.org,true"));
    }

    #[test]
    fn test_max_users() {
        let tmp = TempDir::new().unwrap();
        let rows = collect(&mock(), &exporter(&tmp), &opts(1)).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_page_failure_skips_complete_files() {
        let mut ws = mock();
        ws.fail("list_users", 503);
        let tmp = TempDir::new().unwrap();

        let rows = collect(&ws, &exporter(&tmp), &opts(0)).unwrap();
        assert!(rows.is_empty());
        assert!(!tmp.path().join("mailbox_permissions_complete.csv").exists());
        assert!(!tmp.path().join(DELEGATES_FILE).exists());
    }

    #[test]
    fn test_limit_on_page_boundary_skips_next_page() {
        let mut ws = MockWorkspace::new();
        for i in 0..101 {
            ws.add_user(User {
                primary_email: format!("user{:03}@example.com", i),
                ..Default::default()
            });
        }
        ws.fail_for("list_users", "100", 503);
        let tmp = TempDir::new().unwrap();

        let rows = collect(&ws, &exporter(&tmp), &opts(100)).unwrap();
        assert_eq!(rows.len(), 100);
        let pages = ws.calls().iter().filter(|c| c.starts_with("list_users")).count();
        assert_eq!(pages, 1);
        assert!(tmp.path().join("mailbox_permissions_complete.csv").exists());
        assert!(!tmp.path().join("mailbox_permissions_error.csv").exists());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("delegates"), "Delegates");
        assert_eq!(capitalize(""), "");
    }
}
