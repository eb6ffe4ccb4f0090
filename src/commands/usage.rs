//! Per-user Gmail and Drive usage statistics.

use adminkit::{Pager, Workspace, scopes};
use anyhow::Result;
use chrono::{Local, NaiveDate, TimeDelta};
use std::thread;
use std::time::Duration;
use usagekit::{Source, UsageRecord, resolve_metrics};

use crate::Context;
use crate::cli::UsageArgs;
use crate::commands::{Session, describe};
use crate::config::Settings;
use crate::export::Exporter;
use crate::paths::principal_stem;
use crate::records::UsageRow;
use crate::stats::UsageSummary;
use crate::ui;

/// File name prefix of the usage exports.
pub const PREFIX: &str = "workspace_stats";

const DEFAULT_OUTPUT_DIR: &str = "workspace_stats";
const USERS_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct UsageOptions {
    /// 0 means every user
    pub max_users: usize,
    pub report_date: NaiveDate,
    pub page_delay: Duration,
    pub user_delay: Duration,
}

impl UsageOptions {
    pub fn new(settings: &Settings, max_users: usize, today: NaiveDate) -> Self {
        Self {
            max_users,
            report_date: today - TimeDelta::days(settings.report_lag_days),
            page_delay: settings.page_delay(),
            user_delay: settings.user_delay(),
        }
    }
}

pub fn run(_ctx: &Context, args: UsageArgs) -> Result<()> {
    let session = Session::new(&args.auth)?;
    let settings = &session.settings;
    let opts = UsageOptions::new(settings, args.max_users, Local::now().date_naive());

    ui::header("Workspace Usage Statistics");
    session.print_identity();
    ui::kv("Report date", &opts.report_date.to_string());
    let limit = if opts.max_users > 0 {
        format!("up to {}", opts.max_users)
    } else {
        "all".to_string()
    };
    ui::kv("Users", &limit);

    let workspace = session.workspace(scopes::USAGE)?;
    let exporter = Exporter::create(
        &settings.output_dir_or(DEFAULT_OUTPUT_DIR),
        settings.snapshot_interval,
    )?;

    let rows = collect(&workspace, &exporter, &opts)?;
    UsageSummary::from_rows(&rows).print();
    Ok(())
}

/// Page through users and export one usage row each.
///
/// A failed user page ends the run early: the rows so far are written to
/// `workspace_stats_error.csv` and the complete export is skipped.
pub fn collect(
    workspace: &dyn Workspace,
    exporter: &Exporter,
    opts: &UsageOptions,
) -> Result<Vec<UsageRow>> {
    let mut rows: Vec<UsageRow> = Vec::new();
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
        log::info!("Fetched page of {} users", users.len());

        for user in users {
            let email = user.primary_email;
            ui::info(&format!("Processing user {}: {}", rows.len() + 1, email));

            rows.push(process_user(workspace, exporter, &email, opts.report_date));
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

    if !failed {
        if let Some(path) = exporter.write_csv(&format!("{}_complete.csv", PREFIX), &rows)? {
            ui::success(&format!("Saved {} records to {}", rows.len(), path.display()));
        }
    }
    Ok(rows)
}

/// Fetch, dump and resolve one user's usage. Never fails: a missing report
/// yields a zeroed row.
pub fn process_user(
    workspace: &dyn Workspace,
    exporter: &Exporter,
    email: &str,
    date: NaiveDate,
) -> UsageRow {
    let stem = principal_stem(email);

    let suspended = match workspace.get_user(email) {
        Ok(user) => user.suspended,
        Err(e) => {
            log::warn!("Could not get details for {}: {}", email, e);
            false
        }
    };

    let record = match workspace.user_usage_report(email, date) {
        Ok(report) => {
            dump(exporter, &format!("{}_raw", stem), &report);
            let record = UsageRecord::from_parameters(report.parameters());
            dump(exporter, &format!("{}_parameters", stem), &record);
            if record.is_empty() {
                ui::dim(&format!("No usage parameters for {} on {}", email, date));
            }
            record
        }
        Err(e) => {
            ui::warn(&format!("Error getting usage report for {}: {}", email, describe(&e)));
            UsageRecord::new()
        }
    };

    let resolved = resolve_metrics(&record);
    for (name, resolution) in &resolved.trace {
        match &resolution.source {
            Source::Components(parts) => {
                log::debug!("{}: {} = sum of {:?}", email, name, parts);
            }
            source => log::debug!("{}: {} = {} ({:?})", email, name, resolution.value, source),
        }
    }

    let mut metrics = resolved.metrics;
    if suspended {
        metrics.gmail_enabled = false;
    }
    UsageRow::new(email, &metrics)
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
    use adminkit::types::{UsageReport, UsageReportEntry, User};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn opts(max_users: usize) -> UsageOptions {
        UsageOptions {
            max_users,
            report_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            page_delay: Duration::ZERO,
            user_delay: Duration::ZERO,
        }
    }

    fn report(params: serde_json::Value) -> UsageReport {
        UsageReport {
            usage_reports: vec![UsageReportEntry {
                parameters: serde_json::from_value(params).unwrap(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn mock() -> MockWorkspace {
        let mut mock = MockWorkspace::new();
        mock.add_user(User {
            primary_email: "ana@example.com".into(),
            ..Default::default()
        });
        mock.add_user(User {
            primary_email: "bo@example.com".into(),
            suspended: true,
            ..Default::default()
        });
        mock.set_usage_report(
            "ana@example.com",
            report(json!([
                {"name": "accounts:gmail_used_quota_in_mb", "intValue": "512"},
                {"name": "accounts:drive_used_quota_in_mb", "intValue": "100"},
                {"name": "gmail:num_emails_sent", "intValue": "5"},
                {"name": "gmail:num_emails_received", "intValue": 7}
            ])),
        );
        mock
    }

    #[test]
    fn test_options_apply_report_lag() {
        let settings = Settings::default();
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let opts = UsageOptions::new(&settings, 0, today);
        assert_eq!(opts.report_date, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
    }

    #[test]
    fn test_collect_resolves_and_exports() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 10).unwrap();

        let rows = collect(&mock(), &exporter, &opts(0)).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].gmail_storage_mb, 512.0);
        assert_eq!(rows[0].total_storage_mb, 612.0);
        assert_eq!(rows[0].gmail_emails_exchanged, 12);
        assert!(rows[0].is_gmail_enabled);
        assert!(!rows[1].is_gmail_enabled);
        assert!(!rows[1].has_gmail_data);

        assert!(tmp.path().join("workspace_stats_complete.csv").exists());
        let raw = tmp.path().join("raw_data");
        assert!(raw.join("ana_example.com_raw.json").exists());
        assert!(raw.join("ana_example.com_parameters.json").exists());
    }

    #[test]
    fn test_max_users_limits_processing() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 10).unwrap();
        let rows = collect(&mock(), &exporter, &opts(1)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "ana@example.com");
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
        ws.fail_for("list_users", "100", 500);
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 0).unwrap();

        let rows = collect(&ws, &exporter, &opts(100)).unwrap();
        assert_eq!(rows.len(), 100);
        let pages = ws.calls().iter().filter(|c| c.starts_with("list_users")).count();
        assert_eq!(pages, 1);
        assert!(tmp.path().join("workspace_stats_complete.csv").exists());
        assert!(!tmp.path().join("workspace_stats_error.csv").exists());
    }

    #[test]
    fn test_failed_report_gives_zeroed_row() {
        let mut ws = mock();
        ws.fail_for("user_usage_report", "ana@example.com", 403);
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 10).unwrap();

        let row = process_user(&ws, &exporter, "ana@example.com", opts(0).report_date);
        assert_eq!(row.total_storage_mb, 0.0);
        assert!(!row.has_gmail_data);
    }

    #[test]
    fn test_page_failure_writes_error_snapshot() {
        let mut ws = mock();
        ws.fail("list_users", 500);
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 10).unwrap();

        let rows = collect(&ws, &exporter, &opts(0)).unwrap();
        assert!(rows.is_empty());
        assert!(!tmp.path().join("workspace_stats_complete.csv").exists());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let ws = mock();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        collect(&ws, &Exporter::create(first.path(), 10).unwrap(), &opts(0)).unwrap();
        collect(&ws, &Exporter::create(second.path(), 10).unwrap(), &opts(0)).unwrap();

        let a = fs::read(first.path().join("workspace_stats_complete.csv")).unwrap();
        let b = fs::read(second.path().join("workspace_stats_complete.csv")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_partial_snapshots() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 1).unwrap();
        collect(&mock(), &exporter, &opts(0)).unwrap();
        assert!(tmp.path().join("workspace_stats_partial_1.csv").exists());
        assert!(tmp.path().join("workspace_stats_partial_2.csv").exists());
    }
}
