//! Service account connectivity checks, one scope at a time.

use adminkit::types::{FileQuery, PageRequest};
use adminkit::{HttpWorkspace, ServiceAccountKey, Workspace, scopes};
use anyhow::{Context as _, Result, bail};
use chrono::{Local, NaiveDate, TimeDelta};

use crate::Context;
use crate::cli::DiagnoseArgs;
use crate::commands::Session;
use crate::ui;

/// Inputs shared by every probe.
#[derive(Debug, Clone)]
pub struct Probe {
    pub admin_email: String,
    pub report_date: NaiveDate,
}

/// One API checked with credentials holding a single scope.
pub struct Scenario {
    pub name: &'static str,
    pub scope: &'static str,
    check: fn(&dyn Workspace, &Probe) -> adminkit::Result<String>,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "Directory API users",
        scope: scopes::DIRECTORY_USER_READONLY,
        check: check_directory_users,
    },
    Scenario {
        name: "Drive API basic access",
        scope: scopes::DRIVE_METADATA_READONLY,
        check: check_drive_about,
    },
    Scenario {
        name: "Drive API files",
        scope: scopes::DRIVE_READONLY,
        check: check_drive_files,
    },
    Scenario {
        name: "Drive API shared drives",
        scope: scopes::DRIVE,
        check: check_shared_drives,
    },
    Scenario {
        name: "Reports API usage",
        scope: scopes::REPORTS_USAGE_READONLY,
        check: check_usage_reports,
    },
];

fn check_directory_users(ws: &dyn Workspace, _: &Probe) -> adminkit::Result<String> {
    let page = ws.list_users(&PageRequest::first(1))?;
    Ok(format!("Listed {} users", page.items.len()))
}

fn check_drive_about(ws: &dyn Workspace, _: &Probe) -> adminkit::Result<String> {
    let about = ws.about()?;
    Ok(format!("Accessed Drive API as {}", about.user.email_address))
}

fn check_drive_files(ws: &dyn Workspace, _: &Probe) -> adminkit::Result<String> {
    let page = ws.list_files(&FileQuery::default(), &PageRequest::first(10))?;
    Ok(format!("Listed {} files", page.items.len()))
}

// Only drives.list is tried; there is no fallback to the legacy teamdrives.list endpoint.
fn check_shared_drives(ws: &dyn Workspace, _: &Probe) -> adminkit::Result<String> {
    let page = ws.list_drives(&PageRequest::first(10), false)?;
    Ok(format!("Listed {} shared drives", page.items.len()))
}

fn check_usage_reports(ws: &dyn Workspace, probe: &Probe) -> adminkit::Result<String> {
    let report = ws.user_usage_report(&probe.admin_email, probe.report_date)?;
    Ok(format!(
        "Read {} usage parameters for {}",
        report.parameters().count(),
        probe.report_date
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

pub fn run(_ctx: &Context, args: DiagnoseArgs) -> Result<()> {
    let session = Session::new(&args.auth)?;
    let key = ServiceAccountKey::from_file(&session.key_path).with_context(|| {
        format!(
            "Failed to read service account key {}",
            session.key_path.display()
        )
    })?;

    ui::header("Service Account Diagnostics");
    ui::kv("Service account", &key.client_email);
    ui::kv("Client ID", &key.client_id);
    ui::kv("Project ID", &key.project_id);
    ui::kv("Admin email", &session.admin_email);

    let probe = Probe {
        admin_email: session.admin_email.clone(),
        report_date: Local::now().date_naive()
            - TimeDelta::days(session.settings.report_lag_days),
    };
    let connect = |wanted: &[&str]| -> Result<Box<dyn Workspace>> {
        let workspace = HttpWorkspace::new(session.credentials(wanted)?);
        workspace.authenticate()?;
        Ok(Box::new(workspace))
    };

    let outcomes = run_scenarios(connect, &probe);
    print_summary(&outcomes);

    let failed = outcomes.iter().filter(|o| !o.passed).count();
    if failed > 0 {
        print_troubleshooting(&key.client_id);
        bail!("{} of {} checks failed", failed, outcomes.len());
    }
    print_all_passed();
    Ok(())
}

/// Run every scenario with its own client.
///
/// `connect` builds an authenticated client for a scope list. A client
/// that cannot be built fails its scenario only.
pub fn run_scenarios<F>(connect: F, probe: &Probe) -> Vec<Outcome>
where
    F: Fn(&[&str]) -> Result<Box<dyn Workspace>>,
{
    SCENARIOS
        .iter()
        .map(|scenario| {
            ui::section(scenario.name);
            ui::dim(scenario.scope);
            let result = connect(&[scenario.scope]).and_then(|ws| {
                (scenario.check)(ws.as_ref(), probe).map_err(anyhow::Error::from)
            });
            let outcome = match result {
                Ok(detail) => Outcome {
                    name: scenario.name,
                    passed: true,
                    detail,
                },
                Err(e) => Outcome {
                    name: scenario.name,
                    passed: false,
                    detail: format!("{:#}", e),
                },
            };
            ui::pass_fail(outcome.passed, &outcome.detail);
            outcome
        })
        .collect()
}

fn print_summary(outcomes: &[Outcome]) {
    ui::section("Summary");
    for outcome in outcomes {
        let status = if outcome.passed { "PASS" } else { "FAIL" };
        println!("  {} - {}", status, outcome.name);
    }
}

fn print_troubleshooting(client_id: &str) {
    ui::section("Troubleshooting");
    println!("Some checks failed. Check the following:");
    println!("1. In the Google Admin console (admin.google.com):");
    println!("   - Open Security > API Controls > Domain-wide Delegation");
    println!("   - Make sure this client ID is listed: {}", client_id);
    println!("   - Make sure all of these scopes are authorized (copy the whole line):");
    println!("     {}", scopes::all().join(","));
    println!("2. In the Google Cloud console (console.cloud.google.com):");
    println!("   - Open IAM & Admin > Service Accounts and make sure the account is enabled");
    println!("   - Open APIs & Services and make sure the Drive API, Gmail API and Admin SDK are enabled");
    println!("3. In the domain settings:");
    println!("   - Make sure shared drives are enabled for your organization");
}

fn print_all_passed() {
    println!();
    ui::success("All checks passed. The service account is correctly configured.");
    ui::dim("If shared drives still don't show up:");
    ui::dim("1. There may be no shared drives in your organization");
    ui::dim("2. The admin user may not have access to any shared drives");
    ui::dim("3. Organizational policies may be restricting access");
}
