//! Grant a principal a role on every shared drive.

use adminkit::types::{NewPermission, Permission, SharedDrive};
use adminkit::{Pager, Workspace, scopes};
use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;

use crate::Context;
use crate::cli::GrantArgs;
use crate::commands::shared_drives::list_all_drives;
use crate::commands::{Session, describe};
use crate::progress;
use crate::ui;

const PERMISSIONS_PAGE_SIZE: u32 = 100;

/// What granting a role on one drive takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantPlan {
    /// The principal already holds the role.
    NoOp,
    /// The principal holds another role; change it in place.
    Update { permission_id: String, from: String },
    /// The principal has no permission yet.
    Create,
}

/// Decide how to give `grantee` the `role` given a drive's permissions.
///
/// Emails compare case-insensitively. Deleted permissions are ignored.
pub fn plan_grant(existing: &[Permission], grantee: &str, role: &str) -> GrantPlan {
    let current = existing
        .iter()
        .filter(|p| !p.deleted)
        .find(|p| p.email_address.eq_ignore_ascii_case(grantee));
    match current {
        Some(p) if p.role == role => GrantPlan::NoOp,
        Some(p) => GrantPlan::Update {
            permission_id: p.id.clone(),
            from: p.role.clone(),
        },
        None => GrantPlan::Create,
    }
}

#[derive(Debug, Clone)]
pub struct GrantOptions {
    pub grantee: String,
    /// API role name
    pub role: String,
    pub dry_run: bool,
}

/// Counts over one grant run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantSummary {
    pub drives: usize,
    pub no_ops: usize,
    pub updates: usize,
    pub creations: usize,
    pub failures: usize,
}

impl GrantSummary {
    fn record(&mut self, plan: &GrantPlan) {
        match plan {
            GrantPlan::NoOp => self.no_ops += 1,
            GrantPlan::Update { .. } => self.updates += 1,
            GrantPlan::Create => self.creations += 1,
        }
    }

    pub fn print(&self, dry_run: bool) {
        ui::section("Summary");
        ui::kv("Total shared drives", &self.drives.to_string());
        ui::kv("Already granted", &self.no_ops.to_string());
        ui::kv("Updated", &self.updates.to_string());
        ui::kv("Added", &self.creations.to_string());
        ui::kv("Failed", &self.failures.to_string());
        if dry_run {
            println!();
            ui::info("DRY RUN: no changes were made.");
        }
    }
}

pub fn run(ctx: &Context, args: GrantArgs) -> Result<()> {
    let session = Session::new(&args.auth)?;
    let grantee = args
        .grantee
        .clone()
        .unwrap_or_else(|| session.admin_email.clone());
    let opts = GrantOptions {
        grantee,
        role: args.role.api_name().to_string(),
        dry_run: args.dry_run,
    };

    ui::header("Grant Shared Drive Access");
    ui::kv("Grantee", &opts.grantee);
    ui::kv("Role", &opts.role);
    ui::kv("Dry run", &opts.dry_run.to_string());

    let workspace = session.workspace(scopes::SHARED_DRIVES)?;
    ui::info("Retrieving all shared drives...");
    let drives = list_all_drives(&workspace, false, session.settings.page_delay())?;
    if drives.is_empty() {
        ui::warn("No shared drives found.");
        return Ok(());
    }
    ui::info(&format!("Found {} shared drives to process", drives.len()));

    if !args.yes && !opts.dry_run && !confirm_proceed(&opts, drives.len())? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let summary = grant_all(ctx, &workspace, &drives, &opts);
    summary.print(opts.dry_run);
    Ok(())
}

fn confirm_proceed(opts: &GrantOptions, count: usize) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Grant {} the {} role on {} shared drives?",
            opts.grantee, opts.role, count
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Apply the grant to each drive. A failing drive is counted and skipped.
pub fn grant_all(
    ctx: &Context,
    workspace: &dyn Workspace,
    drives: &[SharedDrive],
    opts: &GrantOptions,
) -> GrantSummary {
    let mut summary = GrantSummary {
        drives: drives.len(),
        ..Default::default()
    };

    let pb = progress::bar(drives.len() as u64, ctx.quiet);
    for drive in drives {
        pb.set_message(drive.name.clone());
        match grant_drive(workspace, drive, opts) {
            Ok((plan, msg)) => {
                progress::note(&pb, &msg);
                summary.record(&plan);
            }
            Err(e) => {
                progress::note(
                    &pb,
                    &format!("Error granting access on '{}': {}", drive.name, describe(&e)),
                );
                summary.failures += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    summary
}

/// Plan and, unless dry-running, apply the grant on one drive.
///
/// Returns the plan with a line describing what happened.
pub fn grant_drive(
    workspace: &dyn Workspace,
    drive: &SharedDrive,
    opts: &GrantOptions,
) -> adminkit::Result<(GrantPlan, String)> {
    let existing = Pager::new(PERMISSIONS_PAGE_SIZE, |page| {
        workspace.list_permissions(&drive.id, page)
    })
    .collect_all()?;

    let plan = plan_grant(&existing, &opts.grantee, &opts.role);
    let (who, role, name) = (&opts.grantee, &opts.role, &drive.name);
    let msg = match (&plan, opts.dry_run) {
        (GrantPlan::NoOp, _) => format!("{} already has {} role on '{}'", who, role, name),
        (GrantPlan::Update { from, .. }, true) => {
            format!("DRY RUN: Would update {} from {} to {} on '{}'", who, from, role, name)
        }
        (GrantPlan::Create, true) => {
            format!("DRY RUN: Would add {} as {} to '{}'", who, role, name)
        }
        (GrantPlan::Update { permission_id, from }, false) => {
            workspace.update_permission(&drive.id, permission_id, role)?;
            format!("Updated {} from {} to {} on '{}'", who, from, role, name)
        }
        (GrantPlan::Create, false) => {
            workspace.create_permission(&drive.id, &NewPermission::user(who.clone(), role.clone()))?;
            format!("Added {} as {} to '{}'", who, role, name)
        }
    };
    log::info!("{}", msg);
    Ok((plan, msg))
}
