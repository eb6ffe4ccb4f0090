//! Shared drive discovery through several independent methods.

use adminkit::types::{FOLDER_MIME_TYPE, FileQuery, PageRequest, SharedDrive};
use adminkit::{Pager, Workspace, scopes};
use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use std::time::Duration;

use crate::Context;
use crate::cli::FindDrivesArgs;
use crate::commands::shared_drives::check_drive_access;
use crate::commands::{Session, describe};
use crate::export::write_json;
use crate::paths;
use crate::ui;

const DRIVES_PAGE_SIZE: u32 = 100;
const FILES_PAGE_SIZE: u32 = 1000;
const ACTIVITIES_PAGE_SIZE: u32 = 1000;
const SHOWN: usize = 10;

/// Broad search whose hits reveal the drives they live in.
const BROAD_QUERY: &str = "sharedWithMe=true or trashed=false";

#[derive(Debug, Clone)]
pub struct FindOptions {
    pub deep_search: bool,
    /// Start of the audit activity window
    pub activity_since: DateTime<Utc>,
    pub page_delay: Duration,
}

/// Drives found so far, deduplicated by id in discovery order.
#[derive(Debug, Default)]
struct Found {
    drives: Vec<SharedDrive>,
    seen: HashSet<String>,
}

impl Found {
    fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Returns whether the drive was new.
    fn add(&mut self, drive: SharedDrive) -> bool {
        if drive.id.is_empty() || !self.seen.insert(drive.id.clone()) {
            return false;
        }
        self.drives.push(drive);
        true
    }

    fn into_sorted(self) -> Vec<SharedDrive> {
        let mut drives = self.drives;
        drives.sort_by_cached_key(|d| d.name.to_lowercase());
        drives
    }
}

pub fn run(_ctx: &Context, args: FindDrivesArgs) -> Result<()> {
    let session = Session::new(&args.auth)?;
    let settings = &session.settings;
    let opts = FindOptions {
        deep_search: args.deep_search,
        activity_since: Utc::now() - TimeDelta::days(settings.activity_lookback_days),
        page_delay: settings.page_delay(),
    };

    ui::header("Shared Drive Discovery");
    session.print_identity();
    ui::kv("Deep search", &opts.deep_search.to_string());

    let workspace = session.workspace(scopes::FIND_DRIVES)?;
    check_drive_access(&workspace)?;

    let drives = discover(&workspace, &opts);

    ui::section("Results");
    if drives.is_empty() {
        print_troubleshooting();
        return Ok(());
    }

    ui::success(&format!("Total shared drives found: {}", drives.len()));
    let output = paths::expand(&args.output_file);
    write_json(&output, &drives)?;
    ui::info(&format!("Saved results to {}", output.display()));

    println!();
    println!("First {} shared drives found:", SHOWN.min(drives.len()));
    for (i, drive) in drives.iter().take(SHOWN).enumerate() {
        println!("  {}. {} (ID: {})", i + 1, drive.name, drive.id);
    }
    if drives.len() > SHOWN {
        println!(
            "  ...and {} more (see output file for complete list)",
            drives.len() - SHOWN
        );
    }
    Ok(())
}

/// Run every discovery method and merge the results.
///
/// A failing method is reported and the others still run. The result is
/// sorted by lowercased name.
pub fn discover(workspace: &dyn Workspace, opts: &FindOptions) -> Vec<SharedDrive> {
    let mut found = Found::default();

    ui::section("Method 1: Drives API");
    match list_drives(workspace, opts.page_delay) {
        Ok(drives) => {
            let added = drives.into_iter().map(|d| found.add(d)).filter(|&new| new).count();
            report(added, "the drives API");
        }
        Err(e) => ui::warn(&format!("Error listing shared drives: {}", describe(&e))),
    }

    ui::section("Method 2: File metadata");
    match drive_ids_from_files(workspace, BROAD_QUERY) {
        Ok(ids) => {
            ui::info(&format!("Identified {} unique drive IDs from file metadata", ids.len()));
            let added = fetch_drives(workspace, ids, &mut found);
            report(added, "file analysis");
        }
        Err(e) => ui::warn(&format!("Error searching for files: {}", describe(&e))),
    }

    ui::section("Method 3: Drive audit activity");
    match drive_ids_from_activities(workspace, opts.activity_since) {
        Ok(ids) => {
            ui::info(&format!(
                "Extracted {} potential shared drive IDs from activity reports",
                ids.len()
            ));
            let added = fetch_drives(workspace, ids, &mut found);
            report(added, "audit activity");
        }
        Err(e) => {
            ui::warn(&format!("Error reading Drive activities: {}", describe(&e)));
            if e.is_forbidden() {
                ui::dim(&format!("Audit reports need the {} scope", scopes::REPORTS_AUDIT_READONLY));
            }
        }
    }

    if opts.deep_search {
        ui::section("Method 4: Deep file search");
        let ids = deep_search(workspace);
        let added = fetch_drives(workspace, ids, &mut found);
        report(added, "deep search");
    }

    found.into_sorted()
}

/// Plain listing first, then domain-admin visibility on any error.
fn list_drives(workspace: &dyn Workspace, delay: Duration) -> adminkit::Result<Vec<SharedDrive>> {
    let list = |admin: bool| {
        Pager::new(DRIVES_PAGE_SIZE, move |page| workspace.list_drives(page, admin))
            .with_delay(delay)
            .collect_all()
    };
    list(false).or_else(|e| {
        ui::dim(&format!("Plain listing failed ({}), trying domain admin access", describe(&e)));
        list(true)
    })
}

/// Distinct drive ids of the first page of a file search.
fn drive_ids_from_files(workspace: &dyn Workspace, q: &str) -> adminkit::Result<Vec<String>> {
    let files = workspace.list_files(&FileQuery::search(q), &PageRequest::first(FILES_PAGE_SIZE))?;
    log::info!("Search '{}' returned {} files", q, files.items.len());
    let mut ids: Vec<String> = Vec::new();
    for id in files.items.into_iter().filter_map(|f| f.drive_id) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn drive_ids_from_activities(
    workspace: &dyn Workspace,
    since: DateTime<Utc>,
) -> adminkit::Result<Vec<String>> {
    let page = workspace.list_drive_activities(since, &PageRequest::first(ACTIVITIES_PAGE_SIZE))?;
    log::info!("Found {} Drive activities", page.items.len());
    let mut ids: Vec<String> = Vec::new();
    for id in page.items.iter().flat_map(|a| a.drive_ids()) {
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Several narrower searches; a failing strategy is skipped.
fn deep_search(workspace: &dyn Workspace) -> Vec<String> {
    let folders = format!("mimeType='{}'", FOLDER_MIME_TYPE);
    let strategies = [
        ("Files in any shared drive", "driveId!=null"),
        ("Files shared with you", "sharedWithMe=true"),
        ("Folders", folders.as_str()),
    ];

    let mut ids: Vec<String> = Vec::new();
    for (name, q) in strategies {
        ui::info(&format!("Trying search strategy: {}", name));
        match drive_ids_from_files(workspace, q) {
            Ok(found) => {
                for id in found {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                ui::dim(&format!("Identified {} unique drive IDs so far", ids.len()));
            }
            Err(e) => ui::warn(&format!("Search strategy '{}' failed: {}", name, describe(&e))),
        }
    }
    ids
}

/// Resolve unseen ids to drives. Returns how many were added.
fn fetch_drives(workspace: &dyn Workspace, ids: Vec<String>, found: &mut Found) -> usize {
    let mut added = 0;
    for id in ids {
        if found.contains(&id) {
            continue;
        }
        match workspace.get_drive(&id) {
            Ok(drive) => {
                ui::dim(&format!("Found shared drive: {} (ID: {})", drive.name, drive.id));
                if found.add(drive) {
                    added += 1;
                }
            }
            Err(e) => log::warn!("Could not retrieve drive {}: {}", id, describe(&e)),
        }
    }
    added
}

fn report(added: usize, method: &str) {
    if added > 0 {
        ui::success(&format!("Found {} new shared drives through {}", added, method));
    } else {
        ui::dim(&format!("No new shared drives found through {}", method));
    }
}

fn print_troubleshooting() {
    ui::error("No shared drives found with any method.");
    println!();
    println!("Possible reasons:");
    println!("  1. There are genuinely no shared drives in your organization");
    println!("  2. Your admin account doesn't have access to see them");
    println!("  3. API access to shared drives might be restricted by policies");
    println!("  4. Organizational unit restrictions may prevent visibility");
    println!();
    println!("Troubleshooting suggestions:");
    println!("  1. Check whether you can see shared drives at drive.google.com");
    println!("  2. Ensure the admin account is a super administrator with access to all organizational units");
    println!("  3. Check the Admin console for API restrictions");
    println!("  4. Create a test shared drive in the web interface, then run this again");
    println!("  5. Contact Google Workspace support if the issue persists");
}
