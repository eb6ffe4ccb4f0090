//! Look up one shared drive by id.

use adminkit::types::{File, FileQuery, PageRequest, SharedDrive};
use adminkit::{Workspace, scopes};
use anyhow::{Context as _, Result};

use crate::Context;
use crate::cli::DriveInfoArgs;
use crate::commands::{Session, describe};
use crate::ui;

const FILES_PAGE_SIZE: u32 = 100;
const DRIVES_PAGE_SIZE: u32 = 50;
const SHOWN: usize = 10;

pub fn run(_ctx: &Context, args: DriveInfoArgs) -> Result<()> {
    let session = Session::new(&args.auth)?;
    ui::header("Shared Drive Details");
    session.print_identity();

    let workspace = session.workspace(scopes::SHARED_DRIVES)?;
    show(&workspace, &args.drive_id)
}

/// Print a drive and a sample of its files.
///
/// When the drive cannot be read, explains the failure, lists the drives
/// the caller can see and returns the error.
pub fn show(workspace: &dyn Workspace, drive_id: &str) -> Result<()> {
    ui::info(&format!("Retrieving shared drive {}", drive_id));
    let drive = match workspace.get_drive(drive_id) {
        Ok(drive) => drive,
        Err(e) => {
            ui::error(&format!("Could not retrieve shared drive {}: {}", drive_id, describe(&e)));
            print_failure_reasons(&e);
            list_visible_drives(workspace);
            return Err(e).context(format!("Failed to get shared drive {}", drive_id));
        }
    };

    print_drive(&drive);

    ui::section("Files");
    let query = FileQuery::in_drive(&drive.id);
    match workspace.list_files(&query, &PageRequest::first(FILES_PAGE_SIZE)) {
        Ok(page) if page.items.is_empty() => ui::dim("No files found in this shared drive"),
        Ok(page) => {
            ui::success(&format!("Found {} files", page.items.len()));
            for (i, line) in file_lines(&page.items).iter().take(SHOWN).enumerate() {
                println!("  {}. {}", i + 1, line);
            }
            if page.items.len() > SHOWN {
                println!("  ...and {} more files", page.items.len() - SHOWN);
            }
        }
        Err(e) => ui::warn(&format!("Could not list files: {}", describe(&e))),
    }
    Ok(())
}

fn print_drive(drive: &SharedDrive) {
    ui::kv("Name", &drive.name);
    ui::kv("ID", &drive.id);
    ui::kv("Created", non_empty(&drive.created_time));
    ui::kv("Hidden", &drive.hidden.to_string());
    if !drive.restrictions.is_empty() {
        println!("  Restrictions:");
        for (key, value) in &drive.restrictions {
            println!("    - {}: {}", key, value);
        }
    }
}

/// `name (mime) - Owner: display name` per file.
pub fn file_lines(files: &[File]) -> Vec<String> {
    files
        .iter()
        .map(|f| {
            let owner = f
                .owners
                .first()
                .map_or("Unknown", |o| non_empty(&o.display_name));
            format!("{} ({}) - Owner: {}", f.name, f.mime_type, owner)
        })
        .collect()
}

fn non_empty(s: &str) -> &str {
    if s.is_empty() { "Unknown" } else { s }
}

fn print_failure_reasons(err: &adminkit::Error) {
    println!();
    if err.is_not_found() {
        println!("This shared drive doesn't exist or the admin doesn't have access to it.");
        println!("Possible reasons:");
        println!("  1. The drive ID is incorrect");
        println!("  2. The drive has been deleted");
        println!("  3. The admin user doesn't have access to this drive");
    } else if err.is_forbidden() {
        println!("Permission denied to access this shared drive.");
        println!("Possible reasons:");
        println!("  1. The service account doesn't have sufficient permissions");
        println!("  2. The admin user doesn't have access to this drive");
    } else {
        ui::dim("Check that the Drive API is enabled and the service account is configured.");
    }
}

fn list_visible_drives(workspace: &dyn Workspace) {
    println!();
    ui::info("Listing shared drives to find valid IDs...");
    match workspace.list_drives(&PageRequest::first(DRIVES_PAGE_SIZE), false) {
        Ok(page) if page.items.is_empty() => ui::dim("No shared drives found."),
        Ok(page) => {
            ui::success(&format!("Found {} shared drives:", page.items.len()));
            for drive in &page.items {
                println!("  - {} (ID: {})", drive.name, drive.id);
            }
        }
        Err(e) => ui::warn(&format!("Could not list shared drives: {}", describe(&e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adminkit::MockWorkspace;
    use adminkit::types::Owner;

    fn mock() -> MockWorkspace {
        let mut ws = MockWorkspace::new();
        ws.add_drive(SharedDrive {
            id: "d1".into(),
            name: "Finance".into(),
            created_time: "2023-01-01T00:00:00Z".into(),
            ..Default::default()
        });
        ws.add_file(File {
            id: "f1".into(),
            name: "Budget".into(),
            mime_type: "application/vnd.google-apps.spreadsheet".into(),
            drive_id: Some("d1".into()),
            owners: vec![Owner {
                display_name: "Ana".into(),
                email_address: "ana@example.com".into(),
            }],
            ..Default::default()
        });
        ws
    }

    #[test]
    fn test_show_lists_drive_files() {
        let ws = mock();
        show(&ws, "d1").unwrap();
        assert!(ws.calls().contains(&"list_files:d1".to_string()));
        assert!(!ws.calls().iter().any(|c| c.starts_with("list_drives")));
    }

    #[test]
    fn test_missing_drive_lists_visible_drives() {
        let ws = mock();
        assert!(show(&ws, "nope").is_err());
        assert!(ws.calls().contains(&"list_drives:user".to_string()));
    }

    #[test]
    fn test_file_lines() {
        let files = vec![
            File {
                name: "Budget".into(),
                mime_type: "text/csv".into(),
                owners: vec![Owner {
                    display_name: "Ana".into(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            File {
                name: "Notes".into(),
                mime_type: "text/plain".into(),
                ..Default::default()
            },
        ];
        assert_eq!(
            file_lines(&files),
            vec![
                "Budget (text/csv) - Owner: Ana",
                "Notes (text/plain) - Owner: Unknown"
            ]
        );
    }
}
