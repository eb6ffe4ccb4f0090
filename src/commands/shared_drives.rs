//! Shared drives, their permissions and their storage.

use adminkit::types::{FileQuery, SharedDrive};
use adminkit::{Pager, Workspace, scopes};
use anyhow::{Context as _, Result};
use std::thread;
use std::time::Duration;

use crate::Context;
use crate::cli::SharedDrivesArgs;
use crate::commands::{Session, describe, explain};
use crate::export::{ExportResult, Exporter, print_summary};
use crate::progress;
use crate::records::{DriveRow, DriveStorageRow, PermissionRow};
use crate::ui;

const DEFAULT_OUTPUT_DIR: &str = "workspace_exports";
const DRIVES_PAGE_SIZE: u32 = 100;
const PERMISSIONS_PAGE_SIZE: u32 = 100;
const FILES_PAGE_SIZE: u32 = 1000;

pub const DRIVES_FILE: &str = "shared_drives_export.csv";
pub const PERMISSIONS_FILE: &str = "shared_drive_permissions_export.csv";
pub const STORAGE_FILE: &str = "shared_drive_storage_export.csv";

pub fn run(ctx: &Context, args: SharedDrivesArgs) -> Result<()> {
    let session = Session::new(&args.auth)?;
    let settings = &session.settings;

    ui::header("Shared Drive Export");
    session.print_identity();

    let workspace = session.workspace(scopes::SHARED_DRIVES)?;
    check_drive_access(&workspace)?;

    let exporter = Exporter::create(
        &settings.output_dir_or(DEFAULT_OUTPUT_DIR),
        settings.snapshot_interval,
    )?;
    let admin_access = !args.list_my_drives_only;
    let outcome = export_all(ctx, &workspace, &exporter, admin_access, settings.page_delay())?;

    print_summary(&outcome.results);
    println!();
    ui::info(&format!(
        "Total storage used across all shared drives: {:.2} GB",
        outcome.total_storage_mb / 1024.0
    ));
    Ok(())
}

/// `about.get` as a first probe. Failure is fatal.
pub fn check_drive_access(workspace: &dyn Workspace) -> Result<()> {
    ui::info("Testing Drive API access...");
    match workspace.about() {
        Ok(about) => {
            ui::success(&format!("Drive API reachable as {}", about.user.email_address));
            if let Some(limit) = about.storage_quota.limit {
                ui::kv("Storage quota", &ui::format_size(limit.max(0) as u64));
            }
            Ok(())
        }
        Err(e) => {
            explain(&e);
            ui::dim("Verify that:");
            ui::dim("1. The service account has domain-wide delegation enabled");
            ui::dim("2. These scopes are authorized in the Admin console:");
            for scope in scopes::SHARED_DRIVES {
                ui::dim(&format!("   - {}", scope));
            }
            Err(e).context("Failed to access the Drive API")
        }
    }
}

/// List every shared drive.
///
/// With `admin_access`, asks for domain-admin visibility first and retries
/// without it when the service answers 400.
pub fn list_all_drives(
    workspace: &dyn Workspace,
    admin_access: bool,
    delay: Duration,
) -> adminkit::Result<Vec<SharedDrive>> {
    let list = |admin: bool| {
        Pager::new(DRIVES_PAGE_SIZE, move |page| workspace.list_drives(page, admin))
            .with_delay(delay)
            .collect_all()
    };

    if !admin_access {
        return list(false);
    }
    match list(true) {
        Err(e) if e.status_code() == Some(400) => {
            ui::warn("Domain admin access not accepted, retrying without it...");
            list(false)
        }
        other => other,
    }
}

/// Everything one shared-drive run produced.
pub struct SharedDriveOutcome {
    pub results: Vec<ExportResult>,
    pub total_storage_mb: f64,
}

pub fn export_all(
    ctx: &Context,
    workspace: &dyn Workspace,
    exporter: &Exporter,
    admin_access: bool,
    delay: Duration,
) -> Result<SharedDriveOutcome> {
    ui::step(1, 3, "Listing shared drives...");
    let drives = list_all_drives(workspace, admin_access, delay)
        .context("Failed to list shared drives")?;
    if drives.is_empty() {
        ui::warn("No shared drives found. This could mean:");
        ui::dim("- There are no shared drives in this domain");
        ui::dim("- The admin cannot see shared drives");
        ui::dim("- The API scopes are not authorized");
    }
    exporter.write_raw("shared_drives_raw", &drives)?;
    let drive_rows: Vec<DriveRow> = drives.iter().map(DriveRow::from).collect();
    let drives_path = exporter.write_csv(DRIVES_FILE, &drive_rows)?;
    ui::success(&format!("Exported {} shared drives", drive_rows.len()));

    ui::step(2, 3, "Exporting permissions...");
    let permission_rows = collect_permissions(ctx, workspace, &drives, delay);
    let permissions_path = exporter.write_csv(PERMISSIONS_FILE, &permission_rows)?;
    ui::success(&format!("Exported {} permissions", permission_rows.len()));

    ui::step(3, 3, "Measuring storage...");
    let storage_rows = collect_storage(ctx, workspace, &drives, delay);
    let storage_path = exporter.write_csv(STORAGE_FILE, &storage_rows)?;
    let total_storage_mb = storage_rows.iter().map(|r| r.megabytes).sum();

    Ok(SharedDriveOutcome {
        results: vec![
            ExportResult::new("Shared Drives", drive_rows.len(), drives_path),
            ExportResult::new("Shared Drive Permissions", permission_rows.len(), permissions_path),
            ExportResult::new("Shared Drive Storage", storage_rows.len(), storage_path),
        ],
        total_storage_mb,
    })
}

fn collect_permissions(
    ctx: &Context,
    workspace: &dyn Workspace,
    drives: &[SharedDrive],
    delay: Duration,
) -> Vec<PermissionRow> {
    let mut rows = Vec::new();
    let pb = progress::bar(drives.len() as u64, ctx.quiet);
    for (i, drive) in drives.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        pb.set_message(drive.name.clone());
        let pager = Pager::new(PERMISSIONS_PAGE_SIZE, |page| {
            workspace.list_permissions(&drive.id, page)
        })
        .with_delay(delay);
        for page in pager {
            match page {
                Ok(permissions) => {
                    rows.extend(permissions.iter().map(|p| PermissionRow::new(drive, p)));
                }
                Err(e) => {
                    progress::note(
                        &pb,
                        &format!(
                            "Error fetching permissions for {} ({}): {}",
                            drive.name,
                            drive.id,
                            describe(&e)
                        ),
                    );
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    rows
}

/// Bytes used by the drive root plus file and folder counts.
pub fn measure_drive(workspace: &dyn Workspace, drive: &SharedDrive) -> adminkit::Result<DriveStorageRow> {
    let root = workspace.get_file(&drive.id)?;
    let bytes = root.quota_bytes_used.unwrap_or(0).max(0) as u64;

    let query = FileQuery::in_drive(&drive.id);
    let files = Pager::new(FILES_PAGE_SIZE, |page| workspace.list_files(&query, page)).collect_all()?;
    let folders = files.iter().filter(|f| f.is_folder()).count() as u64;

    Ok(DriveStorageRow::new(drive, bytes, files.len() as u64, folders))
}

fn collect_storage(
    ctx: &Context,
    workspace: &dyn Workspace,
    drives: &[SharedDrive],
    delay: Duration,
) -> Vec<DriveStorageRow> {
    let pb = progress::bar(drives.len() as u64, ctx.quiet);
    let mut rows = Vec::with_capacity(drives.len());
    for (i, drive) in drives.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        pb.set_message(drive.name.clone());
        let row = match measure_drive(workspace, drive) {
            Ok(row) => row,
            Err(e) => {
                progress::note(
                    &pb,
                    &format!(
                        "Error fetching storage for {} ({}): {}",
                        drive.name,
                        drive.id,
                        describe(&e)
                    ),
                );
                DriveStorageRow::failed(drive, describe(&e))
            }
        };
        rows.push(row);
        pb.inc(1);
    }
    pb.finish_and_clear();
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use adminkit::MockWorkspace;
    use adminkit::types::{About, DriveUser, File, FOLDER_MIME_TYPE, Permission, StorageQuota};
    use std::fs;
    use tempfile::TempDir;

    fn ctx() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    fn drive(id: &str, name: &str) -> SharedDrive {
        SharedDrive {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn file(id: &str, drive_id: &str, folder: bool) -> File {
        File {
            id: id.into(),
            drive_id: Some(drive_id.into()),
            mime_type: if folder {
                FOLDER_MIME_TYPE.into()
            } else {
                "text/plain".into()
            },
            ..Default::default()
        }
    }

    fn mock() -> MockWorkspace {
        let mut mock = MockWorkspace::new();
        mock.add_drive(drive("d1", "Finance"));
        mock.add_drive(drive("d2", "Legal"));
        mock.add_permission(
            "d1",
            Permission {
                id: "p1".into(),
                permission_type: "user".into(),
                email_address: "cfo@example.com".into(),
                role: "organizer".into(),
                ..Default::default()
            },
        );
        mock.add_file(File {
            id: "d1".into(),
            quota_bytes_used: Some(3 * 1024 * 1024),
            ..Default::default()
        });
        mock.add_file(file("f1", "d1", true));
        mock.add_file(file("f2", "d1", false));
        mock.add_file(file("f3", "d1", false));
        mock
    }

    #[test]
    fn test_list_retries_without_admin_access_on_400() {
        let mut ws = mock();
        ws.fail_for("list_drives", "admin", 400);
        let drives = list_all_drives(&ws, true, Duration::ZERO).unwrap();
        assert_eq!(drives.len(), 2);
        assert_eq!(ws.calls(), vec!["list_drives:admin", "list_drives:user"]);
    }

    #[test]
    fn test_list_other_errors_propagate() {
        let mut ws = mock();
        ws.fail_for("list_drives", "admin", 403);
        assert!(list_all_drives(&ws, true, Duration::ZERO).is_err());
    }

    #[test]
    fn test_my_drives_only_never_uses_admin_access() {
        let ws = mock();
        list_all_drives(&ws, false, Duration::ZERO).unwrap();
        assert_eq!(ws.calls(), vec!["list_drives:user"]);
    }

    #[test]
    fn test_measure_drive() {
        let ws = mock();
        let row = measure_drive(&ws, &drive("d1", "Finance")).unwrap();
        assert_eq!(row.bytes, 3 * 1024 * 1024);
        assert_eq!(row.megabytes, 3.0);
        assert_eq!(row.total_files, 3);
        assert_eq!(row.folder_count, 1);
        assert_eq!(row.document_count, 2);
    }

    #[test]
    fn test_export_all_with_failing_drive() {
        let ws = mock();
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 10).unwrap();

        let outcome = export_all(&ctx(), &ws, &exporter, true, Duration::ZERO).unwrap();
        let counts: Vec<usize> = outcome.results.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![2, 1, 2]);
        assert_eq!(outcome.total_storage_mb, 3.0);

        // d2 has no root metadata, so it gets a zeroed row with the error
        let storage = fs::read_to_string(tmp.path().join(STORAGE_FILE)).unwrap();
        let last = storage.lines().last().unwrap();
        assert!(last.starts_with("d2,Legal,0,0.0,0,0,0,HTTP 404"));
        assert!(tmp.path().join("raw_data").join("shared_drives_raw.json").exists());
    }

    #[test]
    fn test_drive_access_with_quota() {
        let mut ws = mock();
        ws.set_about(About {
            user: DriveUser {
                display_name: "Admin".into(),
                email_address: "admin@example.com".into(),
            },
            storage_quota: StorageQuota {
                limit: Some(15 * 1024 * 1024 * 1024),
                usage: Some(1024),
            },
        });
        check_drive_access(&ws).unwrap();
        assert!(ws.calls().contains(&"about".to_string()));
    }

    #[test]
    fn test_about_failure_is_fatal() {
        let mut ws = mock();
        ws.fail("about", 401);
        assert!(check_drive_access(&ws).is_err());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let ws = mock();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        for dir in [&first, &second] {
            let exporter = Exporter::create(dir.path(), 10).unwrap();
            export_all(&ctx(), &ws, &exporter, true, Duration::ZERO).unwrap();
        }
        for file in [DRIVES_FILE, PERMISSIONS_FILE, STORAGE_FILE] {
            assert_eq!(
                fs::read(first.path().join(file)).unwrap(),
                fs::read(second.path().join(file)).unwrap()
            );
        }
    }
}
