//! Groups, memberships, buildings, rooms and equipment.

use adminkit::types::{CalendarResource, Group};
use adminkit::{Pager, Workspace, scopes};
use anyhow::{Context as _, Result};
use std::time::Duration;

use crate::Context;
use crate::cli::DirectoryArgs;
use crate::commands::{Session, describe};
use crate::export::{ExportResult, Exporter, print_summary};
use crate::progress;
use crate::records::{BuildingRow, EquipmentRow, GroupRow, MembershipRow, RoomRow};
use crate::ui;

const DEFAULT_OUTPUT_DIR: &str = "workspace_exports";
const PAGE_SIZE: u32 = 200;

pub const GROUPS_FILE: &str = "groups_export.csv";
pub const MEMBERSHIPS_FILE: &str = "group_memberships_export.csv";
pub const BUILDINGS_FILE: &str = "buildings_export.csv";
pub const ROOMS_FILE: &str = "rooms_export.csv";
pub const EQUIPMENT_FILE: &str = "equipment_export.csv";

pub fn run(ctx: &Context, args: DirectoryArgs) -> Result<()> {
    let session = Session::new(&args.auth)?;
    let settings = &session.settings;
    let domain = settings.domain()?;

    ui::header("Directory Export");
    session.print_identity();
    ui::kv("Domain", &domain);

    let workspace = session.workspace(scopes::DIRECTORY)?;
    let exporter = Exporter::create(
        &settings.output_dir_or(DEFAULT_OUTPUT_DIR),
        settings.snapshot_interval,
    )?;

    let results = export_all(
        ctx,
        &workspace,
        &exporter,
        &domain,
        settings.page_delay(),
    );
    print_summary(&results);
    Ok(())
}

/// Run every directory export. A failing export is reported and the rest
/// still run.
pub fn export_all(
    ctx: &Context,
    workspace: &dyn Workspace,
    exporter: &Exporter,
    domain: &str,
    delay: Duration,
) -> Vec<ExportResult> {
    let mut results = Vec::new();

    ui::step(1, 4, "Exporting groups...");
    let groups = match export_groups(workspace, exporter, domain, delay) {
        Ok((groups, result)) => {
            results.push(result);
            groups
        }
        Err(e) => {
            ui::error(&format!("Error exporting groups: {:#}", e));
            results.push(ExportResult::new("Groups", 0, None));
            Vec::new()
        }
    };

    ui::step(2, 4, "Exporting group memberships...");
    match export_memberships(ctx, workspace, exporter, &groups, delay) {
        Ok(result) => results.push(result),
        Err(e) => {
            ui::error(&format!("Error exporting group memberships: {:#}", e));
            results.push(ExportResult::new("Group Memberships", 0, None));
        }
    }

    ui::step(3, 4, "Exporting buildings...");
    match export_buildings(workspace, exporter, delay) {
        Ok(result) => results.push(result),
        Err(e) => {
            ui::error(&format!("Error exporting buildings: {:#}", e));
            results.push(ExportResult::new("Buildings", 0, None));
        }
    }

    ui::step(4, 4, "Exporting rooms and equipment...");
    match export_resources(workspace, exporter, delay) {
        Ok(pair) => results.extend(pair),
        Err(e) => {
            ui::error(&format!("Error exporting calendar resources: {:#}", e));
            results.push(ExportResult::new("Rooms", 0, None));
            results.push(ExportResult::new("Equipment", 0, None));
        }
    }

    results
}

pub fn export_groups(
    workspace: &dyn Workspace,
    exporter: &Exporter,
    domain: &str,
    delay: Duration,
) -> Result<(Vec<Group>, ExportResult)> {
    let groups = Pager::new(PAGE_SIZE, |page| workspace.list_groups(domain, page))
        .with_delay(delay)
        .collect_all()
        .context("Failed to list groups")?;
    exporter.write_raw("groups_raw", &groups)?;

    let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
    let path = exporter.write_csv(GROUPS_FILE, &rows)?;
    ui::success(&format!("Exported {} groups", rows.len()));
    Ok((groups, ExportResult::new("Groups", rows.len(), path)))
}

/// Whether a group's member listing can be skipped.
///
/// Only a reported count of zero skips; an absent count still fetches.
pub fn has_no_members(group: &Group) -> bool {
    group.direct_members_count == Some(0)
}

pub fn export_memberships(
    ctx: &Context,
    workspace: &dyn Workspace,
    exporter: &Exporter,
    groups: &[Group],
    delay: Duration,
) -> Result<ExportResult> {
    let mut rows = Vec::new();
    let pb = progress::bar(groups.len() as u64, ctx.quiet);

    for group in groups {
        pb.set_message(group.email.clone());
        if has_no_members(group) {
            log::debug!("Skipping {}: no members", group.email);
            pb.inc(1);
            continue;
        }

        let pager = Pager::new(PAGE_SIZE, |page| workspace.list_members(&group.email, page))
            .with_delay(delay);
        for page in pager {
            match page {
                Ok(members) => {
                    rows.extend(members.iter().map(|m| MembershipRow::new(group, m)));
                }
                Err(e) if e.is_not_found() => {
                    progress::note(&pb, &format!("Group not found: {}", group.email));
                    break;
                }
                Err(e) => {
                    progress::note(
                        &pb,
                        &format!("Error fetching members for {}: {}", group.email, describe(&e)),
                    );
                    break;
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let path = exporter.write_csv(MEMBERSHIPS_FILE, &rows)?;
    ui::success(&format!("Exported {} group memberships", rows.len()));
    Ok(ExportResult::new("Group Memberships", rows.len(), path))
}

pub fn export_buildings(
    workspace: &dyn Workspace,
    exporter: &Exporter,
    delay: Duration,
) -> Result<ExportResult> {
    let buildings = Pager::new(PAGE_SIZE, |page| workspace.list_buildings(page))
        .with_delay(delay)
        .collect_all()
        .context("Failed to list buildings")?;
    exporter.write_raw("buildings_raw", &buildings)?;

    let rows: Vec<BuildingRow> = buildings.iter().map(BuildingRow::from).collect();
    let path = exporter.write_csv(BUILDINGS_FILE, &rows)?;
    ui::success(&format!("Exported {} buildings", rows.len()));
    Ok(ExportResult::new("Buildings", rows.len(), path))
}

/// Fetch calendar resources once and split them into rooms and equipment.
pub fn export_resources(
    workspace: &dyn Workspace,
    exporter: &Exporter,
    delay: Duration,
) -> Result<[ExportResult; 2]> {
    let resources = Pager::new(PAGE_SIZE, |page| workspace.list_calendar_resources(page))
        .with_delay(delay)
        .collect_all()
        .context("Failed to list calendar resources")?;
    exporter.write_raw("calendar_resources_raw", &resources)?;

    let (rooms, equipment): (Vec<&CalendarResource>, Vec<&CalendarResource>) =
        resources.iter().partition(|r| r.is_room());

    let room_rows: Vec<RoomRow> = rooms.into_iter().map(RoomRow::from).collect();
    let equipment_rows: Vec<EquipmentRow> = equipment.into_iter().map(EquipmentRow::from).collect();

    let rooms_path = exporter.write_csv(ROOMS_FILE, &room_rows)?;
    let equipment_path = exporter.write_csv(EQUIPMENT_FILE, &equipment_rows)?;
    ui::success(&format!(
        "Exported {} rooms and {} equipment items",
        room_rows.len(),
        equipment_rows.len()
    ));

    Ok([
        ExportResult::new("Rooms", room_rows.len(), rooms_path),
        ExportResult::new("Equipment", equipment_rows.len(), equipment_path),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use adminkit::MockWorkspace;
    use adminkit::types::{Building, Member};
    use std::fs;
    use tempfile::TempDir;

    fn ctx() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    fn group(email: &str, count: Option<i64>) -> Group {
        Group {
            id: format!("id-{}", email),
            email: email.into(),
            name: email.into(),
            direct_members_count: count,
            ..Default::default()
        }
    }

    fn member(email: &str) -> Member {
        Member {
            id: format!("m-{}", email),
            email: email.into(),
            role: "MEMBER".into(),
            member_type: "USER".into(),
            status: "ACTIVE".into(),
        }
    }

    fn resource(id: &str, kind: &str) -> CalendarResource {
        CalendarResource {
            resource_id: id.into(),
            resource_type: kind.into(),
            ..Default::default()
        }
    }

    fn mock() -> MockWorkspace {
        let mut mock = MockWorkspace::new();
        mock.add_group(group("eng@example.com", Some(2)));
        mock.add_group(group("empty@example.com", Some(0)));
        mock.add_group(group("gone@example.com", None));
        mock.set_members(
            "eng@example.com",
            vec![member("a@example.com"), member("b@example.com")],
        );
        mock.add_building(Building {
            building_id: "hq".into(),
            floor_names: vec!["1".into(), "2".into()],
            ..Default::default()
        });
        mock.add_calendar_resource(resource("r1", "Conference Room"));
        mock.add_calendar_resource(resource("r2", "Projector"));
        mock.add_calendar_resource(resource("r3", "Room"));
        mock
    }

    #[test]
    fn test_has_no_members() {
        assert!(has_no_members(&group("x", Some(0))));
        assert!(!has_no_members(&group("x", None)));
        assert!(!has_no_members(&group("x", Some(3))));
    }

    #[test]
    fn test_export_all() {
        let ws = mock();
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 10).unwrap();

        let results = export_all(&ctx(), &ws, &exporter, "example.com", Duration::ZERO);
        let counts: Vec<(&str, usize)> = results
            .iter()
            .map(|r| (r.label.as_str(), r.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Groups", 3),
                ("Group Memberships", 2),
                ("Buildings", 1),
                ("Rooms", 2),
                ("Equipment", 1),
            ]
        );

        // The empty group is never listed; the missing one is a 404.
        let calls = ws.calls();
        assert!(!calls.contains(&"list_members:empty@example.com".to_string()));
        assert!(calls.contains(&"list_members:gone@example.com".to_string()));

        let buildings = fs::read_to_string(tmp.path().join(BUILDINGS_FILE)).unwrap();
        assert_eq!(
            buildings,
            "kind,etags,buildingId,buildingName,description,floorNames\n,,hq,,,\"1,2\"\n"
        );
        assert!(tmp.path().join("raw_data").join("groups_raw.json").exists());
    }

    #[test]
    fn test_failing_export_does_not_stop_others() {
        let mut ws = mock();
        ws.fail("list_groups", 403);
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 10).unwrap();

        let results = export_all(&ctx(), &ws, &exporter, "example.com", Duration::ZERO);
        assert_eq!(results[0].count, 0);
        assert!(results[0].path.is_none());
        assert_eq!(results[2].count, 1);
        assert!(tmp.path().join(ROOMS_FILE).exists());
    }

    #[test]
    fn test_membership_header() {
        let ws = mock();
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::create(tmp.path(), 10).unwrap();
        export_memberships(
            &ctx(),
            &ws,
            &exporter,
            &[group("eng@example.com", Some(2))],
            Duration::ZERO,
        )
        .unwrap();

        let content = fs::read_to_string(tmp.path().join(MEMBERSHIPS_FILE)).unwrap();
        assert!(content.starts_with(
            "Group ID,Group Email,Group Name,Member ID,Member Email,Member Role,Member Type,Member Status\n"
        ));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let ws = mock();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        for dir in [&first, &second] {
            let exporter = Exporter::create(dir.path(), 10).unwrap();
            export_all(&ctx(), &ws, &exporter, "example.com", Duration::ZERO);
        }
        for file in [GROUPS_FILE, MEMBERSHIPS_FILE, ROOMS_FILE, EQUIPMENT_FILE] {
            assert_eq!(
                fs::read(first.path().join(file)).unwrap(),
                fs::read(second.path().join(file)).unwrap()
            );
        }
    }
}
