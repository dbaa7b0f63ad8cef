//! Bulk import, removal and repository integrity.

use aimgr::core::ResourceKind;
use aimgr::pattern::{Selector, expand};
use aimgr::repository::{BulkImportOptions, IntegrityIssue, discover};
use aimgr::test_utils::{TestRepo, write_agent, write_command, write_skill};
use std::fs;
use tempfile::TempDir;

use crate::common::populated;

/// A directory laid out like a resource collection.
fn collection() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_command(dir.path(), "lint", "Lint the code").unwrap();
    write_command(dir.path(), "db/migrate", "Run migrations").unwrap();
    write_skill(dir.path(), "charts", "Draw charts").unwrap();
    write_agent(dir.path(), "tester", "Writes tests").unwrap();

    fs::create_dir_all(dir.path().join("packages")).unwrap();
    fs::write(
        dir.path().join("packages/tooling.package.json"),
        r#"{"name": "tooling", "description": "Dev tooling", "resources": ["command/lint", "skill/charts"]}"#,
    )
    .unwrap();
    dir
}

#[test]
fn test_bulk_import_discovers_every_kind() {
    let source = collection();
    let repo = TestRepo::new().unwrap();

    let paths = discover(source.path());
    let result = repo.repo().add_bulk(&paths, &BulkImportOptions::default()).unwrap();

    assert!(result.failed.is_empty(), "{:?}", result.failed);
    assert_eq!(result.command_count, 2);
    assert_eq!(result.skill_count, 1);
    assert_eq!(result.agent_count, 1);
    assert_eq!(result.package_count, 1);
    assert!(result.added.contains(&"command/db/migrate".to_string()));
    assert!(repo.repo().exists(ResourceKind::Command, "db/migrate"));
    assert!(repo.repo().package_exists("tooling"));
}

#[test]
fn test_bulk_import_conflicts() {
    let source = collection();
    let repo = TestRepo::new().unwrap();
    let paths = discover(source.path());
    repo.repo().add_bulk(&paths, &BulkImportOptions::default()).unwrap();

    let again = repo.repo().add_bulk(&paths, &BulkImportOptions::default()).unwrap();
    assert_eq!(again.succeeded(), 0);
    assert_eq!(again.failed.len(), paths.len());
    assert!(again.failed[0].message.contains("already exists"));

    let skipped = repo
        .repo()
        .add_bulk(
            &paths,
            &BulkImportOptions {
                skip_existing: true,
                ..BulkImportOptions::default()
            },
        )
        .unwrap();
    assert_eq!(skipped.skipped.len(), paths.len());

    let forced = repo
        .repo()
        .add_bulk(
            &paths,
            &BulkImportOptions {
                force: true,
                ..BulkImportOptions::default()
            },
        )
        .unwrap();
    assert_eq!(forced.updated.len(), paths.len());
    assert!(forced.added.is_empty());
}

#[test]
fn test_bulk_import_dry_run_leaves_store_untouched() {
    let source = collection();
    let repo = TestRepo::new().unwrap();

    let result = repo
        .repo()
        .add_bulk(
            &discover(source.path()),
            &BulkImportOptions {
                dry_run: true,
                ..BulkImportOptions::default()
            },
        )
        .unwrap();

    assert_eq!(result.added.len(), 5);
    assert!(repo.repo().list(None).unwrap().is_empty());
    assert!(!repo.repo().package_exists("tooling"));
}

#[test]
fn test_bulk_import_collects_invalid_items() {
    let source = collection();
    fs::write(source.path().join("agents/broken.md"), "no frontmatter here\n").unwrap();
    let repo = TestRepo::new().unwrap();

    let result = repo
        .repo()
        .add_bulk(&discover(source.path()), &BulkImportOptions::default())
        .unwrap();

    assert_eq!(result.failed.len(), 1);
    assert!(result.failed[0].path.ends_with("agents/broken.md"));
    assert_eq!(result.succeeded(), 5);
}

#[test]
fn test_package_import_requires_members() {
    let source = collection();
    fs::write(
        source.path().join("packages/ghost.package.json"),
        r#"{"name": "ghost", "resources": ["skill/missing"]}"#,
    )
    .unwrap();
    let repo = TestRepo::new().unwrap();

    let result = repo
        .repo()
        .add_bulk(&discover(source.path()), &BulkImportOptions::default())
        .unwrap();

    assert!(repo.repo().package_exists("tooling"));
    assert!(!repo.repo().package_exists("ghost"));
    assert_eq!(result.failed.len(), 1);
}

#[test]
fn test_selectors_expand_over_store() {
    let (repo, _project) = populated();
    let universe = repo.repo().candidates().unwrap();

    let skills = expand("skill/*", &universe).unwrap();
    assert_eq!(skills, vec!["skill/pdf".to_string(), "skill/xlsx".to_string()]);

    let nested = expand("command/api/*", &universe).unwrap();
    assert_eq!(nested, vec!["command/api/deploy".to_string()]);

    assert_eq!(expand("package/web", &universe).unwrap(), vec!["package/web".to_string()]);
    assert!(expand("skill/nothing*", &universe).is_err());
}

#[test]
fn test_remove_resource_and_package() {
    let (repo, _project) = populated();

    repo.repo().remove_package("web").unwrap();
    repo.repo().remove(ResourceKind::Command, "api/deploy").unwrap();

    assert!(!repo.repo().package_exists("web"));
    assert!(!repo.repo().exists(ResourceKind::Command, "api/deploy"));
    assert!(!repo.root().join("commands/api").exists());
    assert!(repo.repo().remove(ResourceKind::Skill, "nope").is_err());
}

#[test]
fn test_integrity_finds_and_fixes_metadata() {
    let (repo, _project) = populated();
    let store = repo.repo();

    fs::remove_file(store.metadata().path_for(ResourceKind::Skill, "pdf")).unwrap();
    fs::remove_file(store.path_for(ResourceKind::Agent, "planner")).unwrap();

    let report = store.check_integrity(None, false).unwrap();
    assert!(report.issues.iter().any(|i| matches!(
        i,
        IntegrityIssue::MissingMetadata { name, .. } if name == "pdf"
    )));
    assert!(report.issues.iter().any(|i| matches!(
        i,
        IntegrityIssue::OrphanedMetadata { name, .. } if name == "planner"
    )));
    assert!(report.has_errors());

    let fixed = store.check_integrity(None, true).unwrap();
    assert_eq!(fixed.fixed, 2);
    assert!(store.check_integrity(None, false).unwrap().is_clean());
}

#[test]
fn test_integrity_respects_selector() {
    let (repo, _project) = populated();
    let store = repo.repo();
    fs::remove_file(store.metadata().path_for(ResourceKind::Skill, "pdf")).unwrap();

    let selector = Selector::parse("command/*").unwrap();
    assert!(store.check_integrity(Some(&selector), false).unwrap().is_clean());
}
