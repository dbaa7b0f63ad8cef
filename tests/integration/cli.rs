//! The `aimgr` binary end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;

use aimgr::test_utils::{TestProject, write_command, write_skill};
use aimgr::tools::Tool;

use crate::common::{aimgr, populated};

#[test]
fn test_install_links_and_records_in_manifest() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["install", "skill/pdf", "command/api/*"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skill/pdf"));

    assert!(project.path().join(".claude/skills/pdf/SKILL.md").exists());
    assert!(project.path().join(".claude/commands/api/deploy.md").exists());

    let manifest = project.manifest().unwrap();
    assert_eq!(
        manifest.resources,
        vec!["skill/pdf".to_string(), "command/api/deploy".to_string()]
    );
}

#[test]
fn test_install_no_save_leaves_manifest_alone() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["install", "--no-save", "agent/planner"])
        .assert()
        .success();

    assert!(project.path().join(".claude/agents/planner.md").exists());
    assert!(!project.manifest_path().exists());
}

#[test]
fn test_install_from_manifest() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["package/web"]).unwrap();

    aimgr(repo.root(), project.path()).arg("install").assert().success();

    assert!(project.path().join(".claude/skills/pdf").exists());
    assert!(project.path().join(".claude/commands/api/deploy.md").exists());
    assert_eq!(project.manifest().unwrap().resources, vec!["package/web".to_string()]);
}

#[test]
fn test_install_without_selectors_or_manifest_fails() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ai.package.yaml"));
}

#[test]
fn test_install_batch_continues_past_failures() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["install", "skill/nope", "skill/xlsx"])
        .assert()
        .success()
        .stderr(predicate::str::contains("skill/nope"));

    assert!(project.path().join(".claude/skills/xlsx").exists());
    assert_eq!(project.manifest().unwrap().resources, vec!["skill/xlsx".to_string()]);
}

#[test]
fn test_install_fails_when_nothing_succeeds() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["install", "skill/nope", "skill/nothing*"])
        .assert()
        .failure();

    assert!(!project.manifest_path().exists());
}

#[test]
fn test_uninstall_removes_link_and_manifest_entry() {
    let (repo, project) = populated();
    aimgr(repo.root(), project.path())
        .args(["install", "skill/pdf", "skill/xlsx"])
        .assert()
        .success();

    aimgr(repo.root(), project.path())
        .args(["uninstall", "skill/pdf"])
        .assert()
        .success();

    assert!(fs::symlink_metadata(project.path().join(".claude/skills/pdf")).is_err());
    assert_eq!(project.manifest().unwrap().resources, vec!["skill/xlsx".to_string()]);
}

#[test]
fn test_list_shows_installed_resources() {
    let (repo, project) = populated();
    aimgr(repo.root(), project.path())
        .args(["install", "--no-save", "skill/pdf"])
        .assert()
        .success();

    aimgr(repo.root(), project.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("skill/pdf").and(predicate::str::contains("claude")));

    aimgr(repo.root(), project.path())
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"declared\": false"));
}

#[test]
fn test_verify_reports_and_fix_repairs() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["skill/pdf"]).unwrap();

    aimgr(repo.root(), project.path())
        .args(["verify", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not-installed"));

    aimgr(repo.root(), project.path())
        .args(["verify", "--fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed skill/pdf"));

    aimgr(repo.root(), project.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_verify_fails_on_broken_link() {
    let (repo, project) = populated();
    aimgr(repo.root(), project.path())
        .args(["install", "skill/xlsx"])
        .assert()
        .success();
    repo.repo()
        .remove(aimgr::core::ResourceKind::Skill, "xlsx")
        .unwrap();

    aimgr(repo.root(), project.path())
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken"));
}

#[test]
fn test_repair_reset_force_removes_unmanaged() {
    let (repo, project) = populated();
    let stray = project.write_file(".claude/commands/stray.md", "mine").unwrap();

    aimgr(repo.root(), project.path())
        .args(["repair", "--reset", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would remove 1"));
    assert!(stray.exists());

    aimgr(repo.root(), project.path())
        .args(["repair", "--reset", "--force"])
        .assert()
        .success();
    assert!(!stray.exists());
}

#[test]
fn test_repair_prune_package_force() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["skill/pdf", "package/ghost"]).unwrap();

    aimgr(repo.root(), project.path())
        .args(["repair", "--prune-package", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package/ghost"));

    assert_eq!(project.manifest().unwrap().resources, vec!["skill/pdf".to_string()]);
}

#[test]
fn test_repair_flags_conflict() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["repair", "--force", "--dry-run"])
        .assert()
        .failure();
}

#[test]
fn test_clean_removes_links() {
    let (repo, project) = populated();
    aimgr(repo.root(), project.path())
        .args(["install", "--no-save", "skill/pdf", "agent/planner"])
        .assert()
        .success();

    aimgr(repo.root(), project.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 link(s)"));

    assert!(fs::symlink_metadata(project.path().join(".claude/skills/pdf")).is_err());
}

#[test]
fn test_repo_import_list_remove() {
    let (repo, project) = populated();
    let source = tempfile::TempDir::new().unwrap();
    write_command(source.path(), "lint", "Lint the code").unwrap();
    write_skill(source.path(), "charts", "Draw charts").unwrap();

    aimgr(repo.root(), project.path())
        .args(["repo", "import"])
        .arg(source.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("command/lint"));

    aimgr(repo.root(), project.path())
        .args(["repo", "list", "skill/*"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skill/charts").and(predicate::str::contains("command/lint").not()));

    aimgr(repo.root(), project.path())
        .args(["repo", "import"])
        .arg(source.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    aimgr(repo.root(), project.path())
        .args(["repo", "remove", "command/lint"])
        .assert()
        .success();
    assert!(!repo.root().join("commands/lint.md").exists());
}

#[test]
fn test_repo_verify_detects_missing_metadata() {
    let (repo, project) = populated();
    fs::remove_file(
        repo.repo()
            .metadata()
            .path_for(aimgr::core::ResourceKind::Agent, "planner"),
    )
    .unwrap();

    // Missing metadata is only a warning
    aimgr(repo.root(), project.path())
        .args(["repo", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("planner"));

    aimgr(repo.root(), project.path())
        .args(["repo", "verify", "--fix"])
        .assert()
        .success();

    aimgr(repo.root(), project.path())
        .args(["repo", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("consistent"));
}

#[test]
#[serial]
fn test_repo_path_from_environment() {
    let (repo, _) = populated();
    let project = TestProject::new().unwrap().with_tool(Tool::OpenCode).unwrap();

    Command::cargo_bin("aimgr")
        .unwrap()
        .args(["-C"])
        .arg(project.path())
        .args(["install", "--no-save", "skill/pdf"])
        .env("AIMGR_REPO_PATH", repo.root())
        .env("AIMGR_CONFIG", project.path().join("missing.toml"))
        .assert()
        .success();

    assert!(project.path().join(".opencode/skills/pdf/SKILL.md").exists());
}

#[test]
fn test_unknown_target_is_rejected() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["install", "--target", "emacs", "skill/pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("emacs"));
}

#[test]
fn test_repo_remove_rejects_names_outside_the_store() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["repo", "remove", "skill/.."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("skill/.."));

    aimgr(repo.root(), project.path())
        .args(["install", "command/../../escape"])
        .assert()
        .failure();

    assert!(repo.root().join("skills/pdf/SKILL.md").exists());
    assert!(repo.root().join("commands/review.md").exists());
    assert!(repo.root().join("agents/planner.md").exists());
}

#[test]
fn test_install_bare_name_records_canonical_reference() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["install", "planner", "skills/xlsx"])
        .assert()
        .success();

    assert!(project.path().join(".claude/agents/planner.md").exists());
    assert_eq!(
        project.manifest().unwrap().resources,
        vec!["agent/planner".to_string(), "skill/xlsx".to_string()]
    );
}

#[test]
fn test_repo_create_package() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["repo", "create-package", "docs", "--description", "Document tools"])
        .args(["skill/pdf", "skill/xlsx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created package/docs (2 resources)"));

    let package = repo.repo().get_package("docs").unwrap();
    assert_eq!(package.description, "Document tools");
    assert_eq!(package.resources, vec!["skill/pdf".to_string(), "skill/xlsx".to_string()]);

    aimgr(repo.root(), project.path())
        .args(["repo", "create-package", "docs", "--description", "Again", "skill/pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    aimgr(repo.root(), project.path())
        .args(["repo", "create-package", "docs", "--description", "Again", "--force", "skill/pdf"])
        .assert()
        .success();
    assert_eq!(repo.repo().get_package("docs").unwrap().resources, vec!["skill/pdf".to_string()]);
}

#[test]
fn test_repo_create_package_with_missing_member_fails() {
    let (repo, project) = populated();

    aimgr(repo.root(), project.path())
        .args(["repo", "create-package", "broken", "--description", "Broken"])
        .args(["skill/pdf", "agent/ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("agent/ghost"));

    assert!(!repo.repo().package_exists("broken"));
}
