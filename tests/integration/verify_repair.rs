//! Verification issues and what repair does with each of them.

use aimgr::core::{ResourceId, ResourceKind};
use aimgr::installer::Installer;
use aimgr::repair::Repairer;
use aimgr::test_utils::{TestProject, TestRepo};
use aimgr::tools::Tool;
use aimgr::verify::{IssueKind, IssueSubject, Severity, Verifier, VerifyMode};
use std::fs;
use std::os::unix::fs::symlink;

use crate::common::populated;

fn verifier(repo: &TestRepo, project: &TestProject) -> Verifier {
    Verifier::new(project.path(), repo.root(), Tool::detect_existing(project.path()))
}

fn repairer<'a>(repo: &'a TestRepo, project: &TestProject) -> Repairer<'a> {
    Repairer::new(project.path(), repo.repo(), Tool::detect_existing(project.path()))
}

fn kinds(report: &aimgr::verify::VerifyReport) -> Vec<IssueKind> {
    report.issues().iter().map(|i| i.kind).collect()
}

#[test]
fn test_clean_project_after_manifest_install() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["package/web", "agent/planner"]).unwrap();

    let installer = Installer::new(project.path(), vec![Tool::Claude]);
    installer.install_package(repo.repo(), "web").unwrap();
    installer
        .install(repo.repo(), &ResourceId::new(ResourceKind::Agent, "planner"))
        .unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert!(report.is_clean(), "{:?}", report.issues());
}

#[test]
fn test_no_tools_means_nothing_to_verify() {
    let repo = TestRepo::new().unwrap();
    let project = TestProject::new().unwrap().with_manifest(&["skill/pdf"]).unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert!(report.is_clean());
}

#[test]
fn test_declared_but_not_installed_is_installed_by_repair() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["skill/pdf"]).unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert_eq!(kinds(&report), vec![IssueKind::NotInstalled]);
    assert_eq!(report.issues()[0].tool, "any");
    assert_eq!(report.issues()[0].severity, Severity::Warning);

    let result = repairer(&repo, &project).repair(report.issues());
    assert_eq!(result.summary.fixed, 1);
    assert!(project.path().join(".claude/skills/pdf/SKILL.md").exists());

    let after = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert!(after.is_clean(), "{:?}", after.issues());
}

#[test]
fn test_partial_package_report_versus_repair_mode() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["package/web"]).unwrap();
    Installer::new(project.path(), vec![Tool::Claude])
        .install(repo.repo(), &ResourceId::new(ResourceKind::Skill, "pdf"))
        .unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert_eq!(report.issues().len(), 1);
    let issue = &report.issues()[0];
    assert_eq!(issue.kind, IssueKind::PartialPackage);
    assert_eq!(issue.subject, IssueSubject::Package("web".to_string()));
    assert!(issue.description.contains("1 of 2"), "{}", issue.description);

    // Partial packages only get a hint
    let hinted = repairer(&repo, &project).repair(report.issues());
    assert_eq!(hinted.summary.hints, 1);
    assert_eq!(hinted.summary.fixed, 0);

    let expanded = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Repair).unwrap();
    assert_eq!(kinds(&expanded), vec![IssueKind::NotInstalled]);
    assert_eq!(
        expanded.issues()[0].subject,
        IssueSubject::Resource(ResourceId::new(ResourceKind::Command, "api/deploy"))
    );

    let result = repairer(&repo, &project).repair(expanded.issues());
    assert_eq!(result.summary.fixed, 1);
    assert!(project.path().join(".claude/commands/api/deploy.md").exists());
}

#[test]
fn test_missing_package_gets_prune_hint() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["package/ghost"]).unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Repair).unwrap();
    assert_eq!(kinds(&report), vec![IssueKind::NotInstalled]);
    assert_eq!(report.issues()[0].subject, IssueSubject::Package("ghost".to_string()));

    let result = repairer(&repo, &project).repair(report.issues());
    assert_eq!(result.summary.hints, 1);
    assert!(result.hints[0].description.contains("--prune-package"));
}

#[test]
fn test_broken_link_to_removed_resource_fails_repair() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude]);
    installer
        .install(repo.repo(), &ResourceId::new(ResourceKind::Skill, "xlsx"))
        .unwrap();
    repo.repo().remove(ResourceKind::Skill, "xlsx").unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert_eq!(kinds(&report), vec![IssueKind::Broken]);
    assert!(report.has_errors());

    let result = repairer(&repo, &project).repair(report.issues());
    assert_eq!(result.summary.failed, 1);
    assert!(result.failed[0].description.contains("no longer exists"));
    // The dangling link is gone either way
    assert!(fs::symlink_metadata(project.path().join(".claude/skills/xlsx")).is_err());
}

#[test]
fn test_link_into_other_store_is_relinked() {
    let (repo, project) = populated();
    let other = TestRepo::new().unwrap();
    other.add_skill("pdf", "Another copy").unwrap();

    let link = project.path().join(".claude/skills/pdf");
    fs::create_dir_all(link.parent().unwrap()).unwrap();
    symlink(other.repo().path_for(ResourceKind::Skill, "pdf"), &link).unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert_eq!(kinds(&report), vec![IssueKind::WrongRepo]);
    assert_eq!(report.issues()[0].tool, "claude");

    let result = repairer(&repo, &project).repair(report.issues());
    assert_eq!(result.summary.fixed, 1);
    assert_eq!(fs::read_link(&link).unwrap(), repo.repo().path_for(ResourceKind::Skill, "pdf"));
}

#[test]
fn test_orphans_are_reported_but_kept() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["skill/pdf"]).unwrap();
    let installer = Installer::new(project.path(), vec![Tool::Claude]);
    installer
        .install(repo.repo(), &ResourceId::new(ResourceKind::Skill, "pdf"))
        .unwrap();
    installer
        .install(repo.repo(), &ResourceId::new(ResourceKind::Command, "review"))
        .unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert_eq!(kinds(&report), vec![IssueKind::Orphaned]);
    assert_eq!(report.issues()[0].subject.to_string(), "command/review");

    let result = repairer(&repo, &project).repair(report.issues());
    assert_eq!(result.summary.hints, 1);
    assert!(result.hints[0].description.contains("aimgr uninstall command/review"));
    assert!(project.path().join(".claude/commands/review.md").exists());
}

#[test]
fn test_no_manifest_skips_sync_and_orphans() {
    let (repo, project) = populated();
    Installer::new(project.path(), vec![Tool::Claude])
        .install(repo.repo(), &ResourceId::new(ResourceKind::Command, "review"))
        .unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert!(report.is_clean());
}

#[test]
fn test_scan_issue_suppresses_duplicate_not_installed() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["skill/pdf"]).unwrap();
    let link = project.path().join(".claude/skills/pdf");
    fs::create_dir_all(link.parent().unwrap()).unwrap();
    symlink(project.path().join("nowhere"), &link).unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert_eq!(kinds(&report), vec![IssueKind::Broken]);

    let result = repairer(&repo, &project).repair(report.issues());
    assert_eq!(result.summary.fixed, 1);
    assert!(link.join("SKILL.md").exists());
}

#[test]
fn test_kind_no_tool_supports_is_reported_and_fails_repair() {
    let repo = TestRepo::new().unwrap();
    repo.add_command("build", "Build it").unwrap();
    repo.add_skill("pdf", "PDF tools").unwrap();
    repo.add_package("web", &["skill/pdf", "command/build"]).unwrap();
    let project = TestProject::new()
        .unwrap()
        .with_tool(Tool::Copilot)
        .unwrap()
        .with_manifest(&["command/build", "package/web"])
        .unwrap();
    Installer::new(project.path(), vec![Tool::Copilot])
        .install(repo.repo(), &ResourceId::new(ResourceKind::Skill, "pdf"))
        .unwrap();

    let report = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Report).unwrap();
    assert_eq!(kinds(&report), vec![IssueKind::NotInstalled, IssueKind::PartialPackage]);
    assert!(report.issues()[1].description.contains("1 of 2"));

    let expanded = verifier(&repo, &project).verify(repo.repo(), VerifyMode::Repair).unwrap();
    assert_eq!(kinds(&expanded), vec![IssueKind::NotInstalled]);

    let result = repairer(&repo, &project).repair(expanded.issues());
    assert_eq!(result.summary.failed, 1);
    assert!(result.failed[0].description.contains("No target tool supports commands"));
}
