//! Installing, uninstalling, listing and cleaning links through the library.

use aimgr::core::{AimgrError, ResourceId, ResourceKind};
use aimgr::installer::{Installer, LinkAction, LinkHealth, UnlinkAction};
use aimgr::tools::Tool;
use std::fs;
use std::os::unix::fs::symlink;

use crate::common::populated;

fn skill(name: &str) -> ResourceId {
    ResourceId::new(ResourceKind::Skill, name)
}

#[test]
fn test_install_links_into_every_target() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude, Tool::OpenCode, Tool::Copilot]);

    let outcomes = installer.install(repo.repo(), &skill("pdf")).unwrap();
    assert_eq!(outcomes.len(), 3);

    for dir in [".claude/skills/pdf", ".opencode/skills/pdf", ".github/skills/pdf"] {
        let link = project.path().join(dir);
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink(), "{dir}");
        assert_eq!(fs::read_link(&link).unwrap(), repo.repo().path_for(ResourceKind::Skill, "pdf"));
    }
}

#[test]
fn test_install_agent_skips_tools_without_agents() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude, Tool::Copilot]);

    let outcomes = installer
        .install(repo.repo(), &ResourceId::new(ResourceKind::Agent, "planner"))
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].tool, Tool::Claude);
    assert!(project.path().join(".claude/agents/planner.md").exists());
}

#[test]
fn test_install_replaces_dangling_link() {
    let (repo, project) = populated();
    let link = project.path().join(".claude/skills/pdf");
    fs::create_dir_all(link.parent().unwrap()).unwrap();
    symlink(project.path().join("gone"), &link).unwrap();

    let installer = Installer::new(project.path(), vec![Tool::Claude]);
    let outcomes = installer.install(repo.repo(), &skill("pdf")).unwrap();

    assert!(matches!(outcomes[0].action, LinkAction::Replaced(_)));
    assert!(link.join("SKILL.md").exists());
}

#[test]
fn test_install_never_overwrites_regular_directory() {
    let (repo, project) = populated();
    project.write_file(".claude/skills/pdf/SKILL.md", "local copy").unwrap();

    let installer = Installer::new(project.path(), vec![Tool::Claude]);
    let outcomes = installer.install(repo.repo(), &skill("pdf")).unwrap();

    assert_eq!(outcomes[0].action, LinkAction::Occupied);
    assert_eq!(
        fs::read_to_string(project.path().join(".claude/skills/pdf/SKILL.md")).unwrap(),
        "local copy"
    );
}

#[test]
fn test_install_unknown_resource_suggests_name() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude]);

    let err = installer.install(repo.repo(), &skill("pfd")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("pfd"), "{message}");
    assert!(matches!(
        err.downcast_ref::<AimgrError>(),
        Some(AimgrError::ResourceNotFound { .. })
    ));
}

#[test]
fn test_install_package_reports_each_member() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude]);
    installer.install(repo.repo(), &skill("pdf")).unwrap();

    let report = installer.install_package(repo.repo(), "web").unwrap();

    assert_eq!(report.installed, vec!["command/api/deploy".to_string()]);
    assert_eq!(report.skipped, vec!["skill/pdf".to_string()]);
    assert!(report.failed.is_empty());
    assert!(project.path().join(".claude/commands/api/deploy.md").exists());
}

#[test]
fn test_uninstall_leaves_foreign_entries() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude, Tool::OpenCode]);
    installer.install(repo.repo(), &skill("pdf")).unwrap();

    // Replace the OpenCode link with a user-owned directory
    let opencode = project.path().join(".opencode/skills/pdf");
    fs::remove_file(&opencode).unwrap();
    project.write_file(".opencode/skills/pdf/SKILL.md", "mine").unwrap();

    let outcomes = installer.uninstall(repo.repo(), &skill("pdf")).unwrap();

    let actions: Vec<UnlinkAction> = outcomes.iter().map(|o| o.action).collect();
    assert!(actions.contains(&UnlinkAction::Removed));
    assert!(actions.contains(&UnlinkAction::SkippedNotALink));
    assert!(!project.path().join(".claude/skills/pdf").exists());
    assert!(opencode.join("SKILL.md").exists());
}

#[test]
fn test_uninstall_not_installed_is_error() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude]);

    let err = installer.uninstall(repo.repo(), &skill("xlsx")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AimgrError>(),
        Some(AimgrError::NotInstalled { .. })
    ));
}

#[test]
fn test_list_installed_reports_health() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude]);
    installer.install(repo.repo(), &skill("pdf")).unwrap();
    installer
        .install(repo.repo(), &ResourceId::new(ResourceKind::Command, "api/deploy"))
        .unwrap();
    installer.install(repo.repo(), &skill("xlsx")).unwrap();
    repo.repo().remove(ResourceKind::Skill, "xlsx").unwrap();

    let installed = installer.list_installed(repo.repo()).unwrap();
    let summary: Vec<(String, LinkHealth)> = installed.iter().map(|i| (i.id.to_string(), i.health)).collect();

    assert!(summary.contains(&("command/api/deploy".to_string(), LinkHealth::Ok)));
    assert!(summary.contains(&("skill/pdf".to_string(), LinkHealth::Ok)));
    assert!(summary.contains(&("skill/xlsx".to_string(), LinkHealth::Broken)));
}

#[test]
fn test_clean_removes_only_store_links() {
    let (repo, project) = populated();
    let installer = Installer::new(project.path(), vec![Tool::Claude]);
    installer.install(repo.repo(), &skill("pdf")).unwrap();
    installer
        .install(repo.repo(), &ResourceId::new(ResourceKind::Command, "api/deploy"))
        .unwrap();
    let own = project.write_file(".claude/commands/mine.md", "---\ndescription: x\n---\n").unwrap();

    let removed = installer.clean(repo.repo()).unwrap();

    assert_eq!(removed.len(), 2);
    assert!(own.exists());
    assert!(!project.path().join(".claude/commands/api").exists());
    assert!(installer.list_installed(repo.repo()).unwrap().is_empty());
}

#[test]
fn test_for_project_prefers_existing_tool_dirs() {
    let (_repo, project) = populated();
    fs::create_dir_all(project.path().join(".opencode")).unwrap();

    let installer = Installer::for_project(project.path(), &[Tool::Copilot]).unwrap();
    assert_eq!(installer.targets(), &[Tool::Claude, Tool::OpenCode]);
}
