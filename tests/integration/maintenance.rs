//! Removing unmanaged entries and pruning stale manifest references.

use aimgr::core::{ResourceId, ResourceKind};
use aimgr::installer::Installer;
use aimgr::repair::{
    Confirm, PruneChoice, PruneChooser, PruneMode, ResetMode, find_invalid_refs, find_unmanaged, prune, reset,
};
use aimgr::tools::Tool;
use anyhow::Result;
use std::fs;
use std::os::unix::fs::symlink;

use crate::common::populated;

struct Answer(bool);

impl Confirm for Answer {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(self.0)
    }
}

/// Removes references in the list, skips everything else.
struct RemoveOnly(Vec<&'static str>);

impl PruneChooser for RemoveOnly {
    fn choose(&mut self, reference: &str) -> Result<PruneChoice> {
        Ok(if self.0.contains(&reference) {
            PruneChoice::Remove
        } else {
            PruneChoice::Skip
        })
    }
}

#[test]
fn test_reset_removes_unmanaged_and_keeps_store_links() {
    let (repo, project) = populated();
    Installer::new(project.path(), vec![Tool::Claude])
        .install(repo.repo(), &ResourceId::new(ResourceKind::Command, "api/deploy"))
        .unwrap();
    project.write_file(".claude/commands/api/local.md", "mine").unwrap();
    project.write_file(".claude/skills/handmade/SKILL.md", "mine").unwrap();
    let foreign = project.path().join(".claude/agents/elsewhere.md");
    fs::create_dir_all(foreign.parent().unwrap()).unwrap();
    symlink(project.path().join("ai.package.yaml"), &foreign).unwrap();

    let unmanaged = find_unmanaged(project.path(), &[Tool::Claude], repo.root()).unwrap();
    let names: Vec<&str> = unmanaged.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(unmanaged.len(), 3, "{names:?}");
    assert!(names.contains(&"api/local"));
    assert!(names.contains(&"handmade"));
    assert!(names.contains(&"elsewhere"));

    let dry = reset(&unmanaged, ResetMode::DryRun).unwrap();
    assert_eq!(dry.would_remove.len(), 3);
    assert!(project.path().join(".claude/skills/handmade").exists());

    let report = reset(&unmanaged, ResetMode::Force).unwrap();
    assert_eq!(report.removed.len(), 3);
    assert!(report.failed.is_empty());
    assert!(!project.path().join(".claude/skills/handmade").exists());
    assert!(fs::symlink_metadata(&foreign).is_err());
    assert!(project.path().join(".claude/commands/api/deploy.md").exists());
    assert!(find_unmanaged(project.path(), &[Tool::Claude], repo.root()).unwrap().is_empty());
}

#[test]
fn test_reset_interactive_decline_changes_nothing() {
    let (repo, project) = populated();
    let file = project.write_file(".claude/commands/notes.md", "mine").unwrap();

    let unmanaged = find_unmanaged(project.path(), &[Tool::Claude], repo.root()).unwrap();
    let mut answer = Answer(false);
    let report = reset(&unmanaged, ResetMode::Interactive(&mut answer)).unwrap();

    assert!(report.cancelled);
    assert!(report.removed.is_empty());
    assert!(file.exists());

    let mut answer = Answer(true);
    let report = reset(&unmanaged, ResetMode::Interactive(&mut answer)).unwrap();
    assert_eq!(report.removed, vec![file.clone()]);
    assert!(!file.exists());
}

#[test]
fn test_find_invalid_refs_separates_partial_packages() {
    let (repo, project) = populated();
    let project = project
        .with_manifest(&["skill/pdf", "skill/gone", "package/web", "package/ghost"])
        .unwrap();
    repo.repo().remove(ResourceKind::Command, "api/deploy").unwrap();

    let manifest = project.manifest().unwrap();
    let (invalid, partial) = find_invalid_refs(&manifest, repo.repo());

    assert_eq!(invalid, vec!["skill/gone".to_string(), "package/ghost".to_string()]);
    assert_eq!(partial.len(), 1);
    assert_eq!(partial[0].name, "web");
    assert_eq!(partial[0].missing, vec!["command/api/deploy".to_string()]);
}

#[test]
fn test_prune_modes() {
    let (repo, project) = populated();
    let project = project
        .with_manifest(&["skill/pdf", "skill/gone", "package/ghost"])
        .unwrap();
    let path = project.manifest_path();

    let mut manifest = project.manifest().unwrap();
    let (invalid, _) = find_invalid_refs(&manifest, repo.repo());

    let dry = prune(&mut manifest, &path, &invalid, PruneMode::DryRun).unwrap();
    assert_eq!(dry.would_remove.len(), 2);
    assert!(!dry.saved);
    assert_eq!(project.manifest().unwrap().resources.len(), 3);

    let mut chooser = RemoveOnly(vec!["package/ghost"]);
    let chosen = prune(&mut manifest, &path, &invalid, PruneMode::Interactive(&mut chooser)).unwrap();
    assert_eq!(chosen.removed, vec!["package/ghost".to_string()]);
    assert_eq!(chosen.skipped, vec!["skill/gone".to_string()]);
    assert!(chosen.saved);
    assert_eq!(
        project.manifest().unwrap().resources,
        vec!["skill/pdf".to_string(), "skill/gone".to_string()]
    );

    let mut manifest = project.manifest().unwrap();
    let (invalid, _) = find_invalid_refs(&manifest, repo.repo());
    let forced = prune(&mut manifest, &path, &invalid, PruneMode::Force).unwrap();
    assert_eq!(forced.removed, vec!["skill/gone".to_string()]);
    assert_eq!(project.manifest().unwrap().resources, vec!["skill/pdf".to_string()]);
}

#[test]
fn test_prune_with_nothing_removed_does_not_save() {
    let (repo, project) = populated();
    let project = project.with_manifest(&["skill/gone"]).unwrap();
    let path = project.manifest_path();
    let before = fs::read_to_string(&path).unwrap();

    let mut manifest = project.manifest().unwrap();
    let (invalid, _) = find_invalid_refs(&manifest, repo.repo());
    let mut chooser = RemoveOnly(Vec::new());
    let report = prune(&mut manifest, &path, &invalid, PruneMode::Interactive(&mut chooser)).unwrap();

    assert!(!report.saved);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}
