//! Shared helpers for integration tests.

#![allow(dead_code)]

use aimgr::test_utils::{TestProject, TestRepo, init_test_logging};
use aimgr::tools::Tool;
use assert_cmd::Command;
use std::path::Path;

/// A populated repository and a Claude project.
///
/// The repository holds `command/api/deploy`, `command/review`, `skill/pdf`,
/// `skill/xlsx`, `agent/planner` and `package/web` (`skill/pdf` plus
/// `command/api/deploy`).
pub fn populated() -> (TestRepo, TestProject) {
    init_test_logging(None);

    let repo = TestRepo::new().unwrap();
    repo.add_command("api/deploy", "Deploy the API").unwrap();
    repo.add_command("review", "Review a change").unwrap();
    repo.add_skill("pdf", "Work with PDF files").unwrap();
    repo.add_skill("xlsx", "Work with spreadsheets").unwrap();
    repo.add_agent("planner", "Plans work").unwrap();
    repo.add_package("web", &["skill/pdf", "command/api/deploy"]).unwrap();

    let project = TestProject::new().unwrap().with_tool(Tool::Claude).unwrap();
    (repo, project)
}

/// `aimgr` pointed at `repo` and `project`, isolated from user configuration.
pub fn aimgr(repo: &Path, project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("aimgr").unwrap();
    cmd.arg("--repo")
        .arg(repo)
        .arg("-C")
        .arg(project)
        .env("AIMGR_CONFIG", project.join("no-such-config.toml"))
        .env_remove("AIMGR_REPO_PATH")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}
